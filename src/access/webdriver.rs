use super::{Advance, Locator, PageContentAccessor};
use crate::error::{AccessError, LookupError};
use crate::utils;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Endpoints tried when the configured WebDriver URL refuses the session
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Page access backed by one live WebDriver session
pub struct WebDriverAccessor {
    client: Client,
    poll_interval: Duration,
    save_pages_dir: Option<PathBuf>,
    pages_rendered: usize,
}

impl WebDriverAccessor {
    /// Open a session on `webdriver_url`, falling back to the usual local endpoints
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, AccessError> {
        let capabilities = capabilities(headless);
        let client = connect_to_webdriver(webdriver_url, &capabilities).await?;
        Ok(Self {
            client,
            poll_interval: Duration::from_millis(250),
            save_pages_dir: None,
            pages_rendered: 0,
        })
    }

    /// How often to re-check a pending wait condition
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Save the rendered source of every loaded page into `dir`
    pub fn with_save_pages(mut self, dir: Option<PathBuf>) -> Self {
        self.save_pages_dir = dir;
        self
    }

    /// Navigate the session to the search results
    pub async fn open(&self, url: &Url) -> Result<(), AccessError> {
        ::log::info!("Opening {}", url);
        self.client.goto(url.as_str()).await.map_err(|e| {
            log_command_error(&e, "opening", url.as_str());
            AccessError::from(e)
        })
    }

    async fn save_current_page(&self, dir: &std::path::Path) {
        match self.client.source().await {
            Ok(html) => {
                if let Err(e) = utils::save_page(dir, self.pages_rendered, &html) {
                    ::log::warn!("Failed to save page {}: {}", self.pages_rendered, e);
                }
            }
            Err(e) => log_command_error(
                &e,
                "getting source for page",
                &self.pages_rendered.to_string(),
            ),
        }
    }

    /// Wait until the page URL moves away from `before`. A click that keeps the
    /// URL is logged and tolerated; the following container wait still applies.
    async fn wait_for_navigation(
        &self,
        before: &Url,
        timeout: Duration,
    ) -> Result<(), AccessError> {
        let poll = async {
            loop {
                let now = self.client.current_url().await?;
                if &now != before {
                    return Ok::<Url, CmdError>(now);
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(Ok(url)) => {
                ::log::debug!("Navigated to {}", url);
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                ::log::warn!(
                    "URL still {} after {:?}, continuing with the rendered page",
                    before,
                    timeout
                );
                Ok(())
            }
        }
    }
}

/// Browser capabilities for the new session
fn capabilities(headless: bool) -> Map<String, Value> {
    let mut caps = Map::new();
    if headless {
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless=new", "--window-size=1600,1000"] }),
        );
        caps.insert(
            "ms:edgeOptions".to_string(),
            json!({ "args": ["--headless=new", "--window-size=1600,1000"] }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );
    }
    caps
}

async fn new_session(
    url: &str,
    capabilities: &Map<String, Value>,
) -> Result<Client, NewSessionError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities.clone());
    builder.connect(url).await
}

/// Connects to the WebDriver instance
async fn connect_to_webdriver(
    webdriver_url: &str,
    capabilities: &Map<String, Value>,
) -> Result<Client, AccessError> {
    let primary_error = match new_session(webdriver_url, capabilities).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
            e
        }
    };

    for url in FALLBACK_WEBDRIVER_URLS {
        if url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = new_session(url, capabilities).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(primary_error.into())
}

fn log_command_error(error: &CmdError, context: &str, target: &str) {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost session while {} {}", context, target);
    } else {
        ::log::error!("Failed {} {}: {}", context, target, error);
    }
}

/// The command found nothing to act on
fn is_missing(error: &CmdError) -> bool {
    error.is_no_such_element()
}

fn lookup_error(locator: &Locator, error: CmdError) -> LookupError {
    if is_missing(&error) {
        LookupError::NotFound {
            locator: locator.to_string(),
        }
    } else {
        LookupError::Driver(error.to_string())
    }
}

#[async_trait]
impl PageContentAccessor for WebDriverAccessor {
    type Element = Element;

    async fn wait_for_containers(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Element>, AccessError> {
        let waited = self
            .client
            .wait()
            .at_most(timeout)
            .every(self.poll_interval)
            .for_element(fantoccini::Locator::Css(locator.as_str()))
            .await;

        match waited {
            Ok(_) => {}
            Err(CmdError::WaitTimeout) => {
                return Err(AccessError::TimedOut {
                    locator: locator.to_string(),
                    timeout,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let containers = self
            .client
            .find_all(fantoccini::Locator::Css(locator.as_str()))
            .await?;
        self.pages_rendered += 1;
        ::log::trace!("Found {} `{}` elements", containers.len(), locator);

        if let Some(dir) = self.save_pages_dir.clone() {
            self.save_current_page(&dir).await;
        }
        Ok(containers)
    }

    async fn find_child(
        &self,
        scope: &Element,
        locator: &Locator,
    ) -> Result<Element, LookupError> {
        scope
            .find(fantoccini::Locator::Css(locator.as_str()))
            .await
            .map_err(|e| lookup_error(locator, e))
    }

    async fn text(&self, element: &Element) -> Result<String, LookupError> {
        element
            .text()
            .await
            .map_err(|e| LookupError::Driver(e.to_string()))
    }

    async fn attr(&self, element: &Element, name: &str) -> Result<Option<String>, LookupError> {
        element
            .attr(name)
            .await
            .map_err(|e| LookupError::Driver(e.to_string()))
    }

    async fn current_url(&self) -> Result<Url, AccessError> {
        Ok(self.client.current_url().await?)
    }

    async fn advance_page(
        &mut self,
        next: &Locator,
        timeout: Duration,
    ) -> Result<Advance, AccessError> {
        let found = self
            .client
            .find(fantoccini::Locator::Css(next.as_str()))
            .await;
        let control = match found {
            Ok(control) => control,
            Err(e) if is_missing(&e) => return Ok(Advance::NoNextPage),
            Err(e) => return Err(e.into()),
        };

        let before = self.client.current_url().await?;
        control.click().await?;
        self.wait_for_navigation(&before, timeout).await?;
        Ok(Advance::Advanced)
    }

    async fn close(self) -> Result<(), AccessError> {
        ::log::debug!(
            "Closing WebDriver session after {} pages",
            self.pages_rendered
        );
        self.client.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantoccini::error::{ErrorStatus, WebDriver};

    fn driver_error(status: ErrorStatus) -> CmdError {
        CmdError::Standard(WebDriver::new(status, "from driver"))
    }

    #[test]
    fn test_no_such_element_is_not_found() {
        let locator = Locator::known("#pnnext");
        assert!(is_missing(&driver_error(ErrorStatus::NoSuchElement)));
        assert_eq!(
            lookup_error(&locator, driver_error(ErrorStatus::NoSuchElement)),
            LookupError::NotFound {
                locator: "#pnnext".to_string()
            }
        );
    }

    #[test]
    fn test_other_driver_errors_are_not_misses() {
        let locator = Locator::known(".SoAPf");
        let stale = driver_error(ErrorStatus::StaleElementReference);
        assert!(!is_missing(&stale));
        assert!(!is_missing(&CmdError::WaitTimeout));
        assert!(matches!(
            lookup_error(&locator, stale),
            LookupError::Driver(_)
        ));
    }

    #[test]
    fn test_headful_session_has_no_extra_capabilities() {
        assert!(capabilities(false).is_empty());
    }

    #[test]
    fn test_headless_capabilities_cover_common_browsers() {
        let caps = capabilities(true);
        for key in ["goog:chromeOptions", "ms:edgeOptions", "moz:firefoxOptions"] {
            assert!(caps.contains_key(key), "missing {key}");
        }
        assert_eq!(caps["moz:firefoxOptions"]["args"][0], "-headless");
    }
}
