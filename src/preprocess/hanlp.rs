use super::Tokenizer;
use crate::error::TokenizeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_HANLP_URL: &str = "https://www.hanlp.com/api";

const COARSE_TOKENS: &str = "tok/coarse";

/// Client for the HanLP RESTful parser
pub struct HanlpClient {
    url: String,
    auth: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
    tasks: [&'a str; 1],
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(rename = "tok/coarse", default)]
    coarse: Vec<Vec<String>>,
}

impl HanlpClient {
    pub fn new(url: impl Into<String>, auth: Option<String>) -> Result<Self, TokenizeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            auth: auth.filter(|a| !a.is_empty()),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/parse", self.url)
    }
}

#[async_trait]
impl Tokenizer for HanlpClient {
    async fn tokenize(&self, text: &str) -> Result<Vec<Vec<String>>, TokenizeError> {
        let request = ParseRequest {
            text,
            tasks: [COARSE_TOKENS],
            language: "zh",
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(auth) = &self.auth {
            builder = builder.header(reqwest::header::AUTHORIZATION, format!("Basic {auth}"));
        }

        ::log::debug!("Tokenizing {} characters", text.chars().count());
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TokenizeError::Response(format!("HTTP {status}: {body}")));
        }

        let body = response.text().await?;
        parse_tokens(&body)
    }
}

/// Coarse tokens of a HanLP parse document; a document without them has none
fn parse_tokens(body: &str) -> Result<Vec<Vec<String>>, TokenizeError> {
    serde_json::from_str::<ParseResponse>(body)
        .map(|doc| doc.coarse)
        .map_err(|e| TokenizeError::Response(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        let body = r#"{"tok/coarse": [["光伏", "产业"], ["发展", "迅速"]], "tok/fine": [["光伏"]]}"#;
        assert_eq!(
            parse_tokens(body).unwrap(),
            vec![vec!["光伏", "产业"], vec!["发展", "迅速"]]
        );
    }

    #[test]
    fn test_parse_tokens_without_task_is_empty() {
        assert!(parse_tokens("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tokens_rejects_garbage() {
        assert!(matches!(
            parse_tokens("<html>rate limited</html>"),
            Err(TokenizeError::Response(_))
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ParseRequest {
            text: "光伏",
            tasks: [COARSE_TOKENS],
            language: "zh",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"text": "光伏", "tasks": ["tok/coarse"], "language": "zh"})
        );
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = HanlpClient::new("https://hanlp.example/api/", None).unwrap();
        assert_eq!(client.endpoint(), "https://hanlp.example/api/parse");
        assert!(client.auth.is_none());
    }
}
