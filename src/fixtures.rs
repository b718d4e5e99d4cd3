//! Markup of news results pages shaped like the default locators expect.

use url::Url;

/// One result container; every part can be dropped to simulate layout drift
#[derive(Debug, Clone)]
pub(crate) struct Item {
    pub n: usize,
    pub href: Option<String>,
    pub title: Option<String>,
    pub summary: bool,
    pub source: bool,
    pub time: bool,
}

impl Item {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            href: Some(format!("https://news.example.com/articles/{n}")),
            title: Some(format!("光伏新闻 {n}")),
            summary: true,
            source: true,
            time: true,
        }
    }

    pub fn href(mut self, href: Option<&str>) -> Self {
        self.href = href.map(str::to_string);
        self
    }

    pub fn title(mut self, title: Option<&str>) -> Self {
        self.title = title.map(str::to_string);
        self
    }

    pub fn without_summary(mut self) -> Self {
        self.summary = false;
        self
    }

    pub fn without_source(mut self) -> Self {
        self.source = false;
        self
    }

    pub fn without_time(mut self) -> Self {
        self.time = false;
        self
    }

    pub fn html(&self) -> String {
        let n = self.n;
        let href = self
            .href
            .as_ref()
            .map(|h| format!(" href=\"{h}\""))
            .unwrap_or_default();
        let source = if self.source {
            format!("<div class=\"MgUUmf NUnG9d\"><span>来源 {n}</span></div>")
        } else {
            String::new()
        };
        let title = self
            .title
            .as_ref()
            .map(|t| format!("<div class=\"n0jPhd ynAwRc MBeuO nDgy9d\">{t}</div>"))
            .unwrap_or_default();
        let summary = if self.summary {
            format!("<div class=\"GI74Re nDgy9d\">概要 {n}</div>")
        } else {
            String::new()
        };
        let time = if self.time {
            format!("<div class=\"OSrXXb rbYSKb LfVVr\"><span>{n} 天前</span></div>")
        } else {
            String::new()
        };

        format!(
            "<div class=\"SoaBEf\"><div><a{href}>\
             <div class=\"lSfe4c r5bEn aI5QMe\"><div class=\"SoAPf\">\
             {source}{title}{summary}{time}\
             </div></div></a></div></div>"
        )
    }
}

/// A whole results page
pub(crate) fn page(items: &[Item], has_next: bool) -> String {
    let body: String = items.iter().map(Item::html).collect();
    let next = if has_next {
        "<table><tr><td><a id=\"pnnext\" href=\"/search?q=x&amp;start=10\">Next</a></td></tr></table>"
    } else {
        ""
    };
    format!("<html><head><title>results</title></head><body><div id=\"rso\">{body}</div>{next}</body></html>")
}

/// Page `index` (zero-based) holding `count` valid items numbered after the previous pages
pub(crate) fn numbered_page(index: usize, count: usize, has_next: bool) -> String {
    let items: Vec<Item> = (0..count)
        .map(|i| Item::new(index * 100 + i + 1))
        .collect();
    page(&items, has_next)
}

/// A page whose results never rendered
pub(crate) fn empty_page() -> String {
    "<html><body><div id=\"rso\"></div></body></html>".to_string()
}

pub(crate) fn base_url() -> Url {
    Url::parse("https://www.google.com/search?q=x&tbm=nws").expect("valid fixture URL")
}
