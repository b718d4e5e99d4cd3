use crate::error::ConfigError;
use chrono::NaiveDate;
use url::Url;

/// Default news search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.google.com/search";

/// A news search for one keyword over an inclusive date range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    keyword: String,
    date_from: NaiveDate,
    date_to: NaiveDate,
}

impl SearchQuery {
    pub fn new(
        keyword: impl Into<String>,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Self, ConfigError> {
        let keyword = keyword.into().trim().to_string();
        if keyword.is_empty() {
            return Err(ConfigError::InvalidValue(
                "search keyword cannot be empty".to_string(),
            ));
        }
        if date_from > date_to {
            return Err(ConfigError::InvalidValue(format!(
                "date range is reversed: {date_from} is after {date_to}"
            )));
        }
        Ok(Self {
            keyword,
            date_from,
            date_to,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Build the results URL: news vertical, custom date range
    pub fn to_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
        let mut url = Url::parse(endpoint)?;
        let range = format!(
            "cdr:1,cd_min:{},cd_max:{}",
            range_date(self.date_from),
            range_date(self.date_to)
        );
        url.query_pairs_mut()
            .append_pair("q", &self.keyword)
            .append_pair("tbs", &range)
            .append_pair("tbm", "nws");
        Ok(url)
    }
}

/// Dates in the range filter are month/day/year without padding
fn range_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_url_carries_keyword_range_and_vertical() {
        let query = SearchQuery::new("光伏产业", date(2023, 2, 1), date(2023, 2, 28)).unwrap();
        let url = query.to_url(DEFAULT_ENDPOINT).unwrap();

        assert_eq!(url.host_str(), Some("www.google.com"));
        assert_eq!(url.path(), "/search");
        let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["q"], "光伏产业");
        assert_eq!(pairs["tbs"], "cdr:1,cd_min:2/1/2023,cd_max:2/28/2023");
        assert_eq!(pairs["tbm"], "nws");
    }

    #[test]
    fn test_keyword_is_percent_encoded() {
        let query = SearchQuery::new("solar & wind", date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        let url = query.to_url(DEFAULT_ENDPOINT).unwrap();
        assert!(url.as_str().contains("q=solar+%26+wind"));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = SearchQuery::new("x", date(2023, 3, 1), date(2023, 2, 1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_blank_keyword_is_rejected() {
        assert!(SearchQuery::new("   ", date(2023, 1, 1), date(2023, 1, 2)).is_err());
    }

    #[test]
    fn test_invalid_endpoint() {
        let query = SearchQuery::new("x", date(2023, 1, 1), date(2023, 1, 2)).unwrap();
        assert!(matches!(
            query.to_url("not a url"),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
