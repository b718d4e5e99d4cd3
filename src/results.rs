use serde::{Deserialize, Serialize};

/// One search result extracted from a results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Headline, as rendered by the nested title element
    pub title: String,

    /// Publisher name
    pub source: String,

    /// Publication time exactly as rendered ("3 days ago", "2023年2月1日", ...)
    pub published_at: String,

    /// Snippet shown under the headline
    pub summary: String,

    /// Absolute link to the article
    pub url: String,
}

/// Records of one run, in discovery order (page order, then container order)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    records: Vec<NewsRecord>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NewsRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[NewsRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a NewsRecord;
    type IntoIter = std::slice::Iter<'a, NewsRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<NewsRecord> for ResultSet {
    fn from_iter<I: IntoIterator<Item = NewsRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// What happened to a record handed to [`ResultAccumulator::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    Accepted,
    QuotaFull,
}

/// Append-only collection of records, capped at the run quota
#[derive(Debug)]
pub struct ResultAccumulator {
    records: Vec<NewsRecord>,
    quota: usize,
}

impl ResultAccumulator {
    pub fn with_quota(quota: usize) -> Self {
        Self {
            records: Vec::new(),
            quota,
        }
    }

    /// Append a record unless the quota is already filled
    pub fn append(&mut self, record: NewsRecord) -> Append {
        if self.is_full() {
            ::log::debug!("Quota of {} reached, dropping {}", self.quota, record.url);
            return Append::QuotaFull;
        }
        self.records.push(record);
        Append::Accepted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.quota
    }

    /// Freeze the accumulated records. Consumes the accumulator, so no record
    /// can be added once the run has ended.
    pub fn snapshot(self) -> ResultSet {
        ResultSet {
            records: self.records,
        }
    }
}

/// Diagnostic counters of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Containers encountered, whether or not extraction succeeded
    pub items_seen: usize,

    /// Page load attempts
    pub page_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: usize) -> NewsRecord {
        NewsRecord {
            title: format!("title {n}"),
            source: "source".to_string(),
            published_at: "1 day ago".to_string(),
            summary: String::new(),
            url: format!("https://example.com/{n}"),
        }
    }

    #[test]
    fn test_append_keeps_insertion_order() {
        let mut acc = ResultAccumulator::with_quota(10);
        for n in 0..3 {
            assert_eq!(acc.append(record(n)), Append::Accepted);
        }
        let set = acc.snapshot();
        let urls: Vec<_> = set.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            [
                "https://example.com/0",
                "https://example.com/1",
                "https://example.com/2"
            ]
        );
    }

    #[test]
    fn test_quota_caps_records() {
        let mut acc = ResultAccumulator::with_quota(2);
        acc.append(record(1));
        acc.append(record(2));
        assert!(acc.is_full());
        assert_eq!(acc.append(record(3)), Append::QuotaFull);
        assert_eq!(acc.snapshot().len(), 2);
    }

    #[test]
    fn test_duplicates_are_preserved() {
        let mut acc = ResultAccumulator::with_quota(5);
        acc.append(record(7));
        acc.append(record(7));
        let set = acc.snapshot();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0], set.as_slice()[1]);
    }
}
