use crate::error::ExportError;
use crate::results::{NewsRecord, ResultSet};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A column of the exported table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Title,
    Source,
    PublishedAt,
    Summary,
    Url,
}

impl Column {
    /// Fixed column order of the news table
    pub const DEFAULT_ORDER: [Column; 5] = [
        Column::Title,
        Column::Source,
        Column::PublishedAt,
        Column::Summary,
        Column::Url,
    ];

    pub fn header(self, style: HeaderStyle) -> &'static str {
        match (style, self) {
            (HeaderStyle::Localized, Column::Title) => "标题",
            (HeaderStyle::Localized, Column::Source) => "来源",
            (HeaderStyle::Localized, Column::PublishedAt) => "发布时间",
            (HeaderStyle::Localized, Column::Summary) => "概要",
            (HeaderStyle::Localized, Column::Url) => "URL",
            (HeaderStyle::Field, Column::Title) => "title",
            (HeaderStyle::Field, Column::Source) => "source",
            (HeaderStyle::Field, Column::PublishedAt) => "published_at",
            (HeaderStyle::Field, Column::Summary) => "summary",
            (HeaderStyle::Field, Column::Url) => "url",
        }
    }

    pub fn value(self, record: &NewsRecord) -> &str {
        match self {
            Column::Title => &record.title,
            Column::Source => &record.source,
            Column::PublishedAt => &record.published_at,
            Column::Summary => &record.summary,
            Column::Url => &record.url,
        }
    }
}

/// Which names to put in the header row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// 标题,来源,发布时间,概要,URL
    #[default]
    Localized,
    /// Record field names
    Field,
}

/// Writes a result set as a delimited table
#[derive(Debug, Clone)]
pub struct TableExporter {
    headers: HeaderStyle,
    byte_order_mark: bool,
    delimiter: u8,
}

impl Default for TableExporter {
    fn default() -> Self {
        Self {
            headers: HeaderStyle::Localized,
            byte_order_mark: true,
            delimiter: b',',
        }
    }
}

impl TableExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headers(mut self, headers: HeaderStyle) -> Self {
        self.headers = headers;
        self
    }

    /// Prefix the file with a UTF-8 byte order mark so spreadsheet tools
    /// detect the encoding of CJK text.
    pub fn with_byte_order_mark(mut self, enabled: bool) -> Self {
        self.byte_order_mark = enabled;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Write one header row and one row per record, in result-set order.
    /// The destination is replaced; nothing is recovered on failure.
    pub fn export(
        &self,
        records: &ResultSet,
        destination: &Path,
        columns: &[Column],
    ) -> Result<(), ExportError> {
        let io_error = |source| ExportError::Io {
            path: destination.to_path_buf(),
            source,
        };

        if let Some(parent) = destination.parent() {
            utils::ensure_directory(parent).map_err(io_error)?;
        }

        let file = File::create(destination).map_err(io_error)?;
        let mut out = BufWriter::new(file);
        if self.byte_order_mark {
            out.write_all(UTF8_BOM).map_err(io_error)?;
        }

        self.write_table(records, columns, out)?;
        ::log::info!(
            "Exported {} records to {}",
            records.len(),
            destination.display()
        );
        Ok(())
    }

    /// Write the table to any writer, without a byte order mark
    pub fn write_table<W: Write>(
        &self,
        records: &ResultSet,
        columns: &[Column],
        writer: W,
    ) -> Result<(), ExportError> {
        let mut csv = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        csv.write_record(columns.iter().map(|c| c.header(self.headers)))?;
        for record in records {
            csv.write_record(columns.iter().map(|c| c.value(record)))?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, summary: &str) -> NewsRecord {
        NewsRecord {
            title: title.to_string(),
            source: "新华网".to_string(),
            published_at: "2023年2月3日".to_string(),
            summary: summary.to_string(),
            url: "https://news.example.com/a?id=1".to_string(),
        }
    }

    fn export_to_string(set: &ResultSet, exporter: &TableExporter, columns: &[Column]) -> String {
        let mut buf = Vec::new();
        exporter.write_table(set, columns, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_localized_header_and_fixed_order() {
        let set: ResultSet = vec![record("光伏装机创新高", "概要")].into_iter().collect();
        let out = export_to_string(&set, &TableExporter::new(), &Column::DEFAULT_ORDER);
        assert_eq!(
            out,
            "标题,来源,发布时间,概要,URL\n\
             光伏装机创新高,新华网,2023年2月3日,概要,https://news.example.com/a?id=1\n"
        );
    }

    #[test]
    fn test_values_are_quoted_when_needed() {
        let set: ResultSet = vec![record("a, \"quoted\" title", "line one\nline two")]
            .into_iter()
            .collect();
        let out = export_to_string(
            &set,
            &TableExporter::new().with_headers(HeaderStyle::Field),
            &[Column::Title, Column::Summary],
        );
        assert_eq!(
            out,
            "title,summary\n\"a, \"\"quoted\"\" title\",\"line one\nline two\"\n"
        );
    }

    #[test]
    fn test_empty_set_writes_header_only_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("news.csv");
        TableExporter::new()
            .export(&ResultSet::default(), &path, &Column::DEFAULT_ORDER)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(
            std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap(),
            "标题,来源,发布时间,概要,URL\n"
        );
    }

    #[test]
    fn test_reexport_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.csv");
        let set: ResultSet = (0..20)
            .map(|n| record(&format!("标题 {n}"), "概要"))
            .collect();
        let exporter = TableExporter::new();

        exporter.export(&set, &path, &Column::DEFAULT_ORDER).unwrap();
        let first = std::fs::read(&path).unwrap();
        exporter.export(&set, &path, &Column::DEFAULT_ORDER).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multibyte_text_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.csv");
        let original = record("「储能」与光伏：2023 年展望", "多字节 ✓ テキスト");
        let set: ResultSet = vec![original.clone()].into_iter().collect();
        TableExporter::new()
            .with_byte_order_mark(false)
            .export(&set, &path, &Column::DEFAULT_ORDER)
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], original.title);
        assert_eq!(&row[3], original.summary);
    }

    #[test]
    fn test_unwritable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = TableExporter::new()
            .export(
                &ResultSet::default(),
                &blocker.join("news.csv"),
                &Column::DEFAULT_ORDER,
            )
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_tab_delimited_with_field_headers() {
        let set: ResultSet = vec![record("光伏, 储能", "概要")].into_iter().collect();
        let mut out = Vec::new();
        TableExporter::new()
            .with_headers(HeaderStyle::Field)
            .with_delimiter(b'\t')
            .write_table(&set, &[Column::Title, Column::Url], &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "title\turl\n光伏, 储能\thttps://news.example.com/a?id=1\n"
        );
    }
}
