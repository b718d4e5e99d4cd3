//! Turns exported article text into filtered token files.
//!
//! Cleaning and stopword filtering happen here; segmentation is delegated to
//! a [`Tokenizer`], normally the HanLP REST service in [`hanlp`].

pub mod hanlp;

pub use hanlp::HanlpClient;

use crate::error::TokenizeError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Everything that is not a CJK unified ideograph, an ASCII digit or letter
const NON_TEXT: &str = r"[^\x{4e00}-\x{9fff}0-9a-zA-Z]";

/// Splits cleaned text into sentences of tokens
#[async_trait]
pub trait Tokenizer: Send + Sync {
    async fn tokenize(&self, text: &str) -> Result<Vec<Vec<String>>, TokenizeError>;
}

/// Words dropped from every token stream
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl StopwordSet {
    /// Read one word per line. A missing file gives an empty set.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TokenizeError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let set: Self = contents.lines().collect();
                ::log::info!("Loaded {} stopwords from {}", set.len(), path.display());
                Ok(set)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ::log::warn!("Stopword file {} not found, filtering nothing", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for StopwordSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            words: iter
                .into_iter()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Clean, segment and filter text files
pub struct TextPreprocessor<T: Tokenizer> {
    tokenizer: T,
    stopwords: StopwordSet,
    non_text: Regex,
    output_dir: Option<PathBuf>,
}

impl<T: Tokenizer> TextPreprocessor<T> {
    pub fn new(tokenizer: T, stopwords: StopwordSet) -> Result<Self, TokenizeError> {
        Ok(Self {
            tokenizer,
            stopwords,
            non_text: Regex::new(NON_TEXT)?,
            output_dir: None,
        })
    }

    /// Write results into `dir` under the input's file name instead of
    /// next to the input
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = dir;
        self
    }

    /// Drop spaces and every character that is not CJK, a digit or a letter
    pub fn clean_text(&self, text: &str) -> String {
        self.non_text.replace_all(text, "").into_owned()
    }

    /// Cleaned, segmented and stopword-filtered tokens of `text`, flattened
    /// across sentences
    pub async fn preprocess_text(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        let cleaned = self.clean_text(text);
        if cleaned.is_empty() {
            return Ok(Vec::new());
        }

        let sentences = self.tokenizer.tokenize(&cleaned).await?;
        Ok(sentences
            .into_iter()
            .flatten()
            .filter(|token| !self.stopwords.contains(token))
            .collect())
    }

    /// Where the tokens of `input` are written
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match (&self.output_dir, input.file_name()) {
            (Some(dir), Some(name)) => dir.join(name),
            _ => {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let name = match input.extension() {
                    Some(ext) => format!("{}_processed.{}", stem, ext.to_string_lossy()),
                    None => format!("{stem}_processed"),
                };
                input.with_file_name(name)
            }
        }
    }

    /// Process one file, writing its tokens space-separated
    pub async fn process_file(&self, input: &Path) -> Result<Vec<String>, TokenizeError> {
        let content = tokio::fs::read_to_string(input).await?;
        let tokens = self.preprocess_text(&content).await?;

        let output = self.output_path(input);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&output, tokens.join(" ")).await?;

        ::log::info!(
            "Processed {} -> {} ({} tokens)",
            input.display(),
            output.display(),
            tokens.len()
        );
        Ok(tokens)
    }

    /// Process every file in `dir` whose name ends with `extension`.
    ///
    /// A file that fails is logged and recorded with no tokens; only an
    /// unreadable directory fails the call.
    pub async fn process_directory(
        &self,
        dir: &Path,
        extension: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, TokenizeError> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(extension) && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();

        let mut results = BTreeMap::new();
        for name in names {
            let tokens = match self.process_file(&dir.join(&name)).await {
                Ok(tokens) => tokens,
                Err(e) => {
                    ::log::error!("Failed to process {}: {}", name, e);
                    Vec::new()
                }
            };
            results.insert(name, tokens);
        }

        Ok(results)
    }
}
