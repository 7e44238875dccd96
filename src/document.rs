use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A page-addressable document. Indices are zero-based.
pub trait PageSource {
    fn page_count(&self) -> usize;
    fn page_text(&self, index: usize) -> Result<String, DocumentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start_page: u32, // 1-based inclusive
    pub end_page: u32,   // 1-based inclusive
}

impl PageRange {
    pub fn new(start_page: u32, end_page: u32) -> Result<Self, DocumentError> {
        if start_page == 0 || start_page > end_page {
            return Err(DocumentError::InvalidPageRange {
                input: format!("{start_page}-{end_page}"),
            });
        }
        Ok(Self {
            start_page,
            end_page,
        })
    }

    pub fn single(page: u32) -> Result<Self, DocumentError> {
        Self::new(page, page)
    }

    /// Zero-based inclusive indices clamped to a document of `page_count`
    /// pages. `None` when the range starts past the last page.
    pub fn clamp_to(&self, page_count: usize) -> Option<(usize, usize)> {
        // Fields are public and deserializable, so `new`'s checks may not have run.
        if page_count == 0 || self.start_page == 0 || self.start_page > self.end_page {
            return None;
        }
        let start = self.start_page as usize - 1;
        let end = (self.end_page as usize - 1).min(page_count - 1);
        if start > end {
            return None;
        }
        Some((start, end))
    }
}

impl FromStr for PageRange {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DocumentError::InvalidPageRange {
            input: s.to_string(),
        };
        let parse = |tok: &str| tok.trim().parse::<u32>().map_err(|_| invalid());

        let range = match s.split_once('-') {
            Some((a, b)) => Self::new(parse(a)?, parse(b)?),
            None => Self::single(parse(s)?),
        };
        range.map_err(|_| invalid())
    }
}

/// Parses an optional range expression; blank means all pages.
pub fn parse_page_range(raw: Option<&str>) -> Result<Option<PageRange>, DocumentError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some),
    }
}

/// PDF document with per-page text loaded up front.
pub struct PdfDocument {
    path: PathBuf,
    pages: Vec<String>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path).map_err(|e| DocumentError::open(path, e))?;
        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| DocumentError::open(path, format!("PDF extraction error: {e}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, DocumentError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| DocumentError::open(&self.path, format!("no page at index {index}")))
    }
}

/// Plain text document. Pages are separated by form feeds.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    pages: Vec<String>,
}

impl TextDocument {
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        Self::from_pages(raw.split('\x0c'))
    }

    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let raw = std::fs::read_to_string(path).map_err(|e| DocumentError::open(path, e))?;
        Ok(Self::parse(&raw))
    }
}

impl PageSource for TextDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, DocumentError> {
        self.pages.get(index).cloned().ok_or_else(|| {
            DocumentError::open("<text>", format!("no page at index {index}"))
        })
    }
}

/// Opens `path` with the reader matching its extension.
pub fn open_document(path: &Path) -> Result<Box<dyn PageSource + Send>, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::open(path, "file does not exist"));
    }
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => Ok(Box::new(PdfDocument::open(path)?)),
        Some("txt") => Ok(Box::new(TextDocument::open(path)?)),
        Some(other) => Err(DocumentError::open(
            path,
            format!("unsupported document type: .{other}"),
        )),
        None => Err(DocumentError::open(path, "missing file extension")),
    }
}
