use crate::{
    document::{PageRange, PageSource},
    error::DocumentError,
    progress::{ProgressEvent, ProgressSink},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("blank-run pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32, // 1-based, source pagination
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub normalize_unicode: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            normalize_unicode: false,
        }
    }
}

/// Collapses blank-line runs, drops form feeds and trims.
pub fn clean_text(raw: &str) -> String {
    let collapsed = BLANK_RUN.replace_all(raw, "\n\n");
    collapsed.replace('\x0c', "").trim().to_string()
}

pub fn normalize_page(raw: &str, opts: ExtractOptions) -> String {
    let cleaned = clean_text(raw);
    if opts.normalize_unicode {
        cleaned.nfkc().collect::<String>().trim().to_string()
    } else {
        cleaned
    }
}

/// Reads `range` (or every page) from `doc` in page order. Pages that are
/// empty after normalization are skipped. Any read error aborts the whole
/// extraction.
pub fn extract_pages(
    doc: &dyn PageSource,
    range: Option<PageRange>,
    opts: ExtractOptions,
    sink: &dyn ProgressSink,
) -> Result<Vec<Page>, DocumentError> {
    let page_count = doc.page_count();
    let bounds = match range {
        Some(r) => r.clamp_to(page_count),
        None if page_count > 0 => Some((0, page_count - 1)),
        None => None,
    };
    debug!(page_count, ?range, ?bounds, "extract");

    let mut pages = Vec::new();
    let Some((start, end)) = bounds else {
        sink.report(&ProgressEvent::ExtractionFinished { pages: 0 });
        return Ok(pages);
    };

    for index in start..=end {
        let number = index as u32 + 1;
        let text = normalize_page(&doc.page_text(index)?, opts);
        if text.is_empty() {
            sink.report(&ProgressEvent::PageSkipped { page: number });
            continue;
        }
        sink.report(&ProgressEvent::PageExtracted {
            page: number,
            chars: text.chars().count(),
        });
        pages.push(Page { number, text });
    }

    sink.report(&ProgressEvent::ExtractionFinished { pages: pages.len() });
    Ok(pages)
}
