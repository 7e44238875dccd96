mod common;

use common::RecordingSink;
use page_voice::document::{PageRange, PageSource, TextDocument, open_document, parse_page_range};
use page_voice::error::DocumentError;
use page_voice::extract::{ExtractOptions, clean_text, extract_pages, normalize_page};
use page_voice::progress::{NullSink, ProgressEvent};
use std::io::Write;

fn five_pages() -> TextDocument {
    TextDocument::from_pages((1..=5).map(|i| format!("Text of page {i}")))
}

fn numbers(doc: &TextDocument, range: &str) -> Vec<u32> {
    let range = parse_page_range(Some(range)).unwrap();
    extract_pages(doc, range, ExtractOptions::default(), &NullSink)
        .unwrap()
        .iter()
        .map(|p| p.number)
        .collect()
}

#[test]
fn empty_page_is_dropped() {
    let doc = TextDocument::from_pages(["Hello world", "", "More text"]);
    let sink = RecordingSink::default();
    let range = parse_page_range(Some("1-3")).unwrap();
    let pages = extract_pages(&doc, range, ExtractOptions::default(), &sink).unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].number, 1);
    assert_eq!(pages[0].text, "Hello world");
    assert_eq!(pages[1].number, 3);
    assert_eq!(pages[1].text, "More text");

    let events = sink.events();
    assert!(events.contains(&ProgressEvent::PageSkipped { page: 2 }));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::ExtractionFinished { pages: 2 })
    );
}

#[test]
fn whitespace_only_pages_are_dropped() {
    let doc = TextDocument::from_pages(["  \n\n\t", "\x0c", "x"]);
    let pages = extract_pages(&doc, None, ExtractOptions::default(), &NullSink).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].number, 3);
}

#[test]
fn single_page_range() {
    assert_eq!(numbers(&five_pages(), "2-2"), vec![2]);
    assert_eq!(numbers(&five_pages(), "4"), vec![4]);
}

#[test]
fn span_is_ascending() {
    assert_eq!(numbers(&five_pages(), "3-5"), vec![3, 4, 5]);
}

#[test]
fn no_range_means_all_pages() {
    let pages = extract_pages(&five_pages(), None, ExtractOptions::default(), &NullSink).unwrap();
    assert_eq!(pages.len(), 5);
}

#[test]
fn range_is_clamped_to_document() {
    assert_eq!(numbers(&five_pages(), "4-99"), vec![4, 5]);
    assert!(numbers(&five_pages(), "7-9").is_empty());
}

#[test]
fn range_expressions() {
    assert_eq!(parse_page_range(None).unwrap(), None);
    assert_eq!(parse_page_range(Some("  ")).unwrap(), None);
    assert_eq!(
        parse_page_range(Some(" 3 - 5 ")).unwrap(),
        Some(PageRange {
            start_page: 3,
            end_page: 5
        })
    );
    for bad in ["0", "5-3", "a-b", "1-2-3", "-2", "2-", "0-4", "x"] {
        let err = parse_page_range(Some(bad)).unwrap_err();
        assert!(
            matches!(err, DocumentError::InvalidPageRange { .. }),
            "{bad} gave {err:?}"
        );
    }
}

#[test]
fn deserialized_zero_start_selects_nothing() {
    let range: PageRange = serde_json::from_str(r#"{"start_page":0,"end_page":2}"#).unwrap();
    assert_eq!(range.clamp_to(5), None);
    let pages = extract_pages(&five_pages(), Some(range), ExtractOptions::default(), &NullSink).unwrap();
    assert!(pages.is_empty());
}

#[test]
fn inverted_range_built_by_hand_selects_nothing() {
    let range = PageRange {
        start_page: 4,
        end_page: 2,
    };
    assert_eq!(range.clamp_to(5), None);
    let pages = extract_pages(&five_pages(), Some(range), ExtractOptions::default(), &NullSink).unwrap();
    assert!(pages.is_empty());
}

#[test]
fn blank_line_runs_collapse() {
    assert_eq!(clean_text("a\n\n\n\nb"), "a\n\nb");
    assert_eq!(clean_text("a\n  \n \n\nb"), "a\n\nb");
    assert_eq!(clean_text("a\nb"), "a\nb");
}

#[test]
fn form_feeds_removed_and_trimmed() {
    assert_eq!(clean_text("\x0c  Chapter 1\x0c\n"), "Chapter 1");
}

#[test]
fn ligatures_fold_when_normalizing() {
    let on = normalize_page("ﬁnal", ExtractOptions { normalize_unicode: true });
    let off = normalize_page("ﬁnal", ExtractOptions { normalize_unicode: false });
    assert_eq!(on, "final");
    assert_eq!(off, "ﬁnal");
}

#[test]
fn default_options_keep_compatibility_characters() {
    let raw = "E = mc² and ½ cup, ①";
    assert_eq!(normalize_page(raw, ExtractOptions::default()), raw);

    let doc = TextDocument::from_pages([raw]);
    let pages = extract_pages(&doc, None, ExtractOptions::default(), &NullSink).unwrap();
    assert_eq!(pages[0].text, raw);
}

#[test]
fn text_file_pages_split_on_form_feed() {
    let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(f, "first page\x0c\x0cthird page").unwrap();

    let doc = open_document(f.path()).unwrap();
    assert_eq!(doc.page_count(), 3);
    let pages = extract_pages(doc.as_ref(), None, ExtractOptions::default(), &NullSink).unwrap();
    let numbers: Vec<_> = pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 3]);
}

#[test]
fn missing_document_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_document(&dir.path().join("nope.pdf")).err().unwrap();
    assert!(matches!(err, DocumentError::Open { .. }));
}

#[test]
fn corrupt_pdf_fails_to_open() {
    let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    f.write_all(b"this is not a pdf").unwrap();
    let err = open_document(f.path()).err().unwrap();
    assert!(matches!(err, DocumentError::Open { .. }));
}

#[test]
fn unsupported_extension_fails_to_open() {
    let f = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
    let err = open_document(f.path()).err().unwrap();
    assert!(matches!(err, DocumentError::Open { .. }));
}
