//! Integration tests for the Segmenter

use carbonscan_domain::{Document, SourceKind, Table};
use carbonscan_segmenter::{PageSource, PdfSource, SegmentationError, Segmenter, TableDetector};
use proptest::prelude::*;

/// How a scripted page behaves
#[derive(Debug, Clone, Copy)]
enum Behaviour {
    Ok,
    TextError,
    TablePanic,
    Panic,
}

struct ScriptedSource {
    pages: Vec<Behaviour>,
}

impl PageSource for ScriptedSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text(&self, index: usize) -> Result<String, SegmentationError> {
        match self.pages[index - 1] {
            Behaviour::TextError => Err(SegmentationError::Page {
                index,
                reason: "corrupt content stream".to_string(),
            }),
            Behaviour::Panic => panic!("font decoding panicked on page {}", index),
            _ => Ok(format!("text of page {}", index)),
        }
    }

    fn tables(&self, index: usize) -> Result<Vec<Table>, SegmentationError> {
        match self.pages[index - 1] {
            Behaviour::TablePanic | Behaviour::Panic => panic!("table panic"),
            _ => Ok(vec![Table::new(vec![
                vec!["Metric".to_string(), "2023".to_string()],
                vec!["Scope 1".to_string(), index.to_string()],
            ])]),
        }
    }
}

fn behaviour() -> impl Strategy<Value = Behaviour> {
    prop_oneof![
        4 => Just(Behaviour::Ok),
        1 => Just(Behaviour::TextError),
        1 => Just(Behaviour::TablePanic),
        1 => Just(Behaviour::Panic),
    ]
}

proptest! {
    #[test]
    fn prop_page_order_preserved_despite_failures(pages in prop::collection::vec(behaviour(), 0..40)) {
        let source = ScriptedSource { pages: pages.clone() };
        let segmentation = Segmenter::default().segment_source(&source);

        prop_assert_eq!(segmentation.pages.len(), pages.len());
        for (i, page) in segmentation.pages.iter().enumerate() {
            prop_assert_eq!(page.index, i + 1);
            match pages[i] {
                Behaviour::Ok => {
                    prop_assert_eq!(&page.raw_text, &format!("text of page {}", i + 1));
                    prop_assert_eq!(page.tables.len(), 1);
                }
                Behaviour::TextError | Behaviour::Panic => prop_assert!(page.raw_text.is_empty()),
                Behaviour::TablePanic => prop_assert!(page.tables.is_empty()),
            }
        }

        let expected_failed: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, b)| !matches!(b, Behaviour::Ok))
            .map(|(i, _)| i + 1)
            .collect();
        prop_assert_eq!(segmentation.failed_pages(), expected_failed);
    }
}

#[test]
fn test_failed_page_keeps_neighbours_intact() {
    let source = ScriptedSource {
        pages: vec![Behaviour::Ok, Behaviour::Panic, Behaviour::Ok],
    };
    let segmentation = Segmenter::default().segment_source(&source);

    assert_eq!(segmentation.pages[0].raw_text, "text of page 1");
    assert!(segmentation.pages[1].is_blank());
    assert_eq!(segmentation.pages[2].raw_text, "text of page 3");
    assert_eq!(segmentation.failures.len(), 2);
}

#[test]
fn test_pdf_text_pages_with_layout_tables() {
    let source = PdfSource::from_page_texts(
        vec![
            "Introduction\nWe care about the climate.".to_string(),
            "Greenhouse Gas Emissions\n\
             Metric            2023      2022\n\
             Scope 1           12,345    13,001\n\
             Scope 2 (market)  4,200     4,800\n\
             Notes follow."
                .to_string(),
        ],
        Some(TableDetector::default()),
    );
    let pages = Segmenter::default().segment_source(&source).pages;

    assert_eq!(pages.len(), 2);
    assert!(pages[0].tables.is_empty());
    assert_eq!(pages[1].tables.len(), 1);
    assert_eq!(
        pages[1].tables[0].first_column().collect::<Vec<_>>(),
        vec!["Metric", "Scope 1", "Scope 2 (market)"]
    );
}

/// Build a minimal PDF, one Helvetica text page per content stream
///
/// Pages listed in `broken` reference a font object that does not exist.
fn build_pdf(pages: &[&str], broken: &[usize]) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (i, content) in pages.iter().enumerate() {
        let font = if broken.contains(&(i + 1)) { 99 } else { 3 };
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
            font,
            page_ids[i] + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref = pdf.len();
    let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        tail.push_str(&format!("{:010} 00000 n \n", offset));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

const PAGE_ONE: &str = "BT /F1 12 Tf 72 720 Td (Scope 1 emissions 1,200 tCO2e) Tj ET";
const PAGE_TWO: &str = "BT /F1 12 Tf 72 720 Td (Narrative) Tj ET";
const PAGE_THREE: &str = "BT /F1 12 Tf 72 720 Td (Scope 2) Tj 0 -20 Td (800 tCO2e) Tj ET";

#[test]
fn test_real_pdf_pages_in_order() {
    let bytes = build_pdf(&[PAGE_ONE, PAGE_TWO, PAGE_THREE], &[]);
    let document = Document::new("https://example.com/r.pdf", SourceKind::Pdf, bytes);
    let segmentation = Segmenter::default().segment_detailed(document).unwrap();

    let indices: Vec<usize> = segmentation.pages.iter().map(|page| page.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert!(segmentation.failures.is_empty());
    assert!(segmentation.pages[0].raw_text.contains("1,200"));
    assert_eq!(segmentation.pages[2].raw_text.lines().count(), 2);
}

#[test]
fn test_real_pdf_with_broken_page_keeps_the_rest() {
    let bytes = build_pdf(&[PAGE_ONE, PAGE_TWO, PAGE_THREE], &[2]);
    let document = Document::new("https://example.com/r.pdf", SourceKind::Pdf, bytes);
    let segmentation = Segmenter::default().segment_detailed(document).unwrap();

    assert_eq!(segmentation.pages.len(), 3);
    assert_eq!(segmentation.failed_pages(), vec![2]);
    assert!(segmentation.pages[1].is_blank());
    assert!(segmentation.pages[0].raw_text.contains("Scope 1"));
    assert!(segmentation.pages[2].raw_text.contains("800"));
}

#[test]
fn test_pdf_words_carry_positions() {
    let bytes = build_pdf(&[PAGE_THREE], &[]);
    let source = PdfSource::open(&bytes, None).unwrap();
    let words = source.words(1).unwrap().unwrap();

    let scope = words.iter().find(|word| word.text == "Scope").unwrap();
    let value = words.iter().find(|word| word.text == "800").unwrap();
    assert_eq!(scope.x, value.x);
    assert!(value.y > scope.y);
}
