//! File readers that turn a PDF report into sentences and a workbook sheet into a [`Grid`].

use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::error::{ReconcileError, Result};
use crate::schema::Grid;
use crate::utils::{format_number, normalize_sentence};

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)|\n\s*\n").unwrap());

pub fn read_pdf_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| ReconcileError::PdfRead {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;

    let pages = doc.get_pages();
    info!("Reading {} page(s) from {}", pages.len(), path.display());

    let mut text = String::new();
    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Ok(_) => warn!("No text found on page {}", page_number),
            Err(e) => warn!("Failed to extract text from page {}: {}", page_number, e),
        }
    }
    Ok(text)
}

/// Splits on sentence punctuation followed by whitespace and on blank lines, then
/// normalizes each sentence. Decimal points ("13.6%") do not split.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(text) {
        push_sentence(&mut sentences, &text[start..boundary.end()]);
        start = boundary.end();
    }
    push_sentence(&mut sentences, &text[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = normalize_sentence(raw);
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

pub fn read_document_sentences(path: &Path) -> Result<Vec<String>> {
    let text = read_pdf_text(path)?;
    if text.trim().is_empty() {
        warn!("No text extracted from {}", path.display());
        return Ok(Vec::new());
    }
    let sentences = split_sentences(&text);
    info!("Split {} into {} sentences", path.display(), sentences.len());
    Ok(sentences)
}

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Reads `sheet` with no header applied. Leading empty rows and columns are padded back
/// in so indices match the sheet's own coordinates.
pub fn read_sheet_grid(path: &Path, sheet: &str) -> Result<Grid> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReconcileError::Spreadsheet {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(ReconcileError::SheetNotFound {
            path: path.display().to_string(),
            sheet: sheet.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| ReconcileError::Spreadsheet {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;

    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    debug!("Sheet '{}' starts at ({}, {})", sheet, row_offset, col_offset);

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_to_string));
        rows.push(cells);
    }

    info!(
        "Read {} rows from sheet '{}' of {}",
        rows.len(),
        sheet,
        path.display()
    );
    Ok(Grid::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_keeps_decimals() {
        let text = "Net income of $3.2B in Q3.  CET1 capital ratio\nof 13.6%!\n\nRevenues rose";
        let sentences = split_sentences(text);
        assert_eq!(
            sentences,
            vec![
                "net income of $3.2b in q3.",
                "cet1 capital ratio of 13.6%!",
                "revenues rose",
            ]
        );
    }

    #[test]
    fn test_split_blank_lines() {
        let sentences = split_sentences("Highlights\n\nBook value per share $60.25");
        assert_eq!(sentences, vec!["highlights", "book value per share $60.25"]);
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(2024.0)), "2024");
        assert_eq!(cell_to_string(&Data::Float(0.136)), "0.136");
        assert_eq!(cell_to_string(&Data::Int(3217)), "3217");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("3Q".to_string())), "3Q");
    }

    #[test]
    fn test_missing_pdf_is_an_error() {
        let err = read_pdf_text(Path::new("./does/not/exist.pdf")).unwrap_err();
        assert!(matches!(err, ReconcileError::PdfRead { .. }));
    }

    #[test]
    fn test_missing_workbook_is_an_error() {
        let err = read_sheet_grid(Path::new("./does/not/exist.xlsx"), "Summary").unwrap_err();
        assert!(matches!(err, ReconcileError::Spreadsheet { .. }));
    }
}
