//! Converts downloaded document payloads into normalized plain text.

use std::path::Path;

use unirag_core::document::DocumentType;

use crate::error::{IngestError, Result};

/// Extract UTF-8 text from the payload at `path`, given its [`DocumentType`].
///
/// PDFs are extracted page by page, joining each page's text items with
/// single spaces and terminating every page with a blank line. DOCX files
/// are read as a single raw text stream. Plain `.doc` has no pure-Rust
/// reader in this pipeline and always fails extraction — a known gap
/// (spec.md's share-link handling hardcodes a PDF extension for indirect
/// downloads, which can silently misroute office documents into this path).
///
/// The returned text has already been run through [`normalize_text`].
pub fn extract_text(path: &Path, doc_type: DocumentType) -> Result<String> {
    let raw = match doc_type {
        DocumentType::Pdf => extract_pdf(path)?,
        DocumentType::Docx => extract_docx(path)?,
        DocumentType::Doc => {
            return Err(IngestError::ExtractionFailed {
                path: path.display().to_string(),
                message: "legacy .doc format has no pure-Rust extractor in this pipeline".to_string(),
            })
        }
        DocumentType::Unknown => {
            return Err(IngestError::ExtractionFailed {
                path: path.display().to_string(),
                message: "unknown document type".to_string(),
            })
        }
    };

    let normalized = normalize_text(&raw);
    if normalized.is_empty() {
        return Err(IngestError::ExtractionFailed {
            path: path.display().to_string(),
            message: "extraction produced no text".to_string(),
        });
    }
    Ok(normalized)
}

fn extract_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let pages = pdf_extract::extract_text_by_pages(&bytes).map_err(|e| IngestError::ExtractionFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut text = String::new();
    for page in pages {
        let joined: String = page.split_whitespace().collect::<Vec<_>>().join(" ");
        text.push_str(&joined);
        text.push_str("\n\n");
    }
    Ok(text)
}

fn extract_docx(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let parsed = docx_rs::read_docx(&bytes).map_err(|e| IngestError::ExtractionFailed {
        path: path.display().to_string(),
        message: format!("{e:?}"),
    })?;

    let mut text = String::new();
    for child in parsed.document.children {
        collect_docx_text(&child, &mut text);
    }
    Ok(text)
}

fn collect_docx_text(node: &docx_rs::DocumentChild, out: &mut String) {
    if let docx_rs::DocumentChild::Paragraph(paragraph) = node {
        for run_child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = run_child {
                for run_content in &run.children {
                    if let docx_rs::RunChild::Text(t) = run_content {
                        out.push_str(&t.text);
                    }
                }
            }
        }
        out.push('\n');
    }
}

/// Collapse any run of whitespace to a single space, then collapse runs of
/// three or more newlines to exactly two, then trim.
///
/// Applied uniformly across both extraction formats so downstream chunking
/// never has to special-case source format. Newlines are tracked
/// separately from other whitespace so paragraph breaks survive the first
/// collapse for the second pass to act on.
pub fn normalize_text(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut newline_run = 0usize;
    let mut space_pending = false;

    let flush_newlines = |run: usize, out: &mut String| {
        if run >= 3 {
            out.push_str("\n\n");
        } else {
            out.push_str(&"\n".repeat(run));
        }
    };

    for c in raw.chars() {
        if c == '\n' {
            newline_run += 1;
            space_pending = false;
        } else if c.is_whitespace() {
            if newline_run > 0 {
                flush_newlines(newline_run, &mut result);
                newline_run = 0;
            }
            space_pending = true;
        } else {
            if newline_run > 0 {
                flush_newlines(newline_run, &mut result);
                newline_run = 0;
            } else if space_pending {
                result.push(' ');
            }
            space_pending = false;
            result.push(c);
        }
    }
    if newline_run > 0 {
        flush_newlines(newline_run, &mut result);
    }

    result.trim().to_string()
}
