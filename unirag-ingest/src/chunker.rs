//! Sentence-aligned, overlap-preserving text chunking.
//!
//! This is the sole chunking strategy in the pipeline — unlike a
//! general-purpose chunking library, there is exactly one deterministic
//! algorithm here, and it must stay that way: the offline/online embedding
//! contract depends on chunk boundaries being reproducible run to run.

use unirag_core::document::{Chunk, ChunkMetadata, Document, Language};

/// A strategy for splitting document text into [`Chunk`]s.
///
/// Implementations produce chunks with text and token estimates but no
/// embeddings; those are attached later by the embed driver.
pub trait Chunker: Send + Sync {
    /// Split `text` (already extracted and normalized) into chunks for
    /// `document`.
    ///
    /// Returns an empty `Vec` if `text` is empty, or if every sentence
    /// falls short of the minimum chunk size.
    fn chunk(&self, document: &Document, text: &str) -> Vec<Chunk>;
}

/// Estimate the token count of `text` as `ceil(chars / 3.5)`.
///
/// This heuristic is the sole authority for token accounting inside the
/// chunker; it is deliberately independent of
/// [`unirag_core::tokencounter::TokenCounter`], which the prompt builder
/// uses instead, so that chunk boundaries never depend on which generation
/// backend is configured at runtime.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f32 / 3.5).ceil() as usize
}

/// Split `text` on sentence-terminating punctuation (`.`, `!`, `?`)
/// followed by whitespace. No language-specific logic: this applies
/// equally to Ukrainian and English source text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;

    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let next_is_whitespace =
                chars.peek().map(|&(_, next)| next.is_whitespace()).unwrap_or(true);
            if next_is_whitespace {
                let end = i + c.len_utf8();
                let candidate = &text[start..end];
                let trimmed = candidate.trim();
                if !trimmed.is_empty() {
                    sentences.push(trimmed);
                }
                start = end;
            }
        }
    }
    if start < bytes.len() {
        let trailing = text[start..].trim();
        if !trailing.is_empty() {
            sentences.push(trailing);
        }
    }
    sentences
}

/// The last `n` space-separated tokens of `text`, rejoined with single
/// spaces. This is a different notion of "token" than [`estimate_tokens`] —
/// it operates on whitespace-split words, per spec, not the char-based
/// estimate.
fn last_n_word_tokens(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}

/// The single sentence-aligned, overlap-preserving chunker used by the
/// pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SentenceChunker {
    target_tokens: usize,
    overlap_tokens: usize,
    min_chunk_tokens: usize,
}

impl SentenceChunker {
    pub fn new(target_tokens: usize, overlap_tokens: usize, min_chunk_tokens: usize) -> Self {
        Self { target_tokens, overlap_tokens, min_chunk_tokens }
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, document: &Document, text: &str) -> Vec<Chunk> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;
        let mut current = String::new();
        let mut current_tokens = 0usize;

        let mut emit = |segment: &str, index: usize, chunks: &mut Vec<Chunk>| {
            chunks.push(Chunk {
                chunk_id: Chunk::make_id(&document.id, index),
                document_id: document.id.clone(),
                text: segment.to_string(),
                tokens: estimate_tokens(segment),
                chunk_index: index,
                category: document.category,
                language: document.language,
                metadata: ChunkMetadata {
                    document_title: document.title.clone(),
                    document_filename: document.filename.clone(),
                    source_url: document.source_url.clone(),
                },
            });
        };

        for sentence in &sentences {
            if current.is_empty() {
                current.push_str(sentence);
                current_tokens = estimate_tokens(&current);
                continue;
            }

            let candidate_tokens = estimate_tokens(&format!("{current} {sentence}"));
            if candidate_tokens > self.target_tokens {
                emit(&current, chunk_index, &mut chunks);
                chunk_index += 1;

                let overlap_tail = last_n_word_tokens(&current, self.overlap_tokens);
                current = if overlap_tail.is_empty() {
                    sentence.to_string()
                } else {
                    format!("{overlap_tail} {sentence}")
                };
                current_tokens = estimate_tokens(&current);
            } else {
                current.push(' ');
                current.push_str(sentence);
                current_tokens = candidate_tokens;
            }
        }

        if !current.is_empty() && current_tokens >= self.min_chunk_tokens {
            emit(&current, chunk_index, &mut chunks);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unirag_core::document::{CategoryId, DocumentType};

    fn doc() -> Document {
        Document {
            id: "doc_1".to_string(),
            title: "Policy".to_string(),
            filename: "policy.pdf".to_string(),
            source_url: "https://example.test/policy.pdf".to_string(),
            category: CategoryId::Safety,
            language: Language::En,
            doc_type: DocumentType::Pdf,
            downloaded: true,
            download_error: None,
            download_date: Some("2026-01-01".to_string()),
        }
    }

    fn chunker() -> SentenceChunker {
        SentenceChunker::new(250, 50, 100)
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        assert!(chunker().chunk(&doc(), "").is_empty());
    }

    #[test]
    fn single_short_sentence_below_min_tokens_produces_no_chunks() {
        let text = "Too short.";
        assert!(chunker().chunk(&doc(), text).is_empty());
    }

    #[test]
    fn one_very_long_sentence_produces_exactly_one_chunk() {
        // ~260 tokens at chars/3.5, single sentence, no terminator to split on
        // until the end.
        let long_sentence = "word ".repeat(200) + ".";
        let chunks = chunker().chunk(&doc(), &long_sentence);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.trim_end_matches('.').contains("word"));
    }

    #[test]
    fn chunk_index_starts_at_zero_and_increases() {
        // Sentences sized so two chunks are forced: each ~200 tokens at
        // chars/3.5 (~700 chars), target 250.
        let sentence = |n: usize| format!("sentence number {n} with enough words to matter.");
        let long = vec![sentence(1); 15].join(" ");
        let text = format!("{long} {}", vec![sentence(2); 15].join(" "));
        let chunks = chunker().chunk(&doc(), &text);
        assert!(chunks.len() >= 2);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
            assert_eq!(c.chunk_id, format!("doc_1_chunk_{i}"));
        }
    }

    #[test]
    fn overlap_tail_of_previous_chunk_opens_the_next() {
        // Two sentences of ~200 estimated tokens each (700 chars), so the
        // second sentence overflows target=250 and forces a flush with a
        // 50-token overlap tail.
        let s1 = "alpha ".repeat(140).trim_end().to_string() + ".";
        let s2 = "beta ".repeat(140).trim_end().to_string() + ".";
        let text = format!("{s1} {s2}");
        let chunks = chunker().chunk(&doc(), &text);
        assert_eq!(chunks.len(), 2);

        let chunk0_tail = last_n_word_tokens(&chunks[0].text, 50);
        let chunk1_head: Vec<&str> = chunks[1].text.split_whitespace().take(50).collect();
        let chunk1_head = chunk1_head.join(" ");
        assert_eq!(chunk0_tail, chunk1_head);
    }

    #[test]
    fn category_and_language_are_copied_from_the_document() {
        let text = "word ".repeat(200) + ".";
        let chunks = chunker().chunk(&doc(), &text);
        assert_eq!(chunks[0].category, CategoryId::Safety);
        assert_eq!(chunks[0].language, Language::En);
    }
}
