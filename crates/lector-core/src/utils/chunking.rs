//! Book text chunking.
//!
//! Paragraph-first: whole paragraphs are packed into chunks up to the
//! character limit and kept apart by a blank line, so paragraph rewind still
//! works inside a chunk. Oversized paragraphs are split at sentence, then
//! clause, then word boundaries.

use crate::domain::BookFormat;

/// Split a book into reading chunks of at most `max_chars` characters
/// (single words longer than the limit are kept whole).
#[must_use]
pub fn split_book(text: &str, format: BookFormat, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs(text, format) {
        let para_len = paragraph.chars().count();

        if para_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_paragraph(&paragraph, max_chars));
            continue;
        }

        if !current.is_empty() && current.chars().count() + 2 + para_len > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

// ── Internal helpers ───────────────────────────────────────────────

/// Paragraphs separated by blank lines, each collapsed to single spaces.
fn paragraphs(text: &str, format: BookFormat) -> Vec<String> {
    let mut out = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim();

        if format == BookFormat::Md {
            if trimmed.starts_with("```") {
                in_code_block = !in_code_block;
                continue;
            }
            if in_code_block || is_horizontal_rule(trimmed) {
                continue;
            }
        }

        if trimmed.is_empty() {
            flush(&mut lines, &mut out);
            continue;
        }

        let line = match format {
            BookFormat::Md => strip_markdown_line(trimmed),
            BookFormat::Txt => trimmed.to_string(),
        };
        // Markdown headings stand alone.
        let is_heading = format == BookFormat::Md && trimmed.starts_with('#');
        if is_heading {
            flush(&mut lines, &mut out);
        }
        lines.push(line);
        if is_heading {
            flush(&mut lines, &mut out);
        }
    }
    flush(&mut lines, &mut out);

    out
}

fn flush(lines: &mut Vec<String>, out: &mut Vec<String>) {
    let joined = lines.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        out.push(collapsed);
    }
    lines.clear();
}

fn is_horizontal_rule(line: &str) -> bool {
    let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    chars.len() >= 3
        && chars.iter().all(|&c| c == '-' || c == '*' || c == '_')
        && chars.windows(2).all(|w| w[0] == w[1])
}

fn strip_markdown_line(line: &str) -> String {
    let mut s = line;
    while let Some(rest) = s.strip_prefix('>') {
        s = rest.trim_start();
    }
    s = s.trim_start_matches('#').trim_start();
    if let Some(rest) = s
        .strip_prefix("- ")
        .or_else(|| s.strip_prefix("* "))
        .or_else(|| s.strip_prefix("+ "))
    {
        s = rest;
    }
    s.replace("**", "")
        .replace("__", "")
        .replace("~~", "")
        .replace('`', "")
}

/// Split an oversized paragraph at sentence boundaries, packing sentences.
fn split_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(paragraph) {
        let len = sentence.chars().count();
        if !current.is_empty() && current.chars().count() + 1 + len > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_long_sentence(&sentence, max_chars));
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&sentence);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        if matches!(c, '.' | '!' | '?' | '…')
            && chars.get(i + 1).is_some_and(|next| next.is_whitespace())
        {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// Split at clause punctuation, falling back to word boundaries.
fn split_long_sentence(sentence: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for part in sentence.split_inclusive(&[',', ';', ':', '—', '–'][..]) {
        if !current.is_empty() && current.chars().count() + part.chars().count() > max_chars {
            pieces.push(std::mem::take(&mut current).trim().to_string());
        }
        current.push_str(part);
    }
    let rest = current.trim();
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }

    let mut out = Vec::new();
    for piece in pieces {
        if piece.chars().count() > max_chars {
            out.extend(hard_split(&piece, max_chars));
        } else if !piece.is_empty() {
            out.push(piece);
        }
    }
    out
}

fn hard_split(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paragraphs_share_a_chunk() {
        let text = "Linea uno del libro.\n\nLinea dos del libro.";
        let chunks = split_book(text, BookFormat::Txt, 900);
        assert_eq!(chunks, vec!["Linea uno del libro.\n\nLinea dos del libro."]);
    }

    #[test]
    fn paragraphs_flush_when_full() {
        let text = "Primer parrafo aqui.\n\nSegundo parrafo aqui.";
        let chunks = split_book(text, BookFormat::Txt, 25);
        assert_eq!(chunks, vec!["Primer parrafo aqui.", "Segundo parrafo aqui."]);
    }

    #[test]
    fn wrapped_lines_join_into_one_paragraph() {
        let text = "Una linea\npartida en dos.";
        assert_eq!(
            split_book(text, BookFormat::Txt, 900),
            vec!["Una linea partida en dos."]
        );
    }

    #[test]
    fn long_paragraph_splits_and_respects_limit() {
        let text: Vec<String> = (1..=30)
            .map(|i| format!("Esta es la frase numero {i} del parrafo largo."))
            .collect();
        let text = text.join(" ");
        let chunks = split_book(&text, BookFormat::Txt, 120);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 120, "chunk too long: {chunk}");
            assert!(chunk.ends_with('.'));
        }
    }

    #[test]
    fn clause_and_word_fallbacks() {
        let text = "uno, dos, tres, cuatro, cinco, seis, siete, ocho";
        let chunks = split_book(text, BookFormat::Txt, 12);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
        assert_eq!(chunks.join(" "), text);

        let words = "palabra ".repeat(10);
        let chunks = split_book(&words, BookFormat::Txt, 20);
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn markdown_is_stripped() {
        let text = "# Capitulo 1\n\n**Era** una `noche`.\n\n```\ncodigo\n```\n\n---\n\n> cita final";
        let chunks = split_book(text, BookFormat::Md, 900);
        assert_eq!(chunks, vec!["Capitulo 1\n\nEra una noche.\n\ncita final"]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(split_book(" \n\n ", BookFormat::Txt, 900).is_empty());
    }
}
