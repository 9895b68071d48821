//! Paragraph-first text splitting with a sentence-packing fallback.

use std::sync::OnceLock;

use regex::Regex;

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"))
}

/// Terminal punctuation followed by whitespace or the end of the paragraph,
/// so "1.500,00" and "10.05.2023" stay intact.
fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+(?:\s+|$)").expect("valid sentence regex"))
}

/// Split `text` into chunks of at most `max_length` chars.
///
/// Each paragraph that fits becomes one chunk. Longer paragraphs are cut into
/// sentences which are packed greedily, joined by a single space. A sentence
/// longer than `max_length` is emitted on its own. Never yields empty chunks.
pub fn split(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);
    let mut chunks = Vec::new();

    for paragraph in paragraph_break().split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if char_len(paragraph) <= max_length {
            chunks.push(paragraph.to_string());
        } else {
            pack_sentences(paragraph, max_length, &mut chunks);
        }
    }

    chunks
}

fn pack_sentences(paragraph: &str, max_length: usize, out: &mut Vec<String>) {
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for sentence in sentences(paragraph) {
        let len = char_len(sentence);
        if buffer_len > 0 && buffer_len + 1 + len > max_length {
            out.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }
        if buffer_len > 0 {
            buffer.push(' ');
            buffer_len += 1;
        }
        buffer.push_str(sentence);
        buffer_len += len;
    }

    if !buffer.is_empty() {
        out.push(buffer);
    }
}

/// Sentences keep their terminal punctuation.
fn sentences(paragraph: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;

    for end in sentence_end().find_iter(paragraph) {
        let sentence = paragraph[start..end.end()].trim();
        if !sentence.is_empty() {
            out.push(sentence);
        }
        start = end.end();
    }

    let tail = paragraph[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }

    out
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::scorer::{date_pattern, value_pattern};

    fn squash(text: &str) -> String {
        text.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn short_paragraphs_are_kept_whole() {
        let chunks = split("Ata da reunião.\n\n  Pauta: obras.  \n\n", 100);
        assert_eq!(chunks, vec!["Ata da reunião.", "Pauta: obras."]);
    }

    #[test]
    fn blank_line_with_spaces_separates_paragraphs() {
        let chunks = split("Primeiro.\n   \t\nSegundo.", 100);
        assert_eq!(chunks, vec!["Primeiro.", "Segundo."]);
    }

    #[test]
    fn long_paragraph_is_packed_by_sentence() {
        let text = "Para A.\n\nPara B. Is long. Has many. Parts! Ok? Yes.";
        let chunks = split(text, 10);

        assert_eq!(
            chunks,
            vec!["Para A.", "Para B.", "Is long.", "Has many.", "Parts! Ok?", "Yes."]
        );
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10, "{chunk:?} exceeds limit");
        }
    }

    #[test]
    fn oversize_sentence_stands_alone() {
        let text = "Curta. Esta frase sozinha passa do limite. Fim.";
        let chunks = split(text, 12);

        assert_eq!(
            chunks,
            vec!["Curta.", "Esta frase sozinha passa do limite.", "Fim."]
        );
    }

    #[test]
    fn trailing_text_without_punctuation_is_kept() {
        let chunks = split("Uma frase. Outra frase sem ponto final", 15);
        assert_eq!(chunks, vec!["Uma frase.", "Outra frase sem ponto final"]);
    }

    #[test]
    fn never_empty_and_preserves_content_order() {
        let inputs = [
            "",
            "   \n\n \n",
            "...",
            "A. B. C.\n\n\n\nD!? E",
            "O síndico João Silva aprovou a taxa de R$ 350,00 em 10/05/2023. \
             A assembléia votou. Ninguém se opôs!\n\nSegundo parágrafo curto.",
        ];

        for input in inputs {
            for max in [1, 5, 20, 1500] {
                let chunks = split(input, max);
                assert!(chunks.iter().all(|c| !c.trim().is_empty()));
                assert_eq!(squash(&chunks.concat()), squash(input), "max={max} input={input:?}");
            }
        }
    }

    #[test]
    fn dots_inside_numbers_and_dates_do_not_end_sentences() {
        let text = "A taxa subiu para R$ 1.500,00 em 10.05.2023 por decisão. \
                    Outra frase aqui encerra.";
        let chunks = split(text, 60);

        assert_eq!(
            chunks,
            vec![
                "A taxa subiu para R$ 1.500,00 em 10.05.2023 por decisão.",
                "Outra frase aqui encerra."
            ]
        );
        assert!(date_pattern().is_match(&chunks[0]));
        assert!(value_pattern().is_match(&chunks[0]));
    }

    #[test]
    fn deterministic() {
        let text = "Um. Dois. Três.\n\nQuatro cinco seis sete oito. Nove.";
        assert_eq!(split(text, 12), split(text, 12));
    }

    #[test]
    fn length_is_measured_in_chars() {
        // 10 chars, 12 bytes
        let chunks = split("Ação. Sim.", 10);
        assert_eq!(chunks, vec!["Ação. Sim."]);
    }
}
