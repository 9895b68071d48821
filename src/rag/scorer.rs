//! Local relevance scoring for when no remote judge is used.
//!
//! The score mixes three signals: query terms found in the chunk, domain
//! patterns (names, dates, money) the question seems to ask for, and Jaccard
//! similarity of the token sets.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::store::{Chunk, ScoredChunk};

const PERSON_TRIGGERS: [&str; 8] = [
    "quem",
    "assinou",
    "assinatura",
    "presidente",
    "síndico",
    "morador",
    "proprietário",
    "nome",
];
const DATE_TRIGGERS: [&str; 7] = [
    "quando", "data", "dia", "mês", "ano", "reunião", "assembléia",
];
const VALUE_TRIGGERS: [&str; 8] = [
    "quanto", "valor", "taxa", "multa", "cota", "rateio", "preço", "custo",
];
const DECISION_TRIGGERS: [&str; 6] = [
    "decidiu",
    "decisão",
    "aprovou",
    "reprovou",
    "votou",
    "resolução",
];

const EXACT_WEIGHT: f64 = 0.4;
const PATTERN_WEIGHT: f64 = 0.4;
const JACCARD_WEIGHT: f64 = 0.2;

const NAME_WEIGHT: f64 = 0.5;
const DATE_WEIGHT: f64 = 0.3;
const VALUE_WEIGHT: f64 = 0.3;

/// What kind of information a question is after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeywordFlags {
    pub person: bool,
    pub date: bool,
    pub value: bool,
    pub decision: bool,
}

impl KeywordFlags {
    pub fn is_empty(&self) -> bool {
        !(self.person || self.date || self.value || self.decision)
    }
}

/// Two capitalised words in a row.
pub(crate) fn name_pair() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\p{Lu}\p{Ll}+ \p{Lu}\p{Ll}+").expect("valid name regex"))
}

/// Two or more capitalised words, e.g. "Ana Maria Souza".
pub(crate) fn name_sequence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\p{Lu}\p{Ll}+ \p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)*")
            .expect("valid name sequence regex")
    })
}

pub(crate) fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b|\b\d{1,2}\.\d{1,2}\.\d{2,4}\b")
            .expect("valid date regex")
    })
}

pub(crate) fn value_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)R\$\s*\d+[.,]\d{2}|\d+[.,]\d{2}\s*(?:reais|real)")
            .expect("valid currency regex")
    })
}

pub fn classify(query: &str) -> KeywordFlags {
    let lower = query.to_lowercase();
    let any = |triggers: &[&str]| triggers.iter().any(|t| lower.contains(t));

    KeywordFlags {
        person: any(&PERSON_TRIGGERS),
        date: any(&DATE_TRIGGERS),
        value: any(&VALUE_TRIGGERS),
        decision: any(&DECISION_TRIGGERS),
    }
}

pub fn score(query: &str, chunk_text: &str, flags: KeywordFlags) -> f64 {
    let query_lower = query.to_lowercase();
    let text_lower = chunk_text.to_lowercase();
    let query_tokens: Vec<&str> = query_lower.split_whitespace().collect();
    let text_tokens: Vec<&str> = text_lower.split_whitespace().collect();

    let exact_matches = query_tokens
        .iter()
        .filter(|q| q.chars().count() > 2)
        .filter(|q| {
            text_tokens
                .iter()
                .any(|t| t.contains(**q) || q.contains(*t))
        })
        .count() as f64;

    let mut pattern_score = 0.0;
    if flags.person {
        pattern_score += name_pair().find_iter(chunk_text).count() as f64 * NAME_WEIGHT;
    }
    if flags.date {
        pattern_score += date_pattern().find_iter(chunk_text).count() as f64 * DATE_WEIGHT;
    }
    if flags.value {
        pattern_score += value_pattern().find_iter(chunk_text).count() as f64 * VALUE_WEIGHT;
    }

    let jaccard = jaccard(&query_tokens, &text_tokens);

    EXACT_WEIGHT * exact_matches + PATTERN_WEIGHT * pattern_score + JACCARD_WEIGHT * jaccard
}

fn jaccard(left: &[&str], right: &[&str]) -> f64 {
    let left: HashSet<&str> = left.iter().copied().collect();
    let right: HashSet<&str> = right.iter().copied().collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Best `top_k` chunks scoring above `min_score`, highest first. Ties keep
/// document order.
pub fn rank(query: &str, chunks: &[Chunk], top_k: usize, min_score: f64) -> Vec<ScoredChunk> {
    let flags = classify(query);
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|chunk| ScoredChunk {
            score: score(query, &chunk.text, flags),
            chunk: chunk.clone(),
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored.retain(|s| s.score > min_score);
    scored
}
