//! Pulls names, dates and amounts out of the best-ranked text so the answer
//! prompt sees them up front.

use regex::Regex;

use super::scorer::{classify, date_pattern, name_sequence, value_pattern};

pub fn extract(text: &str, query: &str) -> Vec<String> {
    let flags = classify(query);
    let mut lines = Vec::new();

    if flags.person {
        push_line(&mut lines, "Nomes encontrados", name_sequence(), text);
    }
    if flags.date {
        push_line(&mut lines, "Datas encontradas", date_pattern(), text);
    }
    if flags.value {
        push_line(&mut lines, "Valores encontrados", value_pattern(), text);
    }

    lines
}

fn push_line(lines: &mut Vec<String>, label: &str, pattern: &Regex, text: &str) {
    let mut found: Vec<&str> = Vec::new();
    for m in pattern.find_iter(text) {
        if !found.contains(&m.as_str()) {
            found.push(m.as_str());
        }
    }
    if !found.is_empty() {
        lines.push(format!("{}: {}", label, found.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signers_are_listed_for_person_questions() {
        let lines = extract(
            "João Silva e Maria Costa assinaram em 10/05/2023.",
            "quem assinou o documento?",
        );
        assert_eq!(lines, vec!["Nomes encontrados: João Silva, Maria Costa"]);
    }

    #[test]
    fn only_asked_categories_are_rendered() {
        let text = "Em 10/05/2023 o síndico Pedro Alves Lima cobrou R$ 120,50 de cada unidade.";

        let lines = extract(text, "quando e quanto foi cobrado?");
        assert_eq!(
            lines,
            vec![
                "Datas encontradas: 10/05/2023",
                "Valores encontrados: R$ 120,50"
            ]
        );

        let lines = extract(text, "qual o nome do síndico?");
        assert_eq!(lines, vec!["Nomes encontrados: Pedro Alves Lima"]);
    }

    #[test]
    fn repeated_matches_are_listed_once_in_first_seen_order() {
        let text = "Ana Souza votou. Carlos Reis votou. Ana Souza assinou.";
        let lines = extract(text, "quem votou?");
        assert_eq!(lines, vec!["Nomes encontrados: Ana Souza, Carlos Reis"]);
    }

    #[test]
    fn nothing_found_or_nothing_asked_yields_no_lines() {
        assert!(extract("sem nomes aqui", "quem assinou?").is_empty());
        assert!(extract("João Silva, 10/05/2023", "o que diz o regimento?").is_empty());
    }
}
