//! # Tokenizador
//!
//! Divide o texto bruto em tokens usando as fronteiras de palavra do Unicode (UAX #29,
//! via `unicode-segmentation`). Cada token preserva sua posição original no texto
//! (offset) para permitir destacar as tags na interface web.
//!
//! ## Pós-processamento
//!
//! - Espaços em branco são descartados.
//! - Abreviações conhecidas recuperam o ponto final (`"Dr"`, `"."` -> `"Dr."`).
//! - Unidades coladas a números são separadas pelo [`UnitDictionary`] (`"5mg"` -> `"5"`, `"mg"`).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::dictionary::UnitDictionary;
//! use pos_core::tokenizer::tokenize;
//!
//! let sentence = tokenize("Dr. Smith took 5mg.", &UnitDictionary::default());
//! assert_eq!(sentence.forms(), vec!["Dr.", "Smith", "took", "5", "mg", "."]);
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::dictionary::UnitDictionary;
use crate::sentence::Sentence;

/// Um token com seus offsets de byte no texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextSpan {
    /// O texto do token (ex: "dog", ",", "mg").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Abreviações comuns em inglês que mantêm o ponto.
const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "sr", "jr", "st", "vs", "etc", "inc", "ltd", "co", "corp", "jan",
    "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "fig", "approx",
];

/// Tokeniza e devolve uma [`Sentence`] sem anotação.
pub fn tokenize(text: &str, units: &UnitDictionary) -> Sentence {
    let spans = tokenize_spans(text, units);
    let forms: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    Sentence::from_forms(&forms)
}

/// Tokeniza preservando os offsets.
pub fn tokenize_spans(text: &str, units: &UnitDictionary) -> Vec<TextSpan> {
    let mut spans: Vec<TextSpan> = Vec::new();

    for (start, segment) in text.split_word_bound_indices() {
        if segment.chars().all(char::is_whitespace) {
            continue;
        }
        let end = start + segment.len();

        if segment == "." {
            if let Some(last) = spans.last_mut() {
                if last.end == start && is_abbreviation(&last.text) {
                    last.text.push('.');
                    last.end = end;
                    continue;
                }
            }
        }

        let lower = segment.to_lowercase();
        match units.split(segment, &lower) {
            Some((number, unit)) => {
                let middle = start + number.len();
                push_span(&mut spans, number, start, middle);
                push_span(&mut spans, unit, middle, end);
            }
            None => push_span(&mut spans, segment.to_string(), start, end),
        }
    }

    for (i, span) in spans.iter_mut().enumerate() {
        span.index = i;
    }
    spans
}

/// Abreviação conhecida ou sigla com pontos internos (ex: "U.S", "e.g").
fn is_abbreviation(text: &str) -> bool {
    let lower = text.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    text.contains('.') && text.split('.').all(|part| !part.is_empty() && part.chars().all(char::is_alphabetic))
}

fn push_span(spans: &mut Vec<TextSpan>, text: String, start: usize, end: usize) {
    spans.push(TextSpan {
        text,
        start,
        end,
        index: 0,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let sentence = tokenize("The dog barks.", &UnitDictionary::default());
        assert_eq!(sentence.forms(), vec!["The", "dog", "barks", "."]);
        assert_eq!(sentence.tokens()[3].index, 3);
    }

    #[test]
    fn test_offsets_point_into_text() {
        let text = "Take 10mg, twice.";
        let spans = tokenize_spans(text, &UnitDictionary::default());
        for span in &spans {
            assert_eq!(&text[span.start..span.end], span.text);
        }
        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Take", "10", "mg", ",", "twice", "."]);
    }

    #[test]
    fn test_units_require_dictionary_entry() {
        let spans = tokenize_spans("1mg", &UnitDictionary::new(["kg"]));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "1mg");
    }

    #[test]
    fn test_abbreviations_keep_period() {
        let sentence = tokenize("Mr. Brown lives in the U.S.", &UnitDictionary::default());
        assert_eq!(sentence.forms(), vec!["Mr.", "Brown", "lives", "in", "the", "U.S."]);
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("   ", &UnitDictionary::default()).is_empty());
    }
}
