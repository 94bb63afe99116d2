//! # Corpus em Inglês com Anotações POS (Penn Treebank)
//!
//! Corpus pequeno anotado manualmente, embutido no binário para treino e demonstração.
//! As tags seguem o conjunto do Penn Treebank (`DT`, `NN`, `VBZ`, ...).
//!
//! ## Domínios Cobertos
//! - Cotidiano
//! - Saúde (com unidades de medida: `"5 mg"`)
//! - Economia
//! - Ciência e tecnologia
//! - Ambiguidade (`"dog"` como `NN` e `VB`, `"book"`, `"fish"`)
//!
//! Também lê corpora externos no formato de uma sentença por linha, `palavra/TAG`
//! separados por espaço ([`read_corpus`]).

use std::io::BufRead;

use tracing::{info, warn};

use crate::error::{Result, TaggerError};
use crate::sentence::Sentence;

/// Uma sentença anotada com tags POS.
pub struct AnnotatedSentence {
    /// O texto da sentença, como digitado.
    pub text: &'static str,
    /// Domínio temático (utilizado para análises de desempenho por área).
    pub domain: &'static str,
    /// Pares (palavra, tag).
    /// Exemplo: `[("The", "DT"), ("dog", "NN")]`
    pub annotations: &'static [(&'static str, &'static str)],
}

impl AnnotatedSentence {
    pub fn to_sentence(&self) -> Sentence {
        Sentence::from_tagged(self.annotations)
    }
}

/// Retorna o corpus embutido completo.
pub fn get_corpus() -> Vec<AnnotatedSentence> {
    vec![
        // ===== COTIDIANO =====
        AnnotatedSentence {
            text: "The dog barks at the mailman.",
            domain: "cotidiano",
            annotations: &[
                ("The", "DT"), ("dog", "NN"), ("barks", "VBZ"), ("at", "IN"), ("the", "DT"),
                ("mailman", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "A cat sleeps on the warm sofa.",
            domain: "cotidiano",
            annotations: &[
                ("A", "DT"), ("cat", "NN"), ("sleeps", "VBZ"), ("on", "IN"), ("the", "DT"),
                ("warm", "JJ"), ("sofa", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "She reads a book every night.",
            domain: "cotidiano",
            annotations: &[
                ("She", "PRP"), ("reads", "VBZ"), ("a", "DT"), ("book", "NN"), ("every", "DT"),
                ("night", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "We will book a table for dinner.",
            domain: "cotidiano",
            annotations: &[
                ("We", "PRP"), ("will", "MD"), ("book", "VB"), ("a", "DT"), ("table", "NN"),
                ("for", "IN"), ("dinner", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The children played quietly in the garden.",
            domain: "cotidiano",
            annotations: &[
                ("The", "DT"), ("children", "NNS"), ("played", "VBD"), ("quietly", "RB"), ("in", "IN"),
                ("the", "DT"), ("garden", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "My brother cooks dinner on Sundays.",
            domain: "cotidiano",
            annotations: &[
                ("My", "PRP$"), ("brother", "NN"), ("cooks", "VBZ"), ("dinner", "NN"), ("on", "IN"),
                ("Sundays", "NNPS"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "They walked to the old station yesterday.",
            domain: "cotidiano",
            annotations: &[
                ("They", "PRP"), ("walked", "VBD"), ("to", "TO"), ("the", "DT"), ("old", "JJ"),
                ("station", "NN"), ("yesterday", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "I want to visit London next summer.",
            domain: "cotidiano",
            annotations: &[
                ("I", "PRP"), ("want", "VBP"), ("to", "TO"), ("visit", "VB"), ("London", "NNP"),
                ("next", "JJ"), ("summer", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Mr. Brown opened the door slowly.",
            domain: "cotidiano",
            annotations: &[
                ("Mr.", "NNP"), ("Brown", "NNP"), ("opened", "VBD"), ("the", "DT"), ("door", "NN"),
                ("slowly", "RB"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The birds are singing in the tall trees.",
            domain: "cotidiano",
            annotations: &[
                ("The", "DT"), ("birds", "NNS"), ("are", "VBP"), ("singing", "VBG"), ("in", "IN"),
                ("the", "DT"), ("tall", "JJ"), ("trees", "NNS"), (".", "."),
            ],
        },
        // ===== SAÚDE =====
        AnnotatedSentence {
            text: "The doctor prescribed 5mg of aspirin.",
            domain: "saúde",
            annotations: &[
                ("The", "DT"), ("doctor", "NN"), ("prescribed", "VBD"), ("5", "CD"), ("mg", "NN"),
                ("of", "IN"), ("aspirin", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Patients should take 20mg twice a day.",
            domain: "saúde",
            annotations: &[
                ("Patients", "NNS"), ("should", "MD"), ("take", "VB"), ("20", "CD"), ("mg", "NN"),
                ("twice", "RB"), ("a", "DT"), ("day", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Dr. Smith examined the young patient.",
            domain: "saúde",
            annotations: &[
                ("Dr.", "NNP"), ("Smith", "NNP"), ("examined", "VBD"), ("the", "DT"), ("young", "JJ"),
                ("patient", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The nurse measured his blood pressure.",
            domain: "saúde",
            annotations: &[
                ("The", "DT"), ("nurse", "NN"), ("measured", "VBD"), ("his", "PRP$"), ("blood", "NN"),
                ("pressure", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Regular exercise improves heart health.",
            domain: "saúde",
            annotations: &[
                ("Regular", "JJ"), ("exercise", "NN"), ("improves", "VBZ"), ("heart", "NN"),
                ("health", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "She runs 5km every morning.",
            domain: "saúde",
            annotations: &[
                ("She", "PRP"), ("runs", "VBZ"), ("5", "CD"), ("km", "NNS"), ("every", "DT"),
                ("morning", "NN"), (".", "."),
            ],
        },
        // ===== ECONOMIA =====
        AnnotatedSentence {
            text: "The company reported strong profits in 2023.",
            domain: "economia",
            annotations: &[
                ("The", "DT"), ("company", "NN"), ("reported", "VBD"), ("strong", "JJ"),
                ("profits", "NNS"), ("in", "IN"), ("2023", "CD"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Investors sold their shares quickly.",
            domain: "economia",
            annotations: &[
                ("Investors", "NNS"), ("sold", "VBD"), ("their", "PRP$"), ("shares", "NNS"),
                ("quickly", "RB"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Prices rose by 3.5 percent last year.",
            domain: "economia",
            annotations: &[
                ("Prices", "NNS"), ("rose", "VBD"), ("by", "IN"), ("3.5", "CD"), ("percent", "NN"),
                ("last", "JJ"), ("year", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The bank will lower interest rates.",
            domain: "economia",
            annotations: &[
                ("The", "DT"), ("bank", "NN"), ("will", "MD"), ("lower", "VB"), ("interest", "NN"),
                ("rates", "NNS"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Small businesses need cheap loans.",
            domain: "economia",
            annotations: &[
                ("Small", "JJ"), ("businesses", "NNS"), ("need", "VBP"), ("cheap", "JJ"),
                ("loans", "NNS"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The market is growing rapidly.",
            domain: "economia",
            annotations: &[
                ("The", "DT"), ("market", "NN"), ("is", "VBZ"), ("growing", "VBG"), ("rapidly", "RB"),
                (".", "."),
            ],
        },
        // ===== CIÊNCIA E TECNOLOGIA =====
        AnnotatedSentence {
            text: "Scientists discovered a new planet.",
            domain: "ciência",
            annotations: &[
                ("Scientists", "NNS"), ("discovered", "VBD"), ("a", "DT"), ("new", "JJ"),
                ("planet", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The computer stores 500GB of data.",
            domain: "tecnologia",
            annotations: &[
                ("The", "DT"), ("computer", "NN"), ("stores", "VBZ"), ("500", "CD"), ("GB", "NNS"),
                ("of", "IN"), ("data", "NNS"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Engineers are testing the fast network.",
            domain: "tecnologia",
            annotations: &[
                ("Engineers", "NNS"), ("are", "VBP"), ("testing", "VBG"), ("the", "DT"), ("fast", "JJ"),
                ("network", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The old software crashed again.",
            domain: "tecnologia",
            annotations: &[
                ("The", "DT"), ("old", "JJ"), ("software", "NN"), ("crashed", "VBD"), ("again", "RB"),
                (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Researchers published their results online.",
            domain: "ciência",
            annotations: &[
                ("Researchers", "NNS"), ("published", "VBD"), ("their", "PRP$"), ("results", "NNS"),
                ("online", "RB"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Water boils at 100 degrees.",
            domain: "ciência",
            annotations: &[
                ("Water", "NN"), ("boils", "VBZ"), ("at", "IN"), ("100", "CD"), ("degrees", "NNS"),
                (".", "."),
            ],
        },
        // ===== AMBIGUIDADE =====
        AnnotatedSentence {
            text: "Reporters dog the senator every day.",
            domain: "ambiguidade",
            annotations: &[
                ("Reporters", "NNS"), ("dog", "VBP"), ("the", "DT"), ("senator", "NN"), ("every", "DT"),
                ("day", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "They fish in the river.",
            domain: "ambiguidade",
            annotations: &[
                ("They", "PRP"), ("fish", "VBP"), ("in", "IN"), ("the", "DT"), ("river", "NN"),
                (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The fish swim near the surface.",
            domain: "ambiguidade",
            annotations: &[
                ("The", "DT"), ("fish", "NNS"), ("swim", "VBP"), ("near", "IN"), ("the", "DT"),
                ("surface", "NN"), (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Please book the flight today.",
            domain: "ambiguidade",
            annotations: &[
                ("Please", "UH"), ("book", "VB"), ("the", "DT"), ("flight", "NN"), ("today", "NN"),
                (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The light was too bright.",
            domain: "ambiguidade",
            annotations: &[
                ("The", "DT"), ("light", "NN"), ("was", "VBD"), ("too", "RB"), ("bright", "JJ"),
                (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "She carried a light bag.",
            domain: "ambiguidade",
            annotations: &[
                ("She", "PRP"), ("carried", "VBD"), ("a", "DT"), ("light", "JJ"), ("bag", "NN"),
                (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "Time flies like an arrow.",
            domain: "ambiguidade",
            annotations: &[
                ("Time", "NN"), ("flies", "VBZ"), ("like", "IN"), ("an", "DT"), ("arrow", "NN"),
                (".", "."),
            ],
        },
        AnnotatedSentence {
            text: "The dog and the cat are friends.",
            domain: "ambiguidade",
            annotations: &[
                ("The", "DT"), ("dog", "NN"), ("and", "CC"), ("the", "DT"), ("cat", "NN"), ("are", "VBP"),
                ("friends", "NNS"), (".", "."),
            ],
        },
    ]
}

/// Corpus embutido já convertido em [`Sentence`]s anotadas.
pub fn corpus_sentences() -> Vec<Sentence> {
    get_corpus().iter().map(AnnotatedSentence::to_sentence).collect()
}

/// Lê um corpus com uma sentença por linha e tokens `palavra<sep>TAG` separados por espaço.
///
/// Linhas vazias são ignoradas com um aviso. Um token sem separador (ou com parte vazia)
/// produz [`TaggerError::InvalidCorpus`] com o número da linha (a partir de 1).
pub fn read_corpus(reader: impl BufRead, separator: char) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let number = i + 1;
        if line.trim().is_empty() {
            warn!(line = number, "blank corpus line skipped");
            continue;
        }
        let sentence = Sentence::parse_tagged(&line, separator).map_err(|token| TaggerError::InvalidCorpus {
            line: number,
            message: format!("token {token} has no `{separator}` tag separator"),
        })?;
        sentences.push(sentence);
    }
    info!(sentences = sentences.len(), "corpus loaded");
    Ok(sentences)
}

/// Textos de demonstração para a interface web.
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Ambiguidade", "Reporters dog the famous actor every day."),
        ("Saúde", "The doctor prescribed 10mg of ibuprofen."),
        ("Economia", "The company will lower prices next year."),
        ("Cotidiano", "Mr. Brown walked his dog in the park."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::UnitDictionary;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_corpus_is_fully_annotated() {
        for sentence in corpus_sentences() {
            assert!(!sentence.is_empty());
            assert!(sentence.has_gold());
        }
    }

    #[test]
    fn test_annotations_match_tokenizer() {
        let units = UnitDictionary::default();
        for annotated in get_corpus() {
            let forms: Vec<&str> = annotated.annotations.iter().map(|(w, _)| *w).collect();
            assert_eq!(tokenize(annotated.text, &units).forms(), forms, "{}", annotated.text);
        }
    }

    #[test]
    fn test_read_corpus() {
        let input = "The/DT dog/NN barks/VBZ\n\nA/DT cat/NN\n";
        let sentences = read_corpus(input.as_bytes(), '/').unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].gold_tags(), Some(vec!["DT", "NN", "VBZ"]));
    }

    #[test]
    fn test_read_corpus_reports_line() {
        let input = "The/DT dog/NN\nbroken token/NN\n";
        let result = read_corpus(input.as_bytes(), '/');
        assert!(matches!(result, Err(TaggerError::InvalidCorpus { line: 2, .. })));
    }
}
