//! # Coleta e Finalização de Léxicos
//!
//! No modo COLLECT o etiquetador percorre o corpus uma vez acumulando estatísticas:
//!
//! - **Frequência de formas**: quantas vezes cada forma minúscula-simplificada apareceu.
//! - **Co-ocorrência forma → tag gold**: quais tags cada forma recebeu no corpus.
//!
//! Ao final, as tabelas mutáveis são **congeladas** em [`Lexicons`], que passam a ser
//! compartilhados (somente leitura, via `Arc`) por todos os estados e extratores.
//!
//! ## Classe de ambiguidade
//!
//! Para cada forma retida, as tags observadas são ordenadas e unidas por `_`:
//!
//! ```text
//! dog/NN dog/NN dog/VB  →  "dog" ↦ "NN_VB"
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CollectorConfig;
use crate::error::Result;
use crate::sentence::Sentence;

/// Separador das tags dentro de uma classe de ambiguidade.
pub const AMBIGUITY_CLASS_DELIMITER: &str = "_";

/// Coletor de estatísticas de corpus genérico sobre o tipo de léxico produzido.
pub trait CorpusCollector {
    type Lexicons;

    /// Varre a sentença inteira (sem transições da máquina de estados).
    fn collect(&mut self, sentence: &Sentence);

    /// Coletor vazio com a mesma política, para coleta em paralelo.
    fn fork(&self) -> Self
    where
        Self: Sized;

    /// Incorpora as tabelas de outro coletor.
    fn merge(&mut self, other: Self)
    where
        Self: Sized;

    /// Congela as tabelas em léxicos imutáveis. Não altera o coletor.
    fn finalize(&self) -> Self::Lexicons;
}

/// Léxicos finalizados do etiquetador POS.
///
/// Os dois componentes formam o par exposto pela camada de persistência:
/// `(word_forms, ambiguity_classes)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lexicons {
    /// Formas minúsculas-simplificadas retidas pela política de frequência.
    pub word_forms: BTreeSet<String>,
    /// Forma minúscula-simplificada → classe de ambiguidade canônica.
    pub ambiguity_classes: BTreeMap<String, String>,
}

impl Lexicons {
    pub fn new(word_forms: BTreeSet<String>, ambiguity_classes: BTreeMap<String, String>) -> Self {
        Self {
            word_forms,
            ambiguity_classes,
        }
    }

    pub fn contains_word_form(&self, lower_simplified: &str) -> bool {
        self.word_forms.contains(lower_simplified)
    }

    pub fn ambiguity_class(&self, lower_simplified: &str) -> Option<&str> {
        self.ambiguity_classes.get(lower_simplified).map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Tabelas mutáveis da coleta POS.
///
/// Pertencem exclusivamente ao coletor; nunca são expostas como referências mutáveis.
#[derive(Debug, Clone, Default)]
pub struct LexiconCollector {
    config: CollectorConfig,
    /// forma → frequência.
    word_counts: HashMap<String, usize>,
    /// forma → (tag → frequência).
    tag_counts: HashMap<String, HashMap<String, usize>>,
}

impl LexiconCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            word_counts: HashMap::new(),
            tag_counts: HashMap::new(),
        }
    }

    /// Número de formas distintas observadas (antes da política).
    pub fn observed_forms(&self) -> usize {
        self.word_counts.len()
    }

    /// Formas com frequência `>= min_word_frequency`.
    ///
    /// Sem nenhuma coleta, retorna um conjunto vazio.
    pub fn finalize_word_forms(&self) -> BTreeSet<String> {
        let min = self.config.min_word_frequency;
        self.word_counts
            .iter()
            .filter(|(_, &count)| count >= min)
            .map(|(form, _)| form.clone())
            .collect()
    }

    /// Classes de ambiguidade das formas em `word_forms`.
    ///
    /// Mantém as tags com frequência relativa `>= ambiguity_threshold`, em ordem
    /// lexicográfica. Formas fora de `word_forms` (ou com classe vazia) ficam de fora.
    pub fn finalize_ambiguity_classes(&self, word_forms: &BTreeSet<String>) -> BTreeMap<String, String> {
        let threshold = self.config.ambiguity_threshold;
        let mut classes = BTreeMap::new();

        for form in word_forms {
            let Some(tags) = self.tag_counts.get(form) else {
                continue;
            };
            let total: usize = tags.values().sum();
            if total == 0 {
                continue;
            }
            let mut kept: Vec<&str> = tags
                .iter()
                .filter(|(_, &count)| count as f64 / total as f64 >= threshold)
                .map(|(tag, _)| tag.as_str())
                .collect();
            if kept.is_empty() {
                continue;
            }
            kept.sort_unstable();
            classes.insert(form.clone(), kept.join(AMBIGUITY_CLASS_DELIMITER));
        }

        classes
    }
}

impl CorpusCollector for LexiconCollector {
    type Lexicons = Lexicons;

    fn collect(&mut self, sentence: &Sentence) {
        for token in sentence.tokens() {
            let form = token.lower_simplified_form.trim();
            if form.is_empty() {
                continue;
            }
            *self.word_counts.entry(form.to_string()).or_insert(0) += 1;

            if let Some(tag) = token.gold_tag.as_deref().filter(|t| !t.is_empty()) {
                *self
                    .tag_counts
                    .entry(form.to_string())
                    .or_default()
                    .entry(tag.to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    fn fork(&self) -> Self {
        Self::new(self.config.clone())
    }

    fn merge(&mut self, other: Self) {
        for (form, count) in other.word_counts {
            *self.word_counts.entry(form).or_insert(0) += count;
        }
        for (form, tags) in other.tag_counts {
            let entry = self.tag_counts.entry(form).or_default();
            for (tag, count) in tags {
                *entry.entry(tag).or_insert(0) += count;
            }
        }
    }

    fn finalize(&self) -> Lexicons {
        let word_forms = self.finalize_word_forms();
        let ambiguity_classes = self.finalize_ambiguity_classes(&word_forms);
        info!(
            observed = self.word_counts.len(),
            retained = word_forms.len(),
            ambiguity_classes = ambiguity_classes.len(),
            "lexicons finalized"
        );
        Lexicons::new(word_forms, ambiguity_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_all(collector: &mut LexiconCollector, corpus: &[&[(&str, &str)]]) {
        for pairs in corpus {
            collector.collect(&Sentence::from_tagged(pairs));
        }
    }

    #[test]
    fn test_dog_ambiguity_class() {
        let mut collector = LexiconCollector::new(CollectorConfig::default());
        collect_all(&mut collector, &[&[("dog", "NN")], &[("dog", "NN")], &[("dog", "VB")]]);

        let forms = collector.finalize_word_forms();
        assert!(forms.contains("dog"));
        let classes = collector.finalize_ambiguity_classes(&forms);
        assert_eq!(classes.get("dog").map(String::as_str), Some("NN_VB"));
    }

    #[test]
    fn test_ambiguity_class_independent_of_order() {
        let mut a = LexiconCollector::new(CollectorConfig::default());
        collect_all(&mut a, &[&[("Dog", "VB")], &[("dog", "NN")], &[("DOG", "NN")]]);
        let mut b = LexiconCollector::new(CollectorConfig::default());
        collect_all(&mut b, &[&[("dog", "NN")], &[("dog", "NN")], &[("dog", "VB")]]);

        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut collector = LexiconCollector::new(CollectorConfig::default());
        collect_all(&mut collector, &[&[("run", "VB"), ("fast", "RB")], &[("run", "NN")]]);

        let forms = collector.finalize_word_forms();
        assert_eq!(forms, collector.finalize_word_forms());
        assert_eq!(
            collector.finalize_ambiguity_classes(&forms),
            collector.finalize_ambiguity_classes(&forms)
        );
    }

    #[test]
    fn test_empty_collector() {
        let collector = LexiconCollector::new(CollectorConfig::default());
        assert!(collector.finalize_word_forms().is_empty());
        assert_eq!(collector.finalize(), Lexicons::default());
    }

    #[test]
    fn test_frequency_policy_excludes_rare_forms() {
        let config = CollectorConfig {
            min_word_frequency: 2,
            ..CollectorConfig::default()
        };
        let mut collector = LexiconCollector::new(config);
        collect_all(&mut collector, &[&[("the", "DT"), ("cat", "NN")], &[("the", "DT")]]);

        let lexicons = collector.finalize();
        assert!(lexicons.contains_word_form("the"));
        assert!(!lexicons.contains_word_form("cat"));
        assert!(lexicons.ambiguity_class("cat").is_none());
        assert!(lexicons
            .ambiguity_classes
            .keys()
            .all(|k| lexicons.word_forms.contains(k)));
    }

    #[test]
    fn test_ambiguity_threshold() {
        let config = CollectorConfig {
            min_word_frequency: 1,
            ambiguity_threshold: 0.4,
        };
        let mut collector = LexiconCollector::new(config);
        collect_all(&mut collector, &[&[("dog", "NN")], &[("dog", "NN")], &[("dog", "VB")]]);
        assert_eq!(collector.finalize().ambiguity_class("dog"), Some("NN"));
    }

    #[test]
    fn test_blank_and_untagged_tokens_are_tolerated() {
        let mut collector = LexiconCollector::new(CollectorConfig::default());
        let sentence = Sentence::from_forms(&["  ", "plain"]);
        collector.collect(&sentence);

        let lexicons = collector.finalize();
        assert_eq!(collector.observed_forms(), 1);
        assert!(lexicons.contains_word_form("plain"));
        assert!(lexicons.ambiguity_class("plain").is_none());
    }

    #[test]
    fn test_merge_matches_sequential_collection() {
        let corpus: [&[(&str, &str)]; 3] = [&[("a", "DT")], &[("a", "DT"), ("run", "VB")], &[("run", "NN")]];
        let mut sequential = LexiconCollector::new(CollectorConfig::default());
        collect_all(&mut sequential, &corpus);

        let mut left = sequential.fork();
        collect_all(&mut left, &corpus[..1]);
        let mut right = left.fork();
        collect_all(&mut right, &corpus[1..]);
        left.merge(right);

        assert_eq!(left.finalize(), sequential.finalize());
    }

    #[test]
    fn test_lexicons_json_round_trip() {
        let mut collector = LexiconCollector::new(CollectorConfig::default());
        collect_all(&mut collector, &[&[("dog", "NN"), ("runs", "VBZ")]]);
        let lexicons = collector.finalize();

        let restored = Lexicons::from_json(&lexicons.to_json().unwrap()).unwrap();
        assert_eq!(restored, lexicons);
    }
}
