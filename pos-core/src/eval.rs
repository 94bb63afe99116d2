//! # Avaliação de Acurácia
//!
//! O [`Evaluator`] acumula contagens por token (corretos / total) e, de quebra,
//! estatísticas por rótulo e por sentença. As contagens só crescem; para zerar, crie
//! um novo avaliador.
//!
//! | Métrica              | Fórmula                                   |
//! |----------------------|-------------------------------------------|
//! | Acurácia de token    | corretos / total                          |
//! | Acurácia de sentença | sentenças 100% corretas / sentenças       |
//! | Precisão (rótulo)    | corretos / predições do rótulo            |
//! | Cobertura (rótulo)   | corretos / ocorrências gold do rótulo     |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaggerError};
use crate::sentence::Sentence;

/// Contagens de um rótulo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    /// Predições corretas deste rótulo.
    pub correct: usize,
    /// Ocorrências do rótulo na referência.
    pub observed: usize,
    /// Vezes que o rótulo foi predito.
    pub predicted: usize,
}

impl LabelCounts {
    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.observed)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

/// Acumulador de avaliação.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluator {
    correct: usize,
    total: usize,
    sentences_correct: usize,
    sentences: usize,
    labels: BTreeMap<String, LabelCounts>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compara a sequência predita com a de referência e soma as contagens.
    ///
    /// Nada é contado se a sentença falhar na validação (predição ausente ou tamanhos
    /// diferentes).
    pub fn count_correct(&mut self, predicted: &[Option<&str>], gold: &[String]) -> Result<()> {
        if predicted.len() != gold.len() {
            return Err(TaggerError::LengthMismatch {
                predicted: predicted.len(),
                gold: gold.len(),
            });
        }
        if let Some(index) = predicted.iter().position(Option::is_none) {
            return Err(TaggerError::MissingPrediction { index });
        }

        let mut matched = 0usize;
        for (p, g) in predicted.iter().flatten().zip(gold) {
            self.labels.entry(g.clone()).or_default().observed += 1;
            self.labels.entry(p.to_string()).or_default().predicted += 1;
            if *p == g.as_str() {
                self.labels.entry(g.clone()).or_default().correct += 1;
                matched += 1;
            }
        }

        self.correct += matched;
        self.total += gold.len();
        self.sentences += 1;
        if matched == gold.len() {
            self.sentences_correct += 1;
        }
        Ok(())
    }

    /// Avalia uma sentença já decodificada externamente (tags gold e preditas nos tokens).
    pub fn count_sentence(&mut self, sentence: &Sentence) -> Result<()> {
        let gold = sentence
            .tokens()
            .iter()
            .map(|t| t.gold_tag.clone().ok_or(TaggerError::MissingGoldAnnotation { index: t.index }))
            .collect::<Result<Vec<_>>>()?;
        self.count_correct(&sentence.predicted_tags(), &gold)
    }

    /// Incorpora as contagens de outro avaliador (redução de workers paralelos).
    pub fn merge(&mut self, other: Evaluator) {
        self.correct += other.correct;
        self.total += other.total;
        self.sentences_correct += other.sentences_correct;
        self.sentences += other.sentences;
        for (label, counts) in other.labels {
            let entry = self.labels.entry(label).or_default();
            entry.correct += counts.correct;
            entry.observed += counts.observed;
            entry.predicted += counts.predicted;
        }
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Acurácia por token; `0.0` antes de qualquer contagem.
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    pub fn sentence_accuracy(&self) -> f64 {
        ratio(self.sentences_correct, self.sentences)
    }

    pub fn label_counts(&self) -> &BTreeMap<String, LabelCounts> {
        &self.labels
    }

    /// Média macro do F1 sobre os rótulos observados na referência.
    pub fn macro_f1(&self) -> f64 {
        let observed: Vec<&LabelCounts> = self.labels.values().filter(|c| c.observed > 0).collect();
        if observed.is_empty() {
            return 0.0;
        }
        observed.iter().map(|c| c.f1()).sum::<f64>() / observed.len() as f64
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy {:.2}% ({}/{}), sentences {:.2}% ({}/{})",
            self.accuracy() * 100.0,
            self.correct,
            self.total,
            self.sentence_accuracy() * 100.0,
            self.sentences_correct,
            self.sentences
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gold(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_one_of_two_correct() {
        let mut eval = Evaluator::new();
        eval.count_correct(&[Some("NN"), Some("VB")], &gold(&["NN", "NN"])).unwrap();
        assert_eq!(eval.correct(), 1);
        assert_eq!(eval.total(), 2);
        assert_eq!(eval.accuracy(), 0.5);
        assert_eq!(eval.sentence_accuracy(), 0.0);
    }

    #[test]
    fn test_label_counts() {
        let mut eval = Evaluator::new();
        eval.count_correct(&[Some("NN"), Some("VB")], &gold(&["NN", "NN"])).unwrap();
        let nn = eval.label_counts()["NN"];
        assert_eq!((nn.correct, nn.observed, nn.predicted), (1, 2, 1));
        assert_eq!(nn.precision(), 1.0);
        assert_eq!(nn.recall(), 0.5);
        let vb = eval.label_counts()["VB"];
        assert_eq!((vb.correct, vb.observed, vb.predicted), (0, 0, 1));
    }

    #[test]
    fn test_missing_prediction_counts_nothing() {
        let mut eval = Evaluator::new();
        let result = eval.count_correct(&[Some("NN"), None], &gold(&["NN", "NN"]));
        assert!(matches!(result, Err(TaggerError::MissingPrediction { index: 1 })));
        assert_eq!(eval, Evaluator::new());
    }

    #[test]
    fn test_length_mismatch() {
        let mut eval = Evaluator::new();
        let result = eval.count_correct(&[Some("NN")], &gold(&["NN", "NN"]));
        assert!(matches!(result, Err(TaggerError::LengthMismatch { predicted: 1, gold: 2 })));
    }

    #[test]
    fn test_count_sentence_reads_tokens() {
        let mut sentence = Sentence::from_tagged(&[("a", "DT"), ("cat", "NN")]);
        sentence.tokens_mut()[0].predicted_tag = Some("DT".into());
        sentence.tokens_mut()[1].predicted_tag = Some("NN".into());

        let mut eval = Evaluator::new();
        eval.count_sentence(&sentence).unwrap();
        assert_eq!(eval.accuracy(), 1.0);
        assert_eq!(eval.sentence_accuracy(), 1.0);

        let unannotated = Sentence::from_forms(&["a"]);
        assert!(matches!(
            eval.count_sentence(&unannotated),
            Err(TaggerError::MissingGoldAnnotation { index: 0 })
        ));
    }

    #[test]
    fn test_merge_is_monotonic() {
        let mut a = Evaluator::new();
        a.count_correct(&[Some("NN")], &gold(&["NN"])).unwrap();
        let mut b = Evaluator::new();
        b.count_correct(&[Some("VB"), Some("NN")], &gold(&["NN", "NN"])).unwrap();

        a.merge(b);
        assert_eq!((a.correct(), a.total()), (2, 3));
        assert_eq!(a.sentence_accuracy(), 0.5);
        assert_eq!(a.to_string(), "accuracy 66.67% (2/3), sentences 50.00% (1/2)");
    }
}
