//! # Pipeline POS — Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena tokenizador, controlador e perceptron. O treino percorre os
//! modos na ordem COLLECT → TRAIN → (BOOTSTRAP)* → DECODE; a análise emite eventos em
//! cada passo via um canal Rust (`mpsc`), permitindo que o servidor WebSocket transmita
//! o progresso em tempo real para o cliente.

use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::TaggerConfig;
use crate::corpus::corpus_sentences;
use crate::dictionary::UnitDictionary;
use crate::error::Result;
use crate::eval::{Evaluator, LabelCounts};
use crate::lexicon::Lexicons;
use crate::perceptron::PerceptronModel;
use crate::pos::PosTask;
use crate::sentence::Sentence;
use crate::tagger::{DecodeStep, RunMode, Tagger};
use crate::tokenizer::{tokenize_spans, TextSpan};

/// Quantidade de features exibidas por token nos eventos.
const TOP_FEATURES: usize = 10;

/// Token com a tag predita e sua posição no texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaggedToken {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub tag: String,
    pub score: f64,
}

/// Resultado de [`PosPipeline::evaluate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub sentence_accuracy: f64,
    pub correct: usize,
    pub total: usize,
    pub macro_f1: f64,
    pub labels: BTreeMap<String, LabelCounts>,
    /// Sentenças descartadas (ex: sem anotação gold).
    pub skipped: usize,
}

/// Eventos emitidos pelo pipeline durante a análise.
///
/// Permitem que a UI (frontend) visualize a decisão do modelo token a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Tokenização concluída.
    TokenizationDone { tokens: Vec<TextSpan>, total: usize },
    /// **Passo 2**: Features extraídas para o token corrente.
    FeaturesComputed {
        token_index: usize,
        token_text: String,
        top_features: Vec<(String, f64)>,
    },
    /// **Passo 3**: Tag atribuída ao token corrente (antes de avançar).
    TagAssigned {
        token_index: usize,
        token_text: String,
        tag: String,
        score: f64,
    },
    /// **Conclusão**: todos os tokens etiquetados.
    Done {
        tagged_tokens: Vec<TaggedToken>,
        total_tokens: usize,
        processing_ms: u64,
    },
    /// **Falha**: a análise foi interrompida.
    Error { message: String },
}

/// O pipeline POS principal: um controlador em DECODE sobre léxicos e perceptron treinados.
pub struct PosPipeline {
    tagger: Tagger<PosTask, PerceptronModel>,
    units: UnitDictionary,
}

impl PosPipeline {
    /// Treina sobre o corpus embutido com a configuração padrão.
    pub fn new() -> Result<Self> {
        Self::train(&corpus_sentences(), &TaggerConfig::default())
    }

    /// Treina do zero: COLLECT, finalização dos léxicos, TRAIN, `fit` e as rodadas de
    /// BOOTSTRAP configuradas. O corpus recebido não é alterado.
    pub fn train(corpus: &[Sentence], config: &TaggerConfig) -> Result<Self> {
        let start = Instant::now();
        let mut sentences = corpus.to_vec();
        let iterations = config.training.iterations;

        let mut collector: Tagger<PosTask, PerceptronModel> = Tagger::for_collect(PosTask, &config.collector);
        collector.process_batch(&mut sentences);
        let mut tagger = collector.finish_collect(PerceptronModel::new())?;

        let summary = tagger.process_batch(&mut sentences);
        info!(sentences = summary.processed, skipped = summary.failures.len(), "training pass done");
        if let Some(model) = tagger.model_mut() {
            model.fit(iterations);
        }

        for round in 0..config.training.bootstrap_rounds {
            tagger = tagger.switch_mode(RunMode::Bootstrap)?;
            let summary = tagger.process_batch(&mut sentences);
            info!(round, sentences = summary.processed, "bootstrap pass done");
            if let Some(model) = tagger.model_mut() {
                model.fit(iterations);
            }
        }

        let mut tagger = tagger.switch_mode(RunMode::Decode)?;
        if let Some(model) = tagger.model_mut() {
            model.clear_instances();
        }
        info!(elapsed_ms = start.elapsed().as_millis() as u64, "pipeline ready");
        Ok(Self {
            tagger,
            units: UnitDictionary::default(),
        })
    }

    /// Pipeline a partir de léxicos e modelo persistidos.
    pub fn from_parts(lexicons: Lexicons, model: PerceptronModel) -> Self {
        Self {
            tagger: Tagger::for_decode(PosTask, lexicons, model),
            units: UnitDictionary::default(),
        }
    }

    pub fn with_units(mut self, units: UnitDictionary) -> Self {
        self.units = units;
        self
    }

    pub fn lexicons(&self) -> Arc<Lexicons> {
        self.tagger.lexicons()
    }

    pub fn model(&self) -> Option<&PerceptronModel> {
        self.tagger.model()
    }

    /// Processa o texto de forma síncrona e retorna os tokens etiquetados.
    pub fn analyze(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let spans = tokenize_spans(text, &self.units);
        self.tag_spans(spans, |_| {})
    }

    /// Executa a análise enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `TokenizationDone`
    /// 2. `FeaturesComputed` e `TagAssigned`, um par por token, da esquerda para a direita
    /// 3. `Done` (ou `Error`)
    pub fn analyze_streaming(&self, text: &str, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();
        let spans = tokenize_spans(text, &self.units);
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens: spans.clone(),
            total: spans.len(),
        });

        let result = self.tag_spans(spans, |step| {
            let _ = tx.send(PipelineEvent::FeaturesComputed {
                token_index: step.index,
                token_text: step.form.to_string(),
                top_features: step.features.top(TOP_FEATURES),
            });
            let _ = tx.send(PipelineEvent::TagAssigned {
                token_index: step.index,
                token_text: step.form.to_string(),
                tag: step.prediction.label.clone(),
                score: step.prediction.score,
            });
        });

        let event = match result {
            Ok(tagged_tokens) => PipelineEvent::Done {
                total_tokens: tagged_tokens.len(),
                tagged_tokens,
                processing_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => PipelineEvent::Error { message: e.to_string() },
        };
        let _ = tx.send(event);
    }

    /// Decodifica uma cópia do corpus com o controlador treinado e compara com a referência.
    ///
    /// Sentenças sem anotação gold completa são descartadas e contadas em `skipped`.
    pub fn evaluate(&self, corpus: &[Sentence]) -> EvaluationReport {
        let mut sentences = corpus.to_vec();
        let scored: Vec<Result<Evaluator>> = sentences
            .par_iter_mut()
            .map(|sentence| {
                self.tagger.decode(sentence)?;
                let mut counts = Evaluator::new();
                counts.count_sentence(sentence)?;
                Ok(counts)
            })
            .collect();

        let mut evaluator = Evaluator::new();
        let mut skipped = 0;
        for (i, result) in scored.into_iter().enumerate() {
            match result {
                Ok(counts) => evaluator.merge(counts),
                Err(e) => {
                    debug!(sentence = i, error = %e, "sentence skipped");
                    skipped += 1;
                }
            }
        }
        info!(result = %evaluator, skipped, "evaluation done");
        EvaluationReport {
            accuracy: evaluator.accuracy(),
            sentence_accuracy: evaluator.sentence_accuracy(),
            correct: evaluator.correct(),
            total: evaluator.total(),
            macro_f1: evaluator.macro_f1(),
            labels: evaluator.label_counts().clone(),
            skipped,
        }
    }

    fn tag_spans(&self, spans: Vec<TextSpan>, mut on_step: impl FnMut(&DecodeStep<'_>)) -> Result<Vec<TaggedToken>> {
        let forms: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        let mut sentence = Sentence::from_forms(&forms);
        let mut scores = Vec::with_capacity(spans.len());

        self.tagger.decode_observed(&mut sentence, |step| {
            scores.push(step.prediction.score);
            on_step(step);
        })?;

        let tagged = spans
            .into_iter()
            .zip(sentence.tokens())
            .zip(scores)
            .map(|((span, token), score)| TaggedToken {
                index: span.index,
                text: span.text,
                start: span.start,
                end: span.end,
                tag: token.predicted_tag.clone().unwrap_or_default(),
                score,
            })
            .collect();
        Ok(tagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> PosPipeline {
        PosPipeline::new().unwrap()
    }

    #[test]
    fn test_pipeline_tags_every_token() {
        let tagged = pipeline().analyze("The dog barks.").unwrap();
        assert_eq!(tagged.len(), 4);
        assert!(tagged.iter().all(|t| !t.tag.is_empty()));
        assert_eq!(tagged[0].tag, "DT");
        assert_eq!(tagged[3].tag, ".");
    }

    #[test]
    fn test_pipeline_empty() {
        assert!(pipeline().analyze("").unwrap().is_empty());
    }

    #[test]
    fn test_pipeline_events_streaming() {
        let pipeline = pipeline();
        let (tx, rx) = mpsc::channel();
        pipeline.analyze_streaming("She reads a book.", tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(matches!(&events[0], PipelineEvent::TokenizationDone { total: 5, .. }));
        let assigned = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::TagAssigned { .. }))
            .count();
        assert_eq!(assigned, 5);
        assert!(matches!(events.last(), Some(PipelineEvent::Done { total_tokens: 5, .. })));
    }

    #[test]
    fn test_corpus_is_learned() {
        let pipeline = pipeline();
        let report = pipeline.evaluate(&corpus_sentences());
        assert_eq!(report.skipped, 0);
        assert!(report.total > 0);
        assert!(report.accuracy > 0.8, "accuracy {}", report.accuracy);
    }

    #[test]
    fn test_bootstrap_rounds_and_lexicons() {
        let mut config = TaggerConfig::default();
        config.training.iterations = 3;
        config.training.bootstrap_rounds = 1;
        let pipeline = PosPipeline::train(&corpus_sentences(), &config).unwrap();

        let lexicons = pipeline.lexicons();
        assert!(lexicons.contains_word_form("dog"));
        assert_eq!(lexicons.ambiguity_class("dog"), Some("NN_VBP"));
        assert_eq!(pipeline.model().unwrap().instance_count(), 0);
    }

    #[test]
    fn test_evaluate_agrees_with_evaluate_mode() {
        let pipeline = pipeline();
        let corpus = corpus_sentences();
        let report = pipeline.evaluate(&corpus);

        let model = pipeline.model().unwrap().clone();
        let mut tagger = Tagger::for_evaluate(PosTask, pipeline.lexicons(), model);
        let mut sentences = corpus.clone();
        assert!(tagger.process_batch(&mut sentences).is_clean());

        let evaluator = tagger.evaluator().unwrap();
        assert_eq!(report.correct, evaluator.correct());
        assert_eq!(report.total, evaluator.total());
        assert_eq!(report.sentence_accuracy, evaluator.sentence_accuracy());
        assert_eq!(report.labels, *evaluator.label_counts());
        assert!(corpus.iter().all(|s| s.predicted_tags().iter().all(Option::is_none)));
    }

    #[test]
    fn test_evaluate_skips_unannotated() {
        let mut corpus = corpus_sentences();
        corpus.push(Sentence::from_forms(&["unlabeled"]));
        let report = pipeline().evaluate(&corpus);
        assert_eq!(report.skipped, 1);
    }
}
