//! # Controlador do Etiquetador (despacho por modo)
//!
//! O [`Tagger`] é o ponto de entrada que processa uma sentença de ponta a ponta
//! segundo o modo ativo. O modo é um tipo soma ([`Stage`]) em que cada variante
//! carrega exatamente o que precisa:
//!
//! | Modo      | Por sentença                                                  | Saída                         |
//! |-----------|---------------------------------------------------------------|-------------------------------|
//! | COLLECT   | entrega a sentença inteira ao coletor, sem laço               | tabelas do coletor            |
//! | TRAIN     | laço: features → oráculo → instância → atribui oráculo        | `add_instances`               |
//! | BOOTSTRAP | laço: features → oráculo → instância → atribui **predição**   | `add_instances`               |
//! | DECODE    | laço: features → `predict_best` → atribui                     | tags preditas preenchidas     |
//! | EVALUATE  | laço de DECODE embutido, depois compara predito × gold        | contagens do avaliador        |
//!
//! ## EVALUATE re-decodifica
//!
//! O modo EVALUATE **sempre decodifica a sentença internamente** com o classificador
//! que carrega, e só então compara com a referência. Para avaliar predições feitas
//! por outro componente, use [`Evaluator::count_sentence`] diretamente.
//!
//! ## Ordem
//!
//! O token `i` é sempre decidido antes do token `i + 1`: as features de um token podem
//! depender das tags **preditas** dos anteriores. Paralelismo existe apenas entre
//! sentenças ([`Tagger::process_batch`]).

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CollectorConfig, TaggerConfig};
use crate::error::{Result, TaggerError};
use crate::eval::Evaluator;
use crate::features::FeatureVector;
use crate::lexicon::CorpusCollector;
use crate::model::{Classifier, Prediction, TrainingInstance};
use crate::sentence::Sentence;
use crate::state::{TaggingState, TaggingTask};

/// Modo de execução lido da configuração.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Coleta estatísticas de corpus para construir os léxicos.
    Collect,
    /// Emite instâncias rotuladas pelo oráculo, com histórico gold.
    Train,
    /// Emite instâncias rotuladas pelo oráculo, com histórico predito pelo modelo.
    Bootstrap,
    /// Predição gulosa com o classificador treinado.
    #[default]
    Decode,
    /// Decodifica e compara com a referência.
    Evaluate,
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Collect => "collect",
            RunMode::Train => "train",
            RunMode::Bootstrap => "bootstrap",
            RunMode::Decode => "decode",
            RunMode::Evaluate => "evaluate",
        }
    }

    /// Todos os modos, exceto COLLECT, exigem léxicos finalizados.
    pub fn needs_lexicons(&self) -> bool {
        !matches!(self, RunMode::Collect)
    }

    /// Modos que leem o oráculo de cada token. COLLECT apenas ignora tokens sem gold.
    pub fn needs_gold(&self) -> bool {
        matches!(self, RunMode::Train | RunMode::Bootstrap | RunMode::Evaluate)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dados carregados por cada modo.
pub enum Stage<T: TaggingTask, M> {
    Collect {
        collector: T::Collector,
    },
    Train {
        lexicons: Arc<T::Lexicons>,
        model: M,
    },
    Bootstrap {
        lexicons: Arc<T::Lexicons>,
        model: M,
    },
    Decode {
        lexicons: Arc<T::Lexicons>,
        model: M,
    },
    Evaluate {
        lexicons: Arc<T::Lexicons>,
        model: M,
        evaluator: Evaluator,
    },
}

impl<T: TaggingTask, M> Stage<T, M> {
    pub fn mode(&self) -> RunMode {
        match self {
            Stage::Collect { .. } => RunMode::Collect,
            Stage::Train { .. } => RunMode::Train,
            Stage::Bootstrap { .. } => RunMode::Bootstrap,
            Stage::Decode { .. } => RunMode::Decode,
            Stage::Evaluate { .. } => RunMode::Evaluate,
        }
    }

    fn into_parts(self) -> Option<(Arc<T::Lexicons>, M)> {
        match self {
            Stage::Collect { .. } => None,
            Stage::Train { lexicons, model }
            | Stage::Bootstrap { lexicons, model }
            | Stage::Decode { lexicons, model }
            | Stage::Evaluate { lexicons, model, .. } => Some((lexicons, model)),
        }
    }
}

/// Um passo de decodificação, entregue ao observador de [`Tagger::decode_observed`].
#[derive(Debug)]
pub struct DecodeStep<'a> {
    pub index: usize,
    pub form: &'a str,
    pub features: &'a FeatureVector,
    pub prediction: &'a Prediction,
}

/// Resultado de [`Tagger::process_batch`]: cada falha aborta apenas a sua sentença.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    /// `(posição da sentença no lote, erro)`.
    pub failures: Vec<(usize, TaggerError)>,
}

impl BatchSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Controlador genérico sobre a tarefa `T` e o classificador `M`.
pub struct Tagger<T: TaggingTask, M> {
    task: T,
    stage: Stage<T, M>,
}

impl<T: TaggingTask, M: Classifier> Tagger<T, M> {
    pub fn for_collect(task: T, config: &CollectorConfig) -> Self {
        let collector = task.collector(config);
        Self {
            task,
            stage: Stage::Collect { collector },
        }
    }

    pub fn for_train(task: T, lexicons: impl Into<Arc<T::Lexicons>>, model: M) -> Self {
        Self {
            task,
            stage: Stage::Train {
                lexicons: lexicons.into(),
                model,
            },
        }
    }

    pub fn for_bootstrap(task: T, lexicons: impl Into<Arc<T::Lexicons>>, model: M) -> Self {
        Self {
            task,
            stage: Stage::Bootstrap {
                lexicons: lexicons.into(),
                model,
            },
        }
    }

    pub fn for_decode(task: T, lexicons: impl Into<Arc<T::Lexicons>>, model: M) -> Self {
        Self {
            task,
            stage: Stage::Decode {
                lexicons: lexicons.into(),
                model,
            },
        }
    }

    pub fn for_evaluate(task: T, lexicons: impl Into<Arc<T::Lexicons>>, model: M) -> Self {
        Self {
            task,
            stage: Stage::Evaluate {
                lexicons: lexicons.into(),
                model,
                evaluator: Evaluator::new(),
            },
        }
    }

    /// Constrói o controlador no modo pedido pela configuração (lida uma única vez).
    ///
    /// Falha com [`TaggerError::MissingLexicons`] se o modo consome léxicos e nenhum foi
    /// fornecido. Em COLLECT, `lexicons` e `model` são ignorados.
    pub fn from_config(task: T, config: &TaggerConfig, lexicons: Option<T::Lexicons>, model: M) -> Result<Self> {
        let mode = config.mode;
        if !mode.needs_lexicons() {
            return Ok(Self::for_collect(task, &config.collector));
        }
        let lexicons = lexicons.ok_or(TaggerError::MissingLexicons { mode })?;
        Ok(match mode {
            RunMode::Train => Self::for_train(task, lexicons, model),
            RunMode::Bootstrap => Self::for_bootstrap(task, lexicons, model),
            RunMode::Evaluate => Self::for_evaluate(task, lexicons, model),
            RunMode::Decode | RunMode::Collect => Self::for_decode(task, lexicons, model),
        })
    }

    pub fn mode(&self) -> RunMode {
        self.stage.mode()
    }

    /// Processa uma sentença no modo ativo.
    pub fn process(&mut self, sentence: &mut Sentence) -> Result<()> {
        let task = &self.task;
        match &mut self.stage {
            Stage::Collect { collector } => {
                collector.collect(sentence);
                Ok(())
            }
            Stage::Train { lexicons, model } => {
                let instances = emit_instances::<T, M>(task, &**lexicons, sentence, None)?;
                model.add_instances(instances);
                Ok(())
            }
            Stage::Bootstrap { lexicons, model } => {
                let instances = emit_instances(task, &**lexicons, sentence, Some(&*model))?;
                model.add_instances(instances);
                Ok(())
            }
            Stage::Decode { lexicons, model } => {
                decode_sentence(task, &**lexicons, &*model, sentence, &mut ignore_step).map(|_| ())
            }
            Stage::Evaluate {
                lexicons,
                model,
                evaluator,
            } => evaluate_sentence(task, &**lexicons, &*model, sentence, evaluator),
        }
    }

    /// Decodifica a sentença sem alterar o controlador.
    ///
    /// Retorna o número de transições `advance` realizadas (igual ao tamanho da sentença).
    /// Disponível nos modos que carregam um classificador treinado (BOOTSTRAP, DECODE,
    /// EVALUATE).
    pub fn decode(&self, sentence: &mut Sentence) -> Result<usize> {
        self.decode_observed(sentence, ignore_step)
    }

    /// Como [`Tagger::decode`], chamando `on_step` após cada decisão.
    pub fn decode_observed(&self, sentence: &mut Sentence, mut on_step: impl FnMut(&DecodeStep<'_>)) -> Result<usize> {
        match &self.stage {
            Stage::Bootstrap { lexicons, model }
            | Stage::Decode { lexicons, model }
            | Stage::Evaluate { lexicons, model, .. } => {
                decode_sentence(&self.task, &**lexicons, model, sentence, &mut on_step)
            }
            Stage::Collect { .. } | Stage::Train { .. } => Err(TaggerError::ModeMismatch {
                operation: "decode",
                mode: self.mode(),
            }),
        }
    }

    /// Encerra a coleta: finaliza os léxicos e passa para TRAIN com `model`.
    pub fn finish_collect(self, model: M) -> Result<Self> {
        match self.stage {
            Stage::Collect { collector } => {
                let lexicons = collector.finalize();
                Ok(Self::for_train(self.task, lexicons, model))
            }
            other => Err(TaggerError::ModeMismatch {
                operation: "finish_collect",
                mode: other.mode(),
            }),
        }
    }

    /// Troca entre modos que carregam léxicos e classificador, preservando ambos.
    ///
    /// Entrar em EVALUATE cria um avaliador novo.
    pub fn switch_mode(self, mode: RunMode) -> Result<Self> {
        let current = self.mode();
        if mode == RunMode::Collect {
            return Err(TaggerError::ModeMismatch {
                operation: "switch_mode",
                mode: current,
            });
        }
        let task = self.task;
        let (lexicons, model) = self.stage.into_parts().ok_or(TaggerError::ModeMismatch {
            operation: "switch_mode",
            mode: current,
        })?;
        Ok(match mode {
            RunMode::Train => Self::for_train(task, lexicons, model),
            RunMode::Bootstrap => Self::for_bootstrap(task, lexicons, model),
            RunMode::Evaluate => Self::for_evaluate(task, lexicons, model),
            RunMode::Decode | RunMode::Collect => Self::for_decode(task, lexicons, model),
        })
    }

    /// Léxicos para persistência. Em COLLECT, finaliza as tabelas atuais.
    pub fn lexicons(&self) -> Arc<T::Lexicons> {
        match &self.stage {
            Stage::Collect { collector } => Arc::new(collector.finalize()),
            Stage::Train { lexicons, .. }
            | Stage::Bootstrap { lexicons, .. }
            | Stage::Decode { lexicons, .. }
            | Stage::Evaluate { lexicons, .. } => Arc::clone(lexicons),
        }
    }

    /// Restaura léxicos persistidos, sem transformá-los.
    pub fn set_lexicons(&mut self, restored: impl Into<Arc<T::Lexicons>>) -> Result<()> {
        match &mut self.stage {
            Stage::Collect { .. } => Err(TaggerError::ModeMismatch {
                operation: "set_lexicons",
                mode: RunMode::Collect,
            }),
            Stage::Train { lexicons, .. }
            | Stage::Bootstrap { lexicons, .. }
            | Stage::Decode { lexicons, .. }
            | Stage::Evaluate { lexicons, .. } => {
                *lexicons = restored.into();
                Ok(())
            }
        }
    }

    pub fn evaluator(&self) -> Option<&Evaluator> {
        match &self.stage {
            Stage::Evaluate { evaluator, .. } => Some(evaluator),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&M> {
        match &self.stage {
            Stage::Collect { .. } => None,
            Stage::Train { model, .. }
            | Stage::Bootstrap { model, .. }
            | Stage::Decode { model, .. }
            | Stage::Evaluate { model, .. } => Some(model),
        }
    }

    pub fn model_mut(&mut self) -> Option<&mut M> {
        match &mut self.stage {
            Stage::Collect { .. } => None,
            Stage::Train { model, .. }
            | Stage::Bootstrap { model, .. }
            | Stage::Decode { model, .. }
            | Stage::Evaluate { model, .. } => Some(model),
        }
    }

    pub fn into_model(self) -> Option<M> {
        self.stage.into_parts().map(|(_, model)| model)
    }
}

impl<T, M> Tagger<T, M>
where
    T: TaggingTask + Sync,
    T::Collector: Sync,
    M: Classifier + Sync,
{
    /// Processa um lote de sentenças, em paralelo entre sentenças (rayon).
    ///
    /// - COLLECT: um coletor por worker, reduzidos num único escritor.
    /// - TRAIN/BOOTSTRAP: instâncias produzidas em paralelo e entregues ao modelo na
    ///   ordem do lote.
    /// - EVALUATE: um avaliador por sentença, fundidos na ordem do lote.
    pub fn process_batch(&mut self, sentences: &mut [Sentence]) -> BatchSummary {
        let task = &self.task;
        let mode = self.stage.mode();
        let mut summary = BatchSummary::default();

        match &mut self.stage {
            Stage::Collect { collector } => {
                let template = collector.fork();
                let merged = sentences
                    .par_iter()
                    .fold(
                        || template.fork(),
                        |mut local, sentence| {
                            local.collect(sentence);
                            local
                        },
                    )
                    .reduce(
                        || template.fork(),
                        |mut a, b| {
                            a.merge(b);
                            a
                        },
                    );
                collector.merge(merged);
                summary.processed = sentences.len();
            }
            Stage::Train { lexicons, model } | Stage::Bootstrap { lexicons, model } => {
                let lexicons: &T::Lexicons = lexicons;
                let predictor = (mode == RunMode::Bootstrap).then_some(&*model);
                let results: Vec<Result<Vec<TrainingInstance>>> = sentences
                    .par_iter_mut()
                    .map(|sentence| emit_instances(task, lexicons, sentence, predictor))
                    .collect();
                for (i, result) in results.into_iter().enumerate() {
                    match result {
                        Ok(instances) => {
                            model.add_instances(instances);
                            summary.processed += 1;
                        }
                        Err(e) => summary.failures.push((i, e)),
                    }
                }
            }
            Stage::Decode { lexicons, model } => {
                let lexicons: &T::Lexicons = lexicons;
                let model = &*model;
                let results: Vec<Result<usize>> = sentences
                    .par_iter_mut()
                    .map(|sentence| decode_sentence(task, lexicons, model, sentence, &mut ignore_step))
                    .collect();
                for (i, result) in results.into_iter().enumerate() {
                    match result {
                        Ok(_) => summary.processed += 1,
                        Err(e) => summary.failures.push((i, e)),
                    }
                }
            }
            Stage::Evaluate {
                lexicons,
                model,
                evaluator,
            } => {
                let lexicons: &T::Lexicons = lexicons;
                let model = &*model;
                let results: Vec<Result<Evaluator>> = sentences
                    .par_iter_mut()
                    .map(|sentence| {
                        let mut local = Evaluator::new();
                        evaluate_sentence(task, lexicons, model, sentence, &mut local).map(|_| local)
                    })
                    .collect();
                for (i, result) in results.into_iter().enumerate() {
                    match result {
                        Ok(local) => {
                            evaluator.merge(local);
                            summary.processed += 1;
                        }
                        Err(e) => summary.failures.push((i, e)),
                    }
                }
            }
        }

        for (i, e) in &summary.failures {
            warn!(mode = %mode, sentence = i, error = %e, "sentence skipped");
        }
        debug!(mode = %mode, processed = summary.processed, failed = summary.failures.len(), "batch processed");
        summary
    }
}

/// Estado da sentença para `mode`: com visão gold apenas nos modos que leem o oráculo.
fn open_state<'a, T: TaggingTask>(
    mode: RunMode,
    task: &'a T,
    lexicons: &'a T::Lexicons,
    sentence: &'a mut Sentence,
) -> Result<TaggingState<'a, T>> {
    if mode.needs_gold() {
        TaggingState::with_gold(sentence, task, lexicons)
    } else {
        Ok(TaggingState::for_decode(sentence, task, lexicons))
    }
}

/// Laço supervisionado (TRAIN / BOOTSTRAP): uma instância por token, rotulada pelo oráculo.
///
/// Com `predictor`, o rótulo atribuído é a predição do modelo (BOOTSTRAP); sem ele, é o
/// próprio oráculo (TRAIN).
fn emit_instances<T: TaggingTask, M: Classifier>(
    task: &T,
    lexicons: &T::Lexicons,
    sentence: &mut Sentence,
    predictor: Option<&M>,
) -> Result<Vec<TrainingInstance>> {
    let mode = if predictor.is_some() { RunMode::Bootstrap } else { RunMode::Train };
    let mut state = open_state(mode, task, lexicons, sentence)?;
    let mut instances = Vec::with_capacity(state.len());

    while !state.is_terminal() {
        let vector = state.extract_features();
        let oracle = state.oracle_label()?.to_string();
        let label = match predictor {
            Some(model) => model.predict_best(&vector).label,
            None => oracle.clone(),
        };
        instances.push(TrainingInstance::new(oracle, vector));
        state.assign_label(&label)?;
        state.advance()?;
    }

    Ok(instances)
}

/// Laço guloso: features → melhor rótulo → atribui → avança, até o estado terminal.
fn run_greedy<T: TaggingTask, M: Classifier>(
    state: &mut TaggingState<'_, T>,
    model: &M,
    on_step: &mut dyn FnMut(&DecodeStep<'_>),
) -> Result<usize> {
    let mut advances = 0;
    while !state.is_terminal() {
        let features = state.extract_features();
        let prediction = model.predict_best(&features);
        state.assign_label(&prediction.label)?;
        if let Some(token) = state.current_token() {
            on_step(&DecodeStep {
                index: token.index,
                form: &token.form,
                features: &features,
                prediction: &prediction,
            });
        }
        state.advance()?;
        advances += 1;
    }
    Ok(advances)
}

fn decode_sentence<T: TaggingTask, M: Classifier>(
    task: &T,
    lexicons: &T::Lexicons,
    model: &M,
    sentence: &mut Sentence,
    on_step: &mut dyn FnMut(&DecodeStep<'_>),
) -> Result<usize> {
    let mut state = open_state(RunMode::Decode, task, lexicons, sentence)?;
    run_greedy(&mut state, model, on_step)
}

fn evaluate_sentence<T: TaggingTask, M: Classifier>(
    task: &T,
    lexicons: &T::Lexicons,
    model: &M,
    sentence: &mut Sentence,
    evaluator: &mut Evaluator,
) -> Result<()> {
    let mut state = open_state(RunMode::Evaluate, task, lexicons, sentence)?;
    run_greedy(&mut state, model, &mut ignore_step)?;
    let gold = state.gold_labels().unwrap_or_default();
    let predicted = state.predicted_labels();
    evaluator.count_correct(&predicted, gold)
}

fn ignore_step(_: &DecodeStep<'_>) {}
