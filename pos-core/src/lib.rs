//! # pos-core — Etiquetador Morfossintático (POS) Baseado em Transições
//!
//! Este crate implementa o núcleo de um etiquetador de sequências da esquerda para a direita:
//! uma máquina de estados genérica que transforma uma sentença numa sequência de decisões,
//! um token por vez, servindo cinco modos de execução sobre a mesma abstração.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto ou corpus anotado ([`corpus`]).
//! 2.  **Tokenização** ([`tokenizer`]): fronteiras Unicode, com separação de unidades ([`dictionary`]).
//! 3.  **Estado** ([`state`]): índice corrente, visão gold e rótulos preditos de uma sentença.
//! 4.  **Controlador** ([`tagger`]): despacha cada sentença segundo o modo ativo:
//!     *   **COLLECT** ([`lexicon`]): formas de palavra e classes de ambiguidade.
//!     *   **TRAIN / BOOTSTRAP** ([`model`]): instâncias (features, rótulo oráculo) para o classificador.
//!     *   **DECODE**: predição gulosa com o classificador ([`perceptron`] como referência).
//!     *   **EVALUATE** ([`eval`]): acurácia por token contra a referência.
//! 5.  **Saída**: tags preditas gravadas nos tokens da [`Sentence`].
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::PosPipeline;
//!
//! // 1. Treina sobre o corpus embutido (COLLECT → TRAIN → DECODE)
//! let pipeline = PosPipeline::new().unwrap();
//!
//! // 2. Etiqueta um texto
//! let tokens = pipeline.analyze("The dog barks.").unwrap();
//!
//! for token in tokens {
//!     println!("{}/{} ({:.2})", token.text, token.tag, token.score);
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`tagger`]: Controlador e modos de execução.
//! - [`state`]: Máquina de estados e contrato de tarefas ([`TaggingTask`]).
//! - [`features`]: Extração de features POS.
//! - [`pipeline`]: Orquestrador de treino e análise.

pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod eval;
pub mod features;
pub mod lexicon;
pub mod model;
pub mod perceptron;
pub mod pipeline;
pub mod pos;
pub mod sentence;
pub mod state;
pub mod tagger;
pub mod tokenizer;

pub use config::{CollectorConfig, TaggerConfig, TrainingConfig};
pub use error::{Result, TaggerError};
pub use eval::Evaluator;
pub use lexicon::{CorpusCollector, LexiconCollector, Lexicons};
pub use model::{Classifier, Prediction, TrainingInstance};
pub use perceptron::PerceptronModel;
pub use pipeline::{EvaluationReport, PipelineEvent, PosPipeline, TaggedToken};
pub use pos::PosTask;
pub use sentence::{Sentence, Token};
pub use state::{TaggingState, TaggingTask};
pub use tagger::{RunMode, Stage, Tagger};
