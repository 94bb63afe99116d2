//! # Erros do Etiquetador
//!
//! Todas as falhas do núcleo são representadas por [`TaggerError`].
//!
//! ## Classes de erro
//!
//! | Variante                | Classe               | Efeito                                   |
//! |-------------------------|----------------------|------------------------------------------|
//! | `InvalidTransition`     | Erro de programação  | Uso indevido da máquina de estados       |
//! | `MissingGoldAnnotation` | Dado ausente         | Aborta apenas a sentença atual           |
//! | `MissingPrediction`     | Dado ausente         | Aborta apenas a sentença atual           |
//! | `MissingLexicons`       | Configuração         | Deve ser detectado antes da 1ª sentença  |
//!
//! A coleta de estatísticas (modo COLLECT) nunca falha por causa de tokens malformados.

use crate::tagger::RunMode;

/// Resultado padrão do crate.
pub type Result<T, E = TaggerError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum TaggerError {
    /// Transição inválida: `advance` ou `assign_label` num estado terminal.
    #[error("invalid transition: `{operation}` called on a terminal state (sentence length {length})")]
    InvalidTransition {
        operation: &'static str,
        length: usize,
    },

    /// O token não possui rótulo de referência (gold), mas o modo exige um.
    #[error("token {index} has no gold annotation")]
    MissingGoldAnnotation { index: usize },

    /// O token ainda não recebeu um rótulo predito.
    #[error("token {index} has no predicted label")]
    MissingPrediction { index: usize },

    /// O modo precisa de léxicos finalizados, mas nenhum foi fornecido.
    #[error("mode `{mode}` requires finalized lexicons")]
    MissingLexicons { mode: RunMode },

    /// Operação não disponível no modo atual do controlador.
    #[error("`{operation}` is not available in mode `{mode}`")]
    ModeMismatch {
        operation: &'static str,
        mode: RunMode,
    },

    /// Sequências predita e de referência com tamanhos distintos.
    #[error("predicted sequence has {predicted} labels but gold sequence has {gold}")]
    LengthMismatch { predicted: usize, gold: usize },

    /// Linha de corpus que não pôde ser interpretada.
    #[error("corpus line {line}: {message}")]
    InvalidCorpus { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
