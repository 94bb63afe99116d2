//! # Contrato do Classificador
//!
//! O núcleo não treina nem serializa modelos: ele apenas conversa com um
//! [`Classifier`] por duas portas:
//!
//! - **TRAIN / BOOTSTRAP**: `add_instances` recebe as instâncias de uma sentença.
//! - **DECODE / EVALUATE / BOOTSTRAP**: `predict_best` escolhe o melhor rótulo.
//!
//! O crate traz uma implementação de referência em [`crate::perceptron`].

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Par imutável (vetor de features, rótulo oráculo) emitido em TRAIN/BOOTSTRAP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingInstance {
    pub label: String,
    pub vector: FeatureVector,
}

impl TrainingInstance {
    pub fn new(label: impl Into<String>, vector: FeatureVector) -> Self {
        Self {
            label: label.into(),
            vector,
        }
    }
}

/// Melhor rótulo segundo o classificador, com seu score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

/// Classificador externo consumido pelo controlador.
///
/// `predict_best` usa `&self` para permitir decodificação paralela de sentenças
/// quando o tipo é `Sync`.
pub trait Classifier {
    /// Assume a posse das instâncias de uma sentença, na ordem dos tokens.
    fn add_instances(&mut self, instances: Vec<TrainingInstance>);

    fn predict_best(&self, vector: &FeatureVector) -> Prediction;
}
