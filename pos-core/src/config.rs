//! # Configuração do Etiquetador
//!
//! A configuração é lida **uma única vez**, na construção do controlador, a partir de JSON.
//! Campos ausentes assumem os valores de [`Default`].
//!
//! ```json
//! {
//!   "mode": "train",
//!   "collector": { "min_word_frequency": 2, "ambiguity_threshold": 0.4 },
//!   "training": { "iterations": 10, "bootstrap_rounds": 1 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tagger::RunMode;

/// Política de finalização dos léxicos (modo COLLECT).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Frequência mínima para uma forma entrar no conjunto de formas retidas.
    pub min_word_frequency: usize,
    /// Frequência relativa mínima para uma tag entrar na classe de ambiguidade.
    /// `0.0` mantém todas as tags observadas.
    pub ambiguity_threshold: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            min_word_frequency: 1,
            ambiguity_threshold: 0.0,
        }
    }
}

/// Parâmetros do classificador de referência (perceptron).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Épocas do perceptron sobre as instâncias acumuladas.
    pub iterations: usize,
    /// Rodadas de BOOTSTRAP após o treino inicial.
    pub bootstrap_rounds: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            bootstrap_rounds: 0,
        }
    }
}

/// Configuração completa do etiquetador.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    pub mode: RunMode,
    pub collector: CollectorConfig,
    pub training: TrainingConfig,
    /// Tamanho do beam para variantes com ramificação. O núcleo guloso usa sempre 1.
    pub beam_size: usize,
    /// Margem mínima de score para ramificar (variantes com beam).
    pub margin_threshold: f64,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Decode,
            collector: CollectorConfig::default(),
            training: TrainingConfig::default(),
            beam_size: 1,
            margin_threshold: 0.5,
        }
    }
}

impl TaggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// `true` quando a configuração pede busca com ramificação (beam > 1).
    pub fn use_branching(&self) -> bool {
        self.beam_size > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = TaggerConfig::from_json_str(r#"{ "mode": "collect" }"#).unwrap();
        assert_eq!(config.mode, RunMode::Collect);
        assert_eq!(config.collector, CollectorConfig::default());
        assert_eq!(config.training.iterations, 10);
        assert!(!config.use_branching());
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "mode": "bootstrap",
            "collector": { "min_word_frequency": 3, "ambiguity_threshold": 0.25 },
            "training": { "iterations": 4, "bootstrap_rounds": 2 },
            "beam_size": 8
        }"#;
        let config = TaggerConfig::from_json_str(json).unwrap();
        assert_eq!(config.mode, RunMode::Bootstrap);
        assert_eq!(config.collector.min_word_frequency, 3);
        assert_eq!(config.collector.ambiguity_threshold, 0.25);
        assert_eq!(config.training.bootstrap_rounds, 2);
        assert!(config.use_branching());
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        assert!(TaggerConfig::from_json_str(r#"{ "mode": "parse" }"#).is_err());
    }
}
