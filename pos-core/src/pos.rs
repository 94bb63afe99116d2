//! # Tarefa POS
//!
//! Especialização da máquina de estados genérica para etiquetagem morfossintática:
//! o oráculo é `Token::gold_tag`, a predição vai para `Token::predicted_tag` e as
//! features vêm de [`extract_pos_features`].

use crate::config::CollectorConfig;
use crate::features::{extract_pos_features, FeatureVector};
use crate::lexicon::{LexiconCollector, Lexicons};
use crate::sentence::Token;
use crate::state::{TaggingState, TaggingTask};

/// Etiquetador POS (sem estado próprio: os léxicos vivem no controlador).
#[derive(Debug, Clone, Copy, Default)]
pub struct PosTask;

impl TaggingTask for PosTask {
    type Lexicons = Lexicons;
    type Collector = LexiconCollector;

    fn collector(&self, config: &CollectorConfig) -> LexiconCollector {
        LexiconCollector::new(config.clone())
    }

    fn oracle<'t>(&self, token: &'t Token) -> Option<&'t str> {
        token.gold_tag.as_deref()
    }

    fn clear_oracle(&self, token: &mut Token) -> Option<String> {
        token.gold_tag.take()
    }

    fn restore_oracle(&self, token: &mut Token, label: String) {
        token.gold_tag = Some(label);
    }

    fn set_label(&self, token: &mut Token, label: &str) {
        token.predicted_tag = Some(label.to_string());
    }

    fn label<'t>(&self, token: &'t Token) -> Option<&'t str> {
        token.predicted_tag.as_deref()
    }

    fn extract_features(&self, state: &TaggingState<'_, Self>) -> FeatureVector {
        extract_pos_features(state)
    }
}
