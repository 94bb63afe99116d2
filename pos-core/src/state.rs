//! # Estado de Etiquetagem (máquina de estados da esquerda para a direita)
//!
//! O [`TaggingState`] registra até onde uma sentença já recebeu decisões de etiquetagem.
//!
//! ## Estados e transição
//!
//! ```text
//! ACTIVE(0) --advance--> ACTIVE(1) --advance--> ... --advance--> TERMINAL (index == len)
//! ```
//!
//! Existe uma única transição (`advance`): exatamente uma decisão por token, sem
//! retrocesso. Isso torna bem definida a janela de features: tokens à esquerda já têm
//! tag predita, tokens à direita ainda não.
//!
//! ## Visão gold
//!
//! Nos modos que consomem referência (TRAIN, BOOTSTRAP, EVALUATE) as tags gold são
//! **retiradas** dos tokens na criação do estado e guardadas na visão gold, de modo que
//! o extrator de features não consiga espiar a resposta. Ao descartar o estado, as tags
//! gold voltam para os tokens.

use crate::config::CollectorConfig;
use crate::error::{Result, TaggerError};
use crate::features::FeatureVector;
use crate::lexicon::CorpusCollector;
use crate::sentence::{Sentence, Token};

/// Capacidades que uma tarefa de etiquetagem (POS, NER, ...) fornece ao controlador genérico.
pub trait TaggingTask {
    /// Léxicos finalizados consumidos pelo extrator.
    type Lexicons: Clone + Send + Sync;
    /// Coletor de estatísticas que produz [`Self::Lexicons`].
    type Collector: CorpusCollector<Lexicons = Self::Lexicons> + Send;

    fn collector(&self, config: &CollectorConfig) -> Self::Collector;

    /// Lê o rótulo de referência desta tarefa.
    fn oracle<'t>(&self, token: &'t Token) -> Option<&'t str>;

    /// Retira do token o rótulo de referência desta tarefa.
    fn clear_oracle(&self, token: &mut Token) -> Option<String>;

    /// Devolve ao token o rótulo retirado por [`TaggingTask::clear_oracle`].
    fn restore_oracle(&self, token: &mut Token, label: String);

    /// Grava o rótulo predito no token.
    fn set_label(&self, token: &mut Token, label: &str);

    /// Lê o rótulo predito do token.
    fn label<'t>(&self, token: &'t Token) -> Option<&'t str>;

    /// Vetor de features do token corrente. Deve ser uma função pura do estado.
    fn extract_features(&self, state: &TaggingState<'_, Self>) -> FeatureVector
    where
        Self: Sized;
}

/// Progresso de etiquetagem de uma sentença.
pub struct TaggingState<'a, T: TaggingTask> {
    sentence: &'a mut Sentence,
    task: &'a T,
    lexicons: &'a T::Lexicons,
    gold: Option<Vec<String>>,
    index: usize,
}

impl<'a, T: TaggingTask> TaggingState<'a, T> {
    /// Estado para DECODE: sem visão gold.
    pub fn for_decode(sentence: &'a mut Sentence, task: &'a T, lexicons: &'a T::Lexicons) -> Self {
        for token in sentence.tokens_mut() {
            token.predicted_tag = None;
        }
        Self {
            sentence,
            task,
            lexicons,
            gold: None,
            index: 0,
        }
    }

    /// Estado para modos supervisionados: retira as tags gold dos tokens.
    ///
    /// Falha com [`TaggerError::MissingGoldAnnotation`] (sem alterar a sentença) se
    /// algum token não estiver anotado.
    pub fn with_gold(sentence: &'a mut Sentence, task: &'a T, lexicons: &'a T::Lexicons) -> Result<Self> {
        if let Some(token) = sentence.tokens().iter().find(|t| task.oracle(t).is_none()) {
            return Err(TaggerError::MissingGoldAnnotation { index: token.index });
        }

        let mut gold = Vec::with_capacity(sentence.len());
        for token in sentence.tokens_mut() {
            token.predicted_tag = None;
            // conferido acima
            gold.push(task.clear_oracle(token).unwrap_or_default());
        }
        Ok(Self {
            sentence,
            task,
            lexicons,
            gold: Some(gold),
            index: 0,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.index == self.sentence.len()
    }

    /// Índice do token corrente (igual a `len()` no estado terminal).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.sentence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentence.is_empty()
    }

    pub fn lexicons(&self) -> &T::Lexicons {
        self.lexicons
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.sentence.tokens().get(self.index)
    }

    /// Token na posição relativa `offset` ao corrente (ex: `-1` é o anterior).
    pub fn token(&self, offset: isize) -> Option<&Token> {
        let i = self.index as isize + offset;
        if i < 0 {
            return None;
        }
        self.sentence.tokens().get(i as usize)
    }

    /// Rótulo predito na posição relativa `offset`, apenas para tokens já decididos.
    pub fn predicted_label(&self, offset: isize) -> Option<&str> {
        if offset >= 0 {
            return None;
        }
        self.token(offset).and_then(|t| self.task.label(t))
    }

    /// Rótulo de referência do token corrente.
    pub fn oracle_label(&self) -> Result<&str> {
        let gold = self.gold.as_ref().ok_or(TaggerError::MissingGoldAnnotation { index: self.index })?;
        gold.get(self.index)
            .map(String::as_str)
            .ok_or(TaggerError::InvalidTransition {
                operation: "oracle_label",
                length: self.len(),
            })
    }

    pub fn gold_labels(&self) -> Option<&[String]> {
        self.gold.as_deref()
    }

    /// Rótulos preditos de toda a sentença (`None` onde ainda não houve decisão).
    pub fn predicted_labels(&self) -> Vec<Option<&str>> {
        self.sentence.tokens().iter().map(|t| self.task.label(t)).collect()
    }

    /// Grava `label` como predição do token corrente.
    pub fn assign_label(&mut self, label: &str) -> Result<()> {
        let length = self.len();
        let token = self
            .sentence
            .tokens_mut()
            .get_mut(self.index)
            .ok_or(TaggerError::InvalidTransition {
                operation: "assign_label",
                length,
            })?;
        self.task.set_label(token, label);
        Ok(())
    }

    /// Passa para o próximo token (ou para o estado terminal).
    pub fn advance(&mut self) -> Result<()> {
        if self.is_terminal() {
            return Err(TaggerError::InvalidTransition {
                operation: "advance",
                length: self.len(),
            });
        }
        self.index += 1;
        Ok(())
    }

    pub fn extract_features(&self) -> FeatureVector {
        self.task.extract_features(self)
    }
}

impl<T: TaggingTask> Drop for TaggingState<'_, T> {
    fn drop(&mut self) {
        if let Some(gold) = self.gold.take() {
            for (token, label) in self.sentence.tokens_mut().iter_mut().zip(gold) {
                self.task.restore_oracle(token, label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicons;
    use crate::pos::PosTask;

    fn annotated() -> Sentence {
        Sentence::from_tagged(&[("The", "DT"), ("dog", "NN"), ("barks", "VBZ")])
    }

    #[test]
    fn test_walk_to_terminal() {
        let mut sentence = annotated();
        let lexicons = Lexicons::default();
        let task = PosTask;
        let mut state = TaggingState::for_decode(&mut sentence, &task, &lexicons);

        let mut advances = 0;
        while !state.is_terminal() {
            state.assign_label("X").unwrap();
            state.advance().unwrap();
            advances += 1;
        }
        assert_eq!(advances, 3);
        assert_eq!(state.index(), 3);
        assert!(state.current_token().is_none());
    }

    #[test]
    fn test_terminal_state_rejects_transitions() {
        let mut sentence = Sentence::from_tagged(&[("ok", "UH")]);
        let lexicons = Lexicons::default();
        let task = PosTask;
        let mut state = TaggingState::with_gold(&mut sentence, &task, &lexicons).unwrap();
        assert_eq!(state.oracle_label().unwrap(), "UH");
        state.advance().unwrap();

        assert!(matches!(
            state.advance(),
            Err(TaggerError::InvalidTransition { operation: "advance", .. })
        ));
        assert!(matches!(
            state.assign_label("NN"),
            Err(TaggerError::InvalidTransition { operation: "assign_label", .. })
        ));
        assert!(matches!(
            state.oracle_label(),
            Err(TaggerError::InvalidTransition { operation: "oracle_label", length: 1 })
        ));
    }

    #[test]
    fn test_empty_sentence_is_terminal() {
        let mut sentence = Sentence::default();
        let lexicons = Lexicons::default();
        let task = PosTask;
        let state = TaggingState::for_decode(&mut sentence, &task, &lexicons);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_oracle_requires_gold_view() {
        let mut sentence = annotated();
        let lexicons = Lexicons::default();
        let task = PosTask;
        let state = TaggingState::for_decode(&mut sentence, &task, &lexicons);
        assert!(matches!(
            state.oracle_label(),
            Err(TaggerError::MissingGoldAnnotation { index: 0 })
        ));
    }

    #[test]
    fn test_gold_is_hidden_and_restored() {
        let mut sentence = annotated();
        let lexicons = Lexicons::default();
        let task = PosTask;
        {
            let mut state = TaggingState::with_gold(&mut sentence, &task, &lexicons).unwrap();
            assert_eq!(state.oracle_label().unwrap(), "DT");
            assert!(state.current_token().unwrap().gold_tag.is_none());
            state.assign_label("DT").unwrap();
            state.advance().unwrap();
            assert_eq!(state.oracle_label().unwrap(), "NN");
            assert_eq!(state.predicted_label(-1), Some("DT"));
            assert_eq!(state.predicted_label(0), None);
        }
        assert_eq!(sentence.gold_tags(), Some(vec!["DT", "NN", "VBZ"]));
        assert_eq!(sentence.predicted_tags(), vec![Some("DT"), None, None]);
    }

    #[test]
    fn test_missing_gold_leaves_sentence_untouched() {
        let mut sentence = annotated();
        sentence.tokens_mut()[1].gold_tag = None;
        let before = sentence.clone();
        let lexicons = Lexicons::default();
        let task = PosTask;

        let result = TaggingState::with_gold(&mut sentence, &task, &lexicons);
        assert!(matches!(result, Err(TaggerError::MissingGoldAnnotation { index: 1 })));
        drop(result);
        assert_eq!(sentence, before);
    }

    #[test]
    fn test_window_offsets() {
        let mut sentence = annotated();
        let lexicons = Lexicons::default();
        let task = PosTask;
        let mut state = TaggingState::for_decode(&mut sentence, &task, &lexicons);
        assert!(state.token(-1).is_none());
        state.advance().unwrap();
        assert_eq!(state.token(-1).unwrap().form, "The");
        assert_eq!(state.token(1).unwrap().form, "barks");
        assert!(state.token(2).is_none());
    }
}
