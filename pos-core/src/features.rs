//! # Engenharia de Features para POS
//!
//! Para o token corrente de um [`TaggingState`], extrai um vetor esparso de features
//! nomeadas. A extração é uma função pura: não altera o estado nem faz I/O.
//!
//! ## Features Implementadas
//!
//! ### Formas (janela de -2 a +2)
//! - Forma minúscula-simplificada quando pertence ao léxico de formas retidas
//! - Marcador `unk` quando a forma é desconhecida
//!
//! ### Classes de ambiguidade (tokens ainda não decididos: 0, +1, +2)
//! - Ex: `amb0=NN_VB` para "dog"
//!
//! ### Tags preditas (tokens já decididos: -1, -2)
//! - `pos-1`, `pos-2`, o bigrama `pos-2_pos-1` e a junção `pos-1_amb+1`
//!
//! ### Ortografia e afixos
//! - Prefixos/sufixos de até 3 caracteres (apenas para formas desconhecidas)
//! - Contém dígito, hífen, ponto; capitalização; início/fim de sentença

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicons;
use crate::sentence::Token;
use crate::state::{TaggingState, TaggingTask};

/// Estrutura para representar as características de um token.
///
/// Utilizamos um mapa esparso (`HashMap<String, f64>`) porque o espaço de features é
/// potencialmente infinito (ex: "f0=dog", "suf3=ing"), mas cada token ativa apenas um
/// pequeno subconjunto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// O mapa de features ativas. Ex: `{"bias": 1.0, "f0=dog": 1.0}`.
    pub features: HashMap<String, f64>,
    /// Índice do token de origem na sentença.
    pub token_index: usize,
}

impl FeatureVector {
    pub fn new(token_index: usize) -> Self {
        Self {
            features: HashMap::new(),
            token_index,
        }
    }

    /// Adiciona uma feature ao vetor com valor 1.0 (binária) ou customizado.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.features.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.features.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Calcula o produto escalar (dot product) com um vetor de pesos.
    ///
    /// $$ \text{score} = \sum (w_i \cdot f_i) $$
    pub fn dot(&self, weights: &HashMap<String, f64>) -> f64 {
        self.features
            .iter()
            .map(|(k, v)| v * weights.get(k).unwrap_or(&0.0))
            .sum()
    }

    /// As `n` features de maior valor, em ordem estável (valor desc., nome asc.).
    pub fn top(&self, n: usize) -> Vec<(String, f64)> {
        let mut sorted: Vec<(String, f64)> = self.features.iter().map(|(k, v)| (k.clone(), *v)).collect();
        sorted.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        sorted.truncate(n);
        sorted
    }
}

/// Marcador de forma fora do léxico.
const UNKNOWN: &str = "unk";
/// Tamanho máximo dos afixos extraídos.
const MAX_AFFIX: usize = 3;

/// Extrai as features POS do token corrente.
///
/// Chamado exatamente uma vez por token em cada passada, sempre em estado ACTIVE.
///
/// # Exemplo
/// Para "the dog barks", com "dog" retido e classe `NN_VB`, o vetor de "dog" contém:
/// - `f0=dog`, `f-1=the`, `f+1=barks` (se retidas)
/// - `amb0=NN_VB`
/// - `pos-1=DT` (tag predita de "the")
pub fn extract_pos_features<T>(state: &TaggingState<'_, T>) -> FeatureVector
where
    T: TaggingTask<Lexicons = Lexicons>,
{
    let index = state.index();
    let mut fv = FeatureVector::new(index);
    let Some(token) = state.current_token() else {
        return fv;
    };
    let lexicons = state.lexicons();

    fv.insert("bias", 1.0);

    // === Formas na janela ===
    for offset in -2isize..=2 {
        if let Some(t) = state.token(offset) {
            fv.insert(format!("f{}={}", offset_label(offset), known_form(t, lexicons)), 1.0);
        }
    }
    if let (Some(prev), Some(next)) = (state.token(-1), state.token(1)) {
        fv.insert(
            format!("f-1_f+1={}_{}", known_form(prev, lexicons), known_form(next, lexicons)),
            1.0,
        );
    }

    // === Classes de ambiguidade dos tokens ainda não decididos ===
    for offset in 0isize..=2 {
        if let Some(class) = state.token(offset).and_then(|t| lexicons.ambiguity_class(&t.lower_simplified_form)) {
            fv.insert(format!("amb{}={class}", offset_label(offset)), 1.0);
        }
    }

    // === Tags já decididas ===
    let pos1 = state.predicted_label(-1);
    let pos2 = state.predicted_label(-2);
    if let Some(p1) = pos1 {
        fv.insert(format!("pos-1={p1}"), 1.0);
        let next_class = state
            .token(1)
            .and_then(|t| lexicons.ambiguity_class(&t.lower_simplified_form))
            .unwrap_or(UNKNOWN);
        fv.insert(format!("pos-1_amb+1={p1}_{next_class}"), 1.0);
    }
    if let Some(p2) = pos2 {
        fv.insert(format!("pos-2={p2}"), 1.0);
        if let Some(p1) = pos1 {
            fv.insert(format!("pos-2_pos-1={p2}_{p1}"), 1.0);
        }
    }

    // === Afixos para formas desconhecidas ===
    if !lexicons.contains_word_form(&token.lower_simplified_form) {
        let chars: Vec<char> = token.lower_simplified_form.chars().collect();
        for n in 1..=MAX_AFFIX.min(chars.len()) {
            let prefix: String = chars[..n].iter().collect();
            let suffix: String = chars[chars.len() - n..].iter().collect();
            fv.insert(format!("pre{n}={prefix}"), 1.0);
            fv.insert(format!("suf{n}={suffix}"), 1.0);
        }
    }

    // === Ortografia ===
    let form = token.form.as_str();
    if form.chars().any(|c| c.is_ascii_digit()) {
        fv.insert("has_digit", 1.0);
    }
    if form.contains('-') {
        fv.insert("has_hyphen", 1.0);
    }
    if form.contains('.') {
        fv.insert("has_period", 1.0);
    }
    if form.chars().next().is_some_and(char::is_uppercase) {
        fv.insert(if index == 0 { "upper_first_bos" } else { "upper_first" }, 1.0);
    }
    if form.chars().count() > 1 && form.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()) && form.chars().any(char::is_alphabetic) {
        fv.insert("all_upper", 1.0);
    }
    if index == 0 {
        fv.insert("BOS", 1.0);
    }
    if index + 1 == state.len() {
        fv.insert("EOS", 1.0);
    }

    fv
}

fn offset_label(offset: isize) -> String {
    if offset > 0 {
        format!("+{offset}")
    } else {
        offset.to_string()
    }
}

fn known_form<'t>(token: &'t Token, lexicons: &Lexicons) -> &'t str {
    if lexicons.contains_word_form(&token.lower_simplified_form) {
        &token.lower_simplified_form
    } else {
        UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;
    use crate::lexicon::{CorpusCollector, LexiconCollector};
    use crate::pos::PosTask;
    use crate::sentence::Sentence;

    fn lexicons() -> Lexicons {
        let mut collector = LexiconCollector::new(CollectorConfig::default());
        collector.collect(&Sentence::from_tagged(&[("the", "DT"), ("dog", "NN"), ("barks", "VBZ")]));
        collector.collect(&Sentence::from_tagged(&[("dog", "VB")]));
        collector.finalize()
    }

    #[test]
    fn test_window_and_ambiguity_features() {
        let lexicons = lexicons();
        let task = PosTask;
        let mut sentence = Sentence::from_forms(&["The", "dog", "barks"]);
        let mut state = TaggingState::for_decode(&mut sentence, &task, &lexicons);
        state.assign_label("DT").unwrap();
        state.advance().unwrap();

        let fv = state.extract_features();
        assert_eq!(fv.token_index, 1);
        assert!(fv.contains("f0=dog"));
        assert!(fv.contains("f-1=the"));
        assert!(fv.contains("f+1=barks"));
        assert!(fv.contains("amb0=NN_VB"));
        assert!(fv.contains("amb+1=VBZ"));
        assert!(fv.contains("pos-1=DT"));
        assert!(fv.contains("pos-1_amb+1=DT_VBZ"));
        assert!(!fv.contains("pos-2=DT"));
    }

    #[test]
    fn test_unknown_word_affixes() {
        let lexicons = lexicons();
        let task = PosTask;
        let mut sentence = Sentence::from_forms(&["Running"]);
        let state = TaggingState::for_decode(&mut sentence, &task, &lexicons);

        let fv = state.extract_features();
        assert!(fv.contains("f0=unk"));
        assert!(fv.contains("suf3=ing"));
        assert!(fv.contains("pre2=ru"));
        assert!(fv.contains("upper_first_bos"));
        assert!(fv.contains("BOS"));
        assert!(fv.contains("EOS"));
        assert!(!fv.features.keys().any(|k| k.starts_with("amb0")));
    }

    #[test]
    fn test_orthographic_features() {
        let lexicons = Lexicons::default();
        let task = PosTask;
        let mut sentence = Sentence::from_forms(&["x", "U.S.-based", "3rd"]);
        let mut state = TaggingState::for_decode(&mut sentence, &task, &lexicons);
        state.advance().unwrap();
        let fv = state.extract_features();
        assert!(fv.contains("has_hyphen"));
        assert!(fv.contains("has_period"));
        assert!(fv.contains("upper_first"));
        assert!(!fv.contains("all_upper"));

        state.advance().unwrap();
        assert!(state.extract_features().contains("has_digit"));
    }

    #[test]
    fn test_extraction_is_pure() {
        let lexicons = lexicons();
        let task = PosTask;
        let mut sentence = Sentence::from_forms(&["the", "dog"]);
        let state = TaggingState::for_decode(&mut sentence, &task, &lexicons);
        assert_eq!(state.extract_features(), state.extract_features());
    }

    #[test]
    fn test_top_features_are_stable() {
        let mut fv = FeatureVector::new(0);
        fv.insert("b", 1.0);
        fv.insert("a", 1.0);
        fv.insert("c", 2.0);
        let top: Vec<String> = fv.top(2).into_iter().map(|(k, _)| k).collect();
        assert_eq!(top, vec!["c", "a"]);
    }
}
