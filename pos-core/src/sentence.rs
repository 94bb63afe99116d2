//! # Sentenças e Tokens
//!
//! Representação mínima de uma sentença para o etiquetador: cada [`Token`] carrega
//! a forma original, as formas normalizadas usadas pelos léxicos, a tag de referência
//! (gold, opcional) e o slot mutável da tag predita.
//!
//! ## Formas da palavra
//!
//! | Campo                   | Exemplo (`"Dose1mg!!!!"`) | Uso                           |
//! |-------------------------|---------------------------|-------------------------------|
//! | `form`                  | `Dose1mg!!!!`             | Texto cru                     |
//! | `simplified_form`       | `Dose0mg!!`               | Features de forma             |
//! | `lower_simplified_form` | `dose0mg!!`               | Chave dos léxicos             |

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Marcador que substitui URLs e e-mails na forma simplificada.
pub const URL_PLACEHOLDER: &str = "#url#";

/// Um token de uma sentença anotada (ou a anotar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Posição do token na sentença (0, 1, 2...).
    pub index: usize,
    /// Forma original (ex: "Dogs").
    pub form: String,
    /// Forma normalizada: números viram `0`, URLs viram `#url#`.
    pub simplified_form: String,
    /// Forma normalizada em minúsculas, usada como chave dos léxicos.
    pub lower_simplified_form: String,
    /// Tag de referência, ausente em textos não anotados.
    pub gold_tag: Option<String>,
    /// Tag atribuída pelo etiquetador.
    pub predicted_tag: Option<String>,
}

impl Token {
    pub fn new(index: usize, form: impl Into<String>) -> Self {
        let form = form.into();
        let simplified_form = simplify_word_form(&form);
        let lower_simplified_form = simplified_form.to_lowercase();
        Self {
            index,
            form,
            simplified_form,
            lower_simplified_form,
            gold_tag: None,
            predicted_tag: None,
        }
    }

    /// Cria um token já anotado com a tag de referência.
    pub fn with_gold(index: usize, form: impl Into<String>, tag: impl Into<String>) -> Self {
        let mut token = Self::new(index, form);
        token.gold_tag = Some(tag.into());
        token
    }
}

/// Uma sentença: sequência ordenada de tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    /// Constrói a sentença re-indexando os tokens na ordem recebida.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        for (i, token) in tokens.iter_mut().enumerate() {
            token.index = i;
        }
        Self { tokens }
    }

    /// Sentença sem anotação (modo DECODE).
    pub fn from_forms<S: AsRef<str>>(forms: &[S]) -> Self {
        Self::new(
            forms
                .iter()
                .enumerate()
                .map(|(i, f)| Token::new(i, f.as_ref()))
                .collect(),
        )
    }

    /// Sentença anotada a partir de pares `(forma, tag)`.
    pub fn from_tagged(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .enumerate()
                .map(|(i, (form, tag))| Token::with_gold(i, *form, *tag))
                .collect(),
        )
    }

    /// Interpreta uma linha no formato `palavra/TAG palavra/TAG ...`.
    ///
    /// A tag é separada no **último** separador, então `1/2/CD` vira forma `1/2`, tag `CD`.
    /// Um token sem separador (ou com forma/tag vazias) faz a função devolver `Err` com o índice dele.
    pub fn parse_tagged(line: &str, separator: char) -> Result<Self, usize> {
        let mut tokens = Vec::new();
        for (i, item) in line.split_whitespace().enumerate() {
            match item.rsplit_once(separator) {
                Some((form, tag)) if !form.is_empty() && !tag.is_empty() => {
                    tokens.push(Token::with_gold(i, form, tag));
                }
                _ => return Err(i),
            }
        }
        Ok(Self::new(tokens))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn forms(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.form.as_str()).collect()
    }

    /// `true` se todos os tokens possuem tag de referência.
    ///
    /// Uma sentença vazia é considerada anotada.
    pub fn has_gold(&self) -> bool {
        self.tokens.iter().all(|t| t.gold_tag.is_some())
    }

    /// Sequência de tags de referência, ou `None` se algum token não tiver.
    pub fn gold_tags(&self) -> Option<Vec<&str>> {
        self.tokens.iter().map(|t| t.gold_tag.as_deref()).collect()
    }

    pub fn predicted_tags(&self) -> Vec<Option<&str>> {
        self.tokens.iter().map(|t| t.predicted_tag.as_deref()).collect()
    }

    pub fn clear_predictions(&mut self) {
        for token in &mut self.tokens {
            token.predicted_tag = None;
        }
    }
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?:https?|ftp)://\S+|www\.\S+|[\w.+-]+@[\w-]+\.[\w.-]+)$")
            .expect("valid url regex")
    })
}

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"\d+(?:[.,/]\d+)*").expect("valid number regex"))
}

/// Normaliza uma forma de palavra para reduzir esparsidade dos léxicos.
///
/// 1. URLs e e-mails viram [`URL_PLACEHOLDER`].
/// 2. Sequências numéricas (`12`, `1,000.5`, `3/4`) colapsam para `0`.
/// 3. Repetições de 3+ sinais de pontuação iguais colapsam para dois (`!!!!` → `!!`).
///
/// # Exemplo
/// ```rust
/// use pos_core::sentence::simplify_word_form;
///
/// assert_eq!(simplify_word_form("1,000.50"), "0");
/// assert_eq!(simplify_word_form("1mg"), "0mg");
/// assert_eq!(simplify_word_form("www.example.com"), "#url#");
/// ```
pub fn simplify_word_form(form: &str) -> String {
    if url_regex().is_match(form) {
        return URL_PLACEHOLDER.to_string();
    }
    let numbers = number_regex().replace_all(form, "0");
    collapse_punctuation(&numbers)
}

fn collapse_punctuation(form: &str) -> String {
    let mut out = String::with_capacity(form.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for c in form.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run > 2 && !c.is_alphanumeric() && !c.is_whitespace() {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify_numbers() {
        assert_eq!(simplify_word_form("2023"), "0");
        assert_eq!(simplify_word_form("1,000.5"), "0");
        assert_eq!(simplify_word_form("3/4"), "0");
        assert_eq!(simplify_word_form("B-52"), "B-0");
    }

    #[test]
    fn test_simplify_urls_and_punctuation() {
        assert_eq!(simplify_word_form("https://clear.nlp/x"), URL_PLACEHOLDER);
        assert_eq!(simplify_word_form("ana@example.com"), URL_PLACEHOLDER);
        assert_eq!(simplify_word_form("!!!!"), "!!");
        assert_eq!(simplify_word_form("..."), "..");
        assert_eq!(simplify_word_form("coffee"), "coffee");
    }

    #[test]
    fn test_token_forms() {
        let token = Token::new(0, "Dogs");
        assert_eq!(token.simplified_form, "Dogs");
        assert_eq!(token.lower_simplified_form, "dogs");
        assert!(token.gold_tag.is_none());
    }

    #[test]
    fn test_parse_tagged_line() {
        let sentence = Sentence::parse_tagged("The/DT 1/2/CD dogs/NNS", '/').unwrap();
        assert_eq!(sentence.forms(), vec!["The", "1/2", "dogs"]);
        assert_eq!(sentence.gold_tags(), Some(vec!["DT", "CD", "NNS"]));
        assert_eq!(sentence.tokens()[2].index, 2);

        assert_eq!(Sentence::parse_tagged("The/DT dogs", '/'), Err(1));
        assert_eq!(Sentence::parse_tagged("/DT", '/'), Err(0));
    }

    #[test]
    fn test_gold_and_predictions() {
        let mut sentence = Sentence::from_forms(&["a", "b"]);
        assert!(!sentence.has_gold());
        assert!(sentence.gold_tags().is_none());

        sentence.tokens_mut()[0].predicted_tag = Some("DT".into());
        assert_eq!(sentence.predicted_tags(), vec![Some("DT"), None]);
        sentence.clear_predictions();
        assert_eq!(sentence.predicted_tags(), vec![None, None]);
    }
}
