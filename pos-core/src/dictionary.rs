//! # Dicionário de Unidades
//!
//! Léxico auxiliar do tokenizador: separa sufixos de unidade de medida colados a um
//! número (`"1mg"` -> `"1"`, `"mg"`).

use std::collections::BTreeSet;
use std::io::BufRead;

use crate::error::Result;

/// Unidades embutidas (forma minúscula).
const DEFAULT_UNITS: &[&str] = &[
    "mg", "g", "kg", "mcg", "lb", "lbs", "oz", "mm", "cm", "m", "km", "ft", "mi", "ml", "dl", "l", "cc",
    "ms", "s", "sec", "min", "hr", "hrs", "kb", "mb", "gb", "tb", "hz", "khz", "mhz", "ghz", "mph", "kph",
    "kw", "mw", "v", "mv",
];

/// Conjunto de unidades, sempre em minúsculas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDictionary {
    units: BTreeSet<String>,
}

impl Default for UnitDictionary {
    fn default() -> Self {
        Self::new(DEFAULT_UNITS.iter().copied())
    }
}

impl UnitDictionary {
    pub fn new<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let units = units
            .into_iter()
            .map(|u| u.as_ref().trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect();
        Self { units }
    }

    /// Lê uma unidade por linha; linhas vazias são ignoradas.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let lines = reader.lines().collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::new(lines))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_unit(&self, lower: &str) -> bool {
        self.units.contains(lower)
    }

    /// Separa `original` em `(número, unidade)` quando `lower` termina numa unidade
    /// precedida por um dígito.
    ///
    /// A fronteira é contada em caracteres de `original`: `i = len - len(unidade)`, com
    /// `0 < i` e o caractere `i - 1` sendo dígito. O sufixo de `original` a partir de `i`
    /// precisa coincidir com a unidade sem distinção de caixa. Havendo mais de uma unidade
    /// possível, vence a mais longa (`"5mm"` separa `"mm"`, não `"m"`).
    ///
    /// ```
    /// use pos_core::dictionary::UnitDictionary;
    ///
    /// let units = UnitDictionary::new(["mg"]);
    /// assert_eq!(units.split("1mg", "1mg"), Some(("1".to_string(), "mg".to_string())));
    /// assert_eq!(units.split("mg", "mg"), None);
    /// ```
    pub fn split(&self, original: &str, lower: &str) -> Option<(String, String)> {
        let chars: Vec<char> = original.chars().collect();
        let len = chars.len();

        let boundary = self
            .units
            .iter()
            .filter(|unit| lower.ends_with(unit.as_str()))
            .filter_map(|unit| {
                let i = len.checked_sub(unit.chars().count())?;
                let suffix: String = chars[i..].iter().collect();
                (i > 0 && chars[i - 1].is_ascii_digit() && suffix.to_lowercase() == unit.as_str()).then_some(i)
            })
            .min()?;

        let byte = original.char_indices().nth(boundary).map(|(b, _)| b)?;
        Some((original[..byte].to_string(), original[byte..].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_unit_after_digit() {
        let units = UnitDictionary::new(["mg"]);
        assert_eq!(units.split("1mg", "1mg"), Some(("1".into(), "mg".into())));
    }

    #[test]
    fn test_no_split_without_unit() {
        let units = UnitDictionary::new(["kg"]);
        assert_eq!(units.split("1mg", "1mg"), None);
    }

    #[test]
    fn test_no_split_without_leading_digit() {
        let units = UnitDictionary::default();
        assert_eq!(units.split("mg", "mg"), None);
        assert_eq!(units.split("Amg", "amg"), None);
    }

    #[test]
    fn test_longest_unit_wins_and_case_is_kept() {
        let units = UnitDictionary::default();
        assert_eq!(units.split("5MM", "5mm"), Some(("5".into(), "MM".into())));
        assert_eq!(units.split("2.5kg", "2.5kg"), Some(("2.5".into(), "kg".into())));
    }

    #[test]
    fn test_split_when_lowercasing_changes_length() {
        let units = UnitDictionary::new(["mg"]);
        let original = "İ5mg";
        let lower = original.to_lowercase();
        assert_ne!(lower.chars().count(), original.chars().count());
        assert_eq!(units.split(original, &lower), Some(("İ5".into(), "mg".into())));
    }

    #[test]
    fn test_from_reader_normalizes_lines() {
        let units = UnitDictionary::from_reader(" MG \n\nKm\n".as_bytes()).unwrap();
        assert_eq!(units.len(), 2);
        assert!(units.is_unit("mg"));
        assert!(units.is_unit("km"));
    }
}
