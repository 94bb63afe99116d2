//! # Averaged Perceptron para POS
//!
//! Classificador de referência que implementa [`Classifier`]. As instâncias entregues
//! pelo controlador ficam num buffer; [`PerceptronModel::fit`] treina sobre elas.
//! Utiliza "Lazy Averaging" para evitar custo O(N*T) na atualização dos pesos médios.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::features::FeatureVector;
use crate::model::{Classifier, Prediction, TrainingInstance};

/// Pesos indexados por feature e depois por rótulo: `feature -> (label -> weight)`.
type Weights = HashMap<String, HashMap<String, f64>>;

/// Modelo Perceptron Médio (Averaged Perceptron).
///
/// O Perceptron é um algoritmo de aprendizado **online** e **mistake-driven**:
/// só atualiza os pesos quando erra a predição de uma instância.
///
/// # Averaged Perceptron
/// A versão padrão oscila muito. O modelo final usa a **média** dos pesos de todos os
/// passos, o que reduz overfitting e estabiliza o aprendizado.
///
/// # Lazy Averaging
/// A média de uma feature só é atualizada quando ela é ativa; o acumulado do
/// intervalo parado é somado de uma vez (`passos_parados * peso_atual`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerceptronModel {
    /// Pesos médios usados na predição (após `fit`), ou pesos atuais durante o treino.
    weights: Weights,
    /// Rótulos conhecidos, em ordem lexicográfica (desempate determinístico).
    labels: BTreeSet<String>,
    /// Instâncias acumuladas por `add_instances`.
    #[serde(skip)]
    instances: Vec<TrainingInstance>,
}

/// Estado auxiliar de um treino: pesos atuais, acumulados e carimbo de tempo.
#[derive(Default)]
struct Averager {
    current: HashMap<(String, String), f64>,
    totals: HashMap<(String, String), f64>,
    last_update: HashMap<(String, String), usize>,
    steps: usize,
}

impl Averager {
    fn score(&self, fv: &FeatureVector, label: &str) -> f64 {
        fv.features
            .iter()
            .map(|(fname, fval)| {
                self.current
                    .get(&(fname.clone(), label.to_string()))
                    .map_or(0.0, |w| w * fval)
            })
            .sum()
    }

    /// $w_{correto} \leftarrow w_{correto} + \phi(x)$, $w_{errado} \leftarrow w_{errado} - \phi(x)$
    fn update(&mut self, fv: &FeatureVector, gold: &str, predicted: &str) {
        for (fname, fval) in &fv.features {
            self.update_feature(fname, gold, *fval);
            self.update_feature(fname, predicted, -*fval);
        }
    }

    fn update_feature(&mut self, fname: &str, label: &str, delta: f64) {
        let key = (fname.to_string(), label.to_string());
        let current_w = *self.current.get(&key).unwrap_or(&0.0);
        let last_step = *self.last_update.get(&key).unwrap_or(&0);
        let idle = (self.steps - last_step) as f64;

        *self.totals.entry(key.clone()).or_insert(0.0) += idle * current_w;
        self.last_update.insert(key.clone(), self.steps);
        *self.current.entry(key).or_insert(0.0) += delta;
    }

    /// Fecha o acumulado até o último passo e devolve as médias $\sum w_t / T$.
    fn averaged(mut self) -> Weights {
        let keys: Vec<(String, String)> = self.current.keys().cloned().collect();
        for key in keys {
            let current_w = self.current[&key];
            let last_step = *self.last_update.get(&key).unwrap_or(&0);
            let idle = (self.steps - last_step) as f64;
            *self.totals.entry(key).or_insert(0.0) += idle * current_w;
        }

        let mut weights = Weights::new();
        let steps = self.steps.max(1) as f64;
        for ((fname, label), total) in self.totals {
            let avg = total / steps;
            if avg != 0.0 {
                weights.entry(fname).or_default().insert(label, avg);
            }
        }
        weights
    }
}

impl PerceptronModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de instâncias no buffer de treino.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn is_trained(&self) -> bool {
        !self.weights.is_empty()
    }

    /// Descarta o buffer de instâncias (os pesos são mantidos).
    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }

    /// Treina do zero sobre todas as instâncias do buffer (Online Learning).
    ///
    /// Para cada época e cada instância, na ordem de chegada:
    /// 1. Prediz com os pesos atuais.
    /// 2. Se errar, promove o rótulo correto e penaliza o predito.
    ///
    /// Ao final os pesos médios substituem os atuais.
    pub fn fit(&mut self, iterations: usize) {
        let mut averager = Averager::default();

        for epoch in 0..iterations {
            let mut correct = 0usize;
            for instance in &self.instances {
                let predicted = self.best_label(|label| averager.score(&instance.vector, label));
                if predicted.as_deref() != Some(instance.label.as_str()) {
                    let predicted = predicted.unwrap_or_default();
                    averager.update(&instance.vector, &instance.label, &predicted);
                } else {
                    correct += 1;
                }
                averager.steps += 1;
            }
            debug!(epoch, correct, total = self.instances.len(), "perceptron epoch");
        }

        self.weights = averager.averaged();
        info!(
            instances = self.instances.len(),
            labels = self.labels.len(),
            features = self.weights.len(),
            iterations,
            "perceptron trained"
        );
    }

    /// Rótulo de maior score; empates ficam com o menor rótulo lexicográfico.
    fn best_label(&self, score: impl Fn(&str) -> f64) -> Option<String> {
        let mut best: Option<(&str, f64)> = None;
        for label in &self.labels {
            let s = score(label);
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((label, s));
            }
        }
        best.map(|(label, _)| label.to_string())
    }

    fn score(&self, fv: &FeatureVector, label: &str) -> f64 {
        fv.features
            .iter()
            .filter_map(|(fname, fval)| self.weights.get(fname).and_then(|w| w.get(label)).map(|w| w * fval))
            .sum()
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Classifier for PerceptronModel {
    fn add_instances(&mut self, instances: Vec<TrainingInstance>) {
        for instance in &instances {
            if !self.labels.contains(&instance.label) {
                self.labels.insert(instance.label.clone());
            }
        }
        self.instances.extend(instances);
    }

    fn predict_best(&self, vector: &FeatureVector) -> Prediction {
        let label = self.best_label(|label| self.score(vector, label)).unwrap_or_default();
        let score = self.score(vector, &label);
        Prediction { label, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(features: &[&str]) -> FeatureVector {
        let mut fv = FeatureVector::new(0);
        for f in features {
            fv.insert(*f, 1.0);
        }
        fv
    }

    #[test]
    fn test_perceptron_learns_separable_instances() {
        let mut model = PerceptronModel::new();
        model.add_instances(vec![
            TrainingInstance::new("DT", vector(&["bias", "f0=the"])),
            TrainingInstance::new("NN", vector(&["bias", "f0=dog", "pos-1=DT"])),
            TrainingInstance::new("VBZ", vector(&["bias", "f0=barks", "pos-1=NN"])),
        ]);
        model.fit(5);

        assert!(model.is_trained());
        assert_eq!(model.predict_best(&vector(&["bias", "f0=the"])).label, "DT");
        assert_eq!(model.predict_best(&vector(&["bias", "f0=dog", "pos-1=DT"])).label, "NN");
        assert_eq!(model.predict_best(&vector(&["bias", "f0=barks", "pos-1=NN"])).label, "VBZ");
    }

    #[test]
    fn test_untrained_model_breaks_ties_lexicographically() {
        let mut model = PerceptronModel::new();
        model.add_instances(vec![
            TrainingInstance::new("VB", vector(&["a"])),
            TrainingInstance::new("NN", vector(&["b"])),
        ]);
        let prediction = model.predict_best(&vector(&["zzz"]));
        assert_eq!(prediction.label, "NN");
        assert_eq!(prediction.score, 0.0);
    }

    #[test]
    fn test_empty_model_predicts_empty_label() {
        let model = PerceptronModel::new();
        assert_eq!(model.predict_best(&vector(&["x"])).label, "");
    }

    #[test]
    fn test_json_round_trip_keeps_weights() {
        let mut model = PerceptronModel::new();
        model.add_instances(vec![
            TrainingInstance::new("DT", vector(&["f0=the"])),
            TrainingInstance::new("NN", vector(&["f0=dog"])),
        ]);
        model.fit(3);

        let restored = PerceptronModel::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(restored.instance_count(), 0);
        assert_eq!(restored.predict_best(&vector(&["f0=dog"])).label, "NN");
        assert_eq!(restored.labels().collect::<Vec<_>>(), vec!["DT", "NN"]);
    }
}
