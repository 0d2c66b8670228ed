//! Result Assembler
//!
//! Joins the model's probability vector with the class taxonomy.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::constants::NUM_CLASSES;
use super::taxonomy::{ClassCode, MedicalReference, CLASS_CODES};

/// Per-class probabilities, serialized as `{ "<code>": p, ... }` in taxonomy order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities([f32; NUM_CLASSES]);

impl ClassProbabilities {
    pub fn get(&self, code: ClassCode) -> f32 {
        self.0[code.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassCode, f32)> + '_ {
        CLASS_CODES.iter().copied().zip(self.0.iter().copied())
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUM_CLASSES))?;
        for (code, p) in self.iter() {
            map.serialize_entry(code.as_str(), &p)?;
        }
        map.end()
    }
}

/// Prediction payload returned to the client
#[derive(Debug, Clone, serde::Serialize)]
pub struct PredictionResult {
    pub predicted_label: ClassCode,
    pub predicted_disease: &'static str,
    pub confidence: f32,
    pub confidence_percent: f64,
    pub explanation: String,
    pub disease_info: &'static MedicalReference,
    pub all_predictions: ClassProbabilities,
}

/// Index of the highest probability; ties go to the lowest index
pub fn argmax(probabilities: &[f32; NUM_CLASSES]) -> usize {
    let mut best = 0;
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        if p > probabilities[best] {
            best = i;
        }
    }
    best
}

/// Percent with two decimals
fn to_percent(confidence: f32) -> f64 {
    (f64::from(confidence) * 100.0 * 100.0).round() / 100.0
}

pub fn build(probabilities: &[f32; NUM_CLASSES]) -> PredictionResult {
    let code = CLASS_CODES[argmax(probabilities)];
    let confidence = probabilities[code.index()];

    if !(0.0..=1.0).contains(&confidence) {
        tracing::warn!(confidence, "Model output is not a probability; check the output layer");
    }

    let predicted_disease = code.display_name();
    let explanation = format!(
        "The model predicts {} with {:.2}% confidence.",
        predicted_disease,
        f64::from(confidence) * 100.0
    );

    tracing::info!(label = %code, disease = predicted_disease, confidence, "Prediction assembled");

    PredictionResult {
        predicted_label: code,
        predicted_disease,
        confidence,
        confidence_percent: to_percent(confidence),
        explanation,
        disease_info: code.reference(),
        all_predictions: ClassProbabilities(*probabilities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(index: usize, p: f32) -> [f32; NUM_CLASSES] {
        let rest = (1.0 - p) / (NUM_CLASSES as f32 - 1.0);
        let mut probs = [rest; NUM_CLASSES];
        probs[index] = p;
        probs
    }

    #[test]
    fn test_build_picks_max() {
        let result = build(&one_hot(1, 0.91));

        assert_eq!(result.predicted_label, ClassCode::Mel);
        assert_eq!(result.predicted_disease, "Melanoma");
        assert_eq!(result.confidence, 0.91);
        assert_eq!(result.confidence_percent, 91.0);
        assert_eq!(result.disease_info, ClassCode::Mel.reference());
        assert_eq!(result.explanation, "The model predicts Melanoma with 91.00% confidence.");
    }

    #[test]
    fn test_tie_breaks_to_lowest_index() {
        let mut probs = [0.0; NUM_CLASSES];
        probs[3] = 0.4;
        probs[7] = 0.4;
        probs[9] = 0.2;

        assert_eq!(argmax(&probs), 3);
        assert_eq!(build(&probs).predicted_label, ClassCode::Bcc);
    }

    #[test]
    fn test_all_equal_picks_first() {
        let probs = [0.1; NUM_CLASSES];
        assert_eq!(build(&probs).predicted_label, ClassCode::Ecz);
    }

    #[test]
    fn test_confidence_matches_all_predictions() {
        let result = build(&one_hot(8, 0.55));
        assert_eq!(result.confidence, result.all_predictions.get(result.predicted_label));
        assert!((result.all_predictions.sum() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(to_percent(0.123456), 12.35);
        assert_eq!(to_percent(1.0), 100.0);
        assert_eq!(to_percent(0.0), 0.0);
    }

    #[test]
    fn test_serialized_shape() {
        let result = build(&one_hot(4, 0.7));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["predicted_label"], "NV");
        assert_eq!(json["predicted_disease"], "Melanocytic Nevi (NV)");
        assert!(json["disease_info"]["medicines"]["child"].is_string());
        assert!(json["disease_info"]["plan"].is_string());

        let all = json["all_predictions"].as_object().unwrap();
        assert_eq!(all.len(), NUM_CLASSES);
        let keys: Vec<&str> = all.keys().map(String::as_str).collect();
        assert!(keys.contains(&"WMV"));
        assert_eq!(json["confidence"], all["NV"]);
    }
}
