// csc-eval Data Models
// Shared records for corrector output, per-sentence outcomes and aggregate metrics

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============ Corrector Output ============

/// One error reported by the correction model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Char index of the wrong fragment; `None` when the model did not report one.
    pub position: Option<usize>,
    pub original: String,
    pub corrected: String,
}

/// Raw answer of a corrector for a single sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionResult {
    pub original: String,
    pub corrected: String,
    pub has_error: bool,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

impl CorrectionResult {
    /// Build a result; `has_error` follows from whether any error was reported.
    pub fn new(
        original: impl Into<String>,
        corrected: impl Into<String>,
        errors: Vec<ErrorDetail>,
    ) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
            has_error: !errors.is_empty(),
            errors,
        }
    }
}

// ============ Sentence Outcome ============

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Model flagged the sentence (true positive).
    Detected,
    /// Model returned the sentence as correct (false negative).
    Missed,
    /// The model call failed; excluded from tp/fn.
    InferenceFailed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Detected => "detected",
            Self::Missed => "missed",
            Self::InferenceFailed => "inference_failed",
        };
        f.write_str(s)
    }
}

/// Evaluation record of one known-erroneous sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceOutcome {
    pub sentence: String,
    pub status: OutcomeStatus,
    #[serde(default)]
    pub corrected: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SentenceOutcome {
    pub fn from_correction(result: CorrectionResult) -> Self {
        let status = if result.has_error {
            OutcomeStatus::Detected
        } else {
            OutcomeStatus::Missed
        };
        Self {
            sentence: result.original,
            status,
            corrected: Some(result.corrected),
            errors: result.errors,
            failure: None,
        }
    }

    pub fn failed(sentence: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            sentence: sentence.into(),
            status: OutcomeStatus::InferenceFailed,
            corrected: None,
            errors: Vec::new(),
            failure: Some(failure.into()),
        }
    }

    /// Bare detection flag, without correction details.
    pub fn with_detection(sentence: impl Into<String>, detected: bool) -> Self {
        Self {
            sentence: sentence.into(),
            status: if detected {
                OutcomeStatus::Detected
            } else {
                OutcomeStatus::Missed
            },
            corrected: None,
            errors: Vec::new(),
            failure: None,
        }
    }

    pub fn detected(&self) -> bool {
        self.status == OutcomeStatus::Detected
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::InferenceFailed
    }
}

// ============ Aggregate Metrics ============

/// Conventions applied while computing metrics, surfaced so readers of a report
/// do not mistake a degenerate value for a measured one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricNote {
    /// Every sample is ground-truth positive and no false positives were supplied,
    /// so precision is 1.0 by construction.
    SingleClassPrecision,
    /// Nothing was detected and no false positives were supplied; precision
    /// (0/0) is reported as 0.0.
    ZeroDetectionPrecision,
    /// Sentences whose inference failed and were left out of tp/fn.
    ExcludedInferenceFailures { count: usize },
}

impl fmt::Display for MetricNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleClassPrecision => f.write_str(
                "precision is 1.0 by construction: all samples are erroneous sentences and no false positives were supplied",
            ),
            Self::ZeroDetectionPrecision => {
                f.write_str("no sentence was detected: precision (0/0) reported as 0.0 by convention")
            }
            Self::ExcludedInferenceFailures { count } => {
                write!(f, "{} sentence(s) excluded from tp/fn because inference failed", count)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_sentences: usize,
    pub evaluated_sentences: usize,
    pub excluded_sentences: usize,
    pub true_positive: usize,
    pub false_negative: usize,
    pub false_positive: usize,
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f0.5")]
    pub f05: f64,
    pub f1: f64,
    pub f2: f64,
    #[serde(default)]
    pub notes: Vec<MetricNote>,
}

impl AggregateMetrics {
    /// Look up a metric by its report key (`precision`, `recall`, `f0.5`, `f1`, `f2`).
    pub fn value(&self, key: &str) -> Option<f64> {
        match key.trim().to_lowercase().as_str() {
            "precision" => Some(self.precision),
            "recall" => Some(self.recall),
            "f0.5" | "f05" => Some(self.f05),
            "f1" => Some(self.f1),
            "f2" => Some(self.f2),
            _ => None,
        }
    }
}

// ============ Report ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedResult {
    pub index: usize,
    pub original: String,
    pub corrected: Option<String>,
    pub detected: bool,
    pub status: OutcomeStatus,
    pub errors: Vec<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub model_name: String,
    /// Config key of the model (e.g. `macbert_csc`), used for file naming.
    pub model_key: String,
    pub timestamp: String,
    pub metrics: AggregateMetrics,
    pub detailed_results: Vec<DetailedResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_result_has_error_follows_errors() {
        let clean = CorrectionResult::new("今天天气很好", "今天天气很好", vec![]);
        assert!(!clean.has_error);

        let fixed = CorrectionResult::new(
            "今天天汽很好",
            "今天天气很好",
            vec![ErrorDetail {
                position: Some(3),
                original: "汽".to_string(),
                corrected: "气".to_string(),
            }],
        );
        assert!(fixed.has_error);
        assert!(SentenceOutcome::from_correction(fixed).detected());
    }

    #[test]
    fn test_metrics_serialize_with_report_keys() {
        let metrics = AggregateMetrics {
            total_sentences: 1,
            evaluated_sentences: 1,
            excluded_sentences: 0,
            true_positive: 1,
            false_negative: 0,
            false_positive: 0,
            precision: 1.0,
            recall: 1.0,
            f05: 1.0,
            f1: 1.0,
            f2: 1.0,
            notes: vec![MetricNote::SingleClassPrecision],
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["f0.5"], 1.0);
        assert_eq!(json["notes"][0]["kind"], "single_class_precision");
        assert_eq!(metrics.value("F0.5"), Some(1.0));
        assert_eq!(metrics.value("accuracy"), None);
    }

    #[test]
    fn test_failed_outcome_is_not_detected() {
        let outcome = SentenceOutcome::failed("我门一起去公园", "timeout");
        assert!(outcome.is_failed());
        assert!(!outcome.detected());
        assert_eq!(outcome.status.to_string(), "inference_failed");
    }
}
