// Detection Metrics
// Every input sentence is a known-erroneous sentence (ground-truth positive):
// - model detected an error  -> true positive
// - model returned it as-is  -> false negative
// There are no negative samples, so FP/TN cannot be observed. FP may be
// supplied from an external source; otherwise precision degenerates to 1.0.

use crate::error::{EvalError, Result};
use crate::models::{AggregateMetrics, DetailedResult, MetricNote, SentenceOutcome};

pub const BETA_F05: f64 = 0.5;
pub const BETA_F1: f64 = 1.0;
pub const BETA_F2: f64 = 2.0;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DetectionCounts {
    pub true_positive: usize,
    pub false_negative: usize,
    /// Inference failures, not part of tp/fn.
    pub excluded: usize,
}

impl DetectionCounts {
    pub fn from_outcomes(outcomes: &[SentenceOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut acc, o| {
            if o.is_failed() {
                acc.excluded += 1;
            } else if o.detected() {
                acc.true_positive += 1;
            } else {
                acc.false_negative += 1;
            }
            acc
        })
    }

    pub fn evaluated(&self) -> usize {
        self.true_positive + self.false_negative
    }
}

/// Precision = TP / (TP + FP); 0.0 when nothing was detected.
pub fn precision(tp: usize, fp: usize) -> f64 {
    if tp + fp == 0 {
        return 0.0;
    }
    tp as f64 / (tp + fp) as f64
}

/// Recall = TP / (TP + FN); 0.0 on an empty set.
pub fn recall(tp: usize, fn_: usize) -> f64 {
    if tp + fn_ == 0 {
        return 0.0;
    }
    tp as f64 / (tp + fn_) as f64
}

/// F_beta = (1 + beta^2) * P * R / (beta^2 * P + R)
///
/// beta < 1 weights precision, beta > 1 weights recall.
pub fn f_beta(precision: f64, recall: f64, beta: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    let beta_squared = beta * beta;
    (1.0 + beta_squared) * precision * recall / (beta_squared * precision + recall)
}

/// Compute aggregate metrics over a finished run.
///
/// Fails with [`EvalError::InvalidInput`] when there is no evaluable sentence,
/// either because the list is empty or because every inference failed.
pub fn compute_metrics(outcomes: &[SentenceOutcome], fp: usize) -> Result<AggregateMetrics> {
    if outcomes.is_empty() {
        return Err(EvalError::invalid_input("no sentence outcomes to evaluate"));
    }

    let counts = DetectionCounts::from_outcomes(outcomes);
    if counts.evaluated() == 0 {
        return Err(EvalError::invalid_input(format!(
            "all {} sentence(s) failed inference, nothing to evaluate",
            counts.excluded
        )));
    }

    let tp = counts.true_positive;
    let p = precision(tp, fp);
    let r = recall(tp, counts.false_negative);

    let mut notes = Vec::new();
    if tp + fp == 0 {
        notes.push(MetricNote::ZeroDetectionPrecision);
    } else if fp == 0 {
        notes.push(MetricNote::SingleClassPrecision);
    }
    if counts.excluded > 0 {
        notes.push(MetricNote::ExcludedInferenceFailures {
            count: counts.excluded,
        });
    }

    Ok(AggregateMetrics {
        total_sentences: outcomes.len(),
        evaluated_sentences: counts.evaluated(),
        excluded_sentences: counts.excluded,
        true_positive: tp,
        false_negative: counts.false_negative,
        false_positive: fp,
        precision: p,
        recall: r,
        f05: f_beta(p, r, BETA_F05),
        f1: f_beta(p, r, BETA_F1),
        f2: f_beta(p, r, BETA_F2),
        notes,
    })
}

/// Accumulates outcomes during a run.
#[derive(Debug, Default)]
pub struct MetricsCalculator {
    results: Vec<SentenceOutcome>,
    false_positive: usize,
}

impl MetricsCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally measured false-positive count instead of 0.
    pub fn with_false_positives(fp: usize) -> Self {
        Self {
            results: Vec::new(),
            false_positive: fp,
        }
    }

    pub fn add_result(&mut self, outcome: SentenceOutcome) {
        self.results.push(outcome);
    }

    pub fn add_results(&mut self, outcomes: impl IntoIterator<Item = SentenceOutcome>) {
        self.results.extend(outcomes);
    }

    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[SentenceOutcome] {
        &self.results
    }

    pub fn counts(&self) -> DetectionCounts {
        DetectionCounts::from_outcomes(&self.results)
    }

    pub fn calculate_precision(&self) -> f64 {
        precision(self.counts().true_positive, self.false_positive)
    }

    pub fn calculate_recall(&self) -> f64 {
        let counts = self.counts();
        recall(counts.true_positive, counts.false_negative)
    }

    pub fn calculate_f_score(&self, beta: f64) -> f64 {
        f_beta(self.calculate_precision(), self.calculate_recall(), beta)
    }

    pub fn calculate_f05(&self) -> f64 {
        self.calculate_f_score(BETA_F05)
    }

    pub fn calculate_f1(&self) -> f64 {
        self.calculate_f_score(BETA_F1)
    }

    pub fn calculate_f2(&self) -> f64 {
        self.calculate_f_score(BETA_F2)
    }

    pub fn calculate_all_metrics(&self) -> Result<AggregateMetrics> {
        compute_metrics(&self.results, self.false_positive)
    }

    pub fn detailed_results(&self) -> Vec<DetailedResult> {
        self.results
            .iter()
            .enumerate()
            .map(|(index, o)| DetailedResult {
                index,
                original: o.sentence.clone(),
                corrected: o.corrected.clone(),
                detected: o.detected(),
                status: o.status,
                errors: o.errors.clone(),
                failure: o.failure.clone(),
            })
            .collect()
    }
}
