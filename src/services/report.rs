// Report Writer
// Persists evaluation reports as JSON and renders the console summary

use crate::error::Result;
use crate::models::{AggregateMetrics, EvaluationReport};
use crate::services::config_store::prune_oldest;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ReportWriter {
    results_dir: PathBuf,
    keep: usize,
}

impl ReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            results_dir: results_dir.into(),
            keep,
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }

    /// Write `{model_key}_results_{timestamp}.json` and return its path.
    pub fn write(&self, report: &EvaluationReport) -> Result<PathBuf> {
        self.ensure_dirs()?;

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let prefix = format!("{}_results_", report.model_key);
        let mut path = self.results_dir.join(format!("{}{}.json", prefix, timestamp));
        // Two runs within the same second must not overwrite each other.
        if path.exists() {
            let short_id = report.run_id.simple().to_string();
            path = self
                .results_dir
                .join(format!("{}{}_{}.json", prefix, timestamp, &short_id[..8]));
        }

        let content = serde_json::to_string_pretty(report)?;
        fs::write(&path, content)?;
        info!(path = %path.display(), "report.saved");

        if self.keep > 0 {
            prune_oldest(&self.results_dir, &prefix, self.keep)?;
        }

        Ok(path)
    }
}

/// Render the evaluation summary; `selected` picks which metrics are listed.
pub fn format_summary(model_name: &str, metrics: &AggregateMetrics, selected: &[String]) -> String {
    let rule = "=".repeat(50);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Evaluation summary: {}", model_name);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Total sentences: {}", metrics.total_sentences);
    let _ = writeln!(out, "Detected (TP): {}", metrics.true_positive);
    let _ = writeln!(out, "Missed (FN): {}", metrics.false_negative);
    let _ = writeln!(out, "False positives (FP): {}", metrics.false_positive);
    if metrics.excluded_sentences > 0 {
        let _ = writeln!(out, "Excluded (inference failed): {}", metrics.excluded_sentences);
    }
    let _ = writeln!(out, "{}", "-".repeat(50));
    for key in selected {
        match metrics.value(key) {
            Some(v) => {
                let _ = writeln!(out, "{}: {:.4}", display_name(key), v);
            }
            None => {
                let _ = writeln!(out, "{}: (unknown metric)", key);
            }
        }
    }
    if !metrics.notes.is_empty() {
        let _ = writeln!(out, "{}", "-".repeat(50));
        for note in &metrics.notes {
            let _ = writeln!(out, "Note: {}", note);
        }
    }
    let _ = write!(out, "{}", rule);
    out
}

fn display_name(key: &str) -> String {
    match key.trim().to_lowercase().as_str() {
        "precision" => "Precision".to_string(),
        "recall" => "Recall".to_string(),
        "f0.5" | "f05" => "F0.5".to_string(),
        "f1" => "F1".to_string(),
        "f2" => "F2".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricNote, SentenceOutcome};
    use crate::services::metrics::MetricsCalculator;
    use uuid::Uuid;

    fn sample_report() -> EvaluationReport {
        let mut calc = MetricsCalculator::new();
        calc.add_result(SentenceOutcome::with_detection("今天天汽很好", true));
        calc.add_result(SentenceOutcome::failed("我门一起去公园", "timeout"));
        EvaluationReport {
            run_id: Uuid::new_v4(),
            model_name: "MacBERT-CSC".to_string(),
            model_key: "macbert_csc".to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            metrics: calc.calculate_all_metrics().unwrap(),
            detailed_results: calc.detailed_results(),
        }
    }

    #[test]
    fn test_write_keeps_chinese_text() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("results"), 10);
        let path = writer.write(&sample_report()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("macbert_csc_results_"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("今天天汽很好"));
        assert!(content.contains("\"f0.5\""));
        assert!(content.contains("inference_failed"));
    }

    #[test]
    fn test_same_second_writes_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path(), 0);
        let a = writer.write(&sample_report()).unwrap();
        let b = writer.write(&sample_report()).unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_summary_lists_selected_metrics_and_notes() {
        let report = sample_report();
        let selected = vec!["recall".to_string(), "f1".to_string(), "auc".to_string()];
        let summary = format_summary("MacBERT-CSC", &report.metrics, &selected);
        assert!(summary.contains("Recall: 1.0000"));
        assert!(summary.contains("F1: 1.0000"));
        assert!(!summary.contains("Precision:"));
        assert!(summary.contains("auc: (unknown metric)"));
        assert!(summary.contains("Excluded (inference failed): 1"));
        assert!(report
            .metrics
            .notes
            .contains(&MetricNote::ExcludedInferenceFailures { count: 1 }));
        assert!(summary.contains("precision is 1.0 by construction"));
    }
}
