// Evaluation Runner
// Feeds sentences through a corrector one by one and aggregates detection metrics

use crate::error::{EvalError, Result};
use crate::models::{EvaluationReport, SentenceOutcome};
use crate::services::corrector::Corrector;
use crate::services::metrics::MetricsCalculator;
use crate::services::report::{format_summary, ReportWriter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Config key of the model, used for result file naming.
    pub model_key: String,
    pub save_results: bool,
    pub verbose: bool,
    pub results_dir: PathBuf,
    pub keep_results: usize,
    /// Externally measured false positives; 0 when unknown.
    pub false_positives: usize,
    pub progress_interval: usize,
    pub summary_metrics: Vec<String>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            model_key: "macbert_csc".to_string(),
            save_results: true,
            verbose: true,
            results_dir: PathBuf::from("output").join("results"),
            keep_results: 50,
            false_positives: 0,
            progress_interval: 100,
            summary_metrics: ["precision", "recall", "f0.5", "f1", "f2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug)]
pub struct EvaluationRun {
    pub report: EvaluationReport,
    /// Where the report was written, when saving was enabled.
    pub saved_to: Option<PathBuf>,
}

/// Run every sentence through `corrector` in order and aggregate the result.
///
/// A failed model call is recorded against its sentence and the run goes on;
/// only an empty input or a run where no sentence could be evaluated fails.
pub async fn run_evaluation<C: Corrector>(
    corrector: &mut C,
    sentences: &[String],
    options: &EvaluationOptions,
) -> Result<EvaluationRun> {
    if sentences.is_empty() {
        return Err(EvalError::invalid_input("sentence list is empty"));
    }

    let writer = ReportWriter::new(&options.results_dir, options.keep_results);
    if options.save_results {
        writer.ensure_dirs()?;
    }

    info!(model = corrector.model_name(), "model.loading");
    let t0 = Instant::now();
    corrector.load().await?;
    info!(load_ms = t0.elapsed().as_millis(), "model.loaded");

    info!(count = sentences.len(), "evaluation.started");
    let t0 = Instant::now();
    let mut calculator = MetricsCalculator::with_false_positives(options.false_positives);

    for (i, sentence) in sentences.iter().enumerate() {
        let outcome = match corrector.correct(sentence).await {
            Ok(result) => SentenceOutcome::from_correction(result),
            Err(e) => {
                warn!(index = i, error = %e, "evaluation.inference_failed");
                SentenceOutcome::failed(sentence.clone(), e.to_string())
            }
        };
        calculator.add_result(outcome);

        let done = i + 1;
        if options.verbose
            && options.progress_interval > 0
            && done % options.progress_interval == 0
        {
            info!(done, total = sentences.len(), "evaluation.progress");
        }
    }

    let metrics = calculator.calculate_all_metrics()?;
    info!(
        elapsed_ms = t0.elapsed().as_millis(),
        tp = metrics.true_positive,
        fn_ = metrics.false_negative,
        excluded = metrics.excluded_sentences,
        recall = metrics.recall,
        "evaluation.finished"
    );

    if options.verbose {
        println!(
            "{}",
            format_summary(corrector.model_name(), &metrics, &options.summary_metrics)
        );
    }

    let report = EvaluationReport {
        run_id: Uuid::new_v4(),
        model_name: corrector.model_name().to_string(),
        model_key: options.model_key.clone(),
        timestamp: chrono::Local::now().to_rfc3339(),
        metrics,
        detailed_results: calculator.detailed_results(),
    };

    let saved_to = if options.save_results {
        let path = writer.write(&report)?;
        if options.verbose {
            println!("Results saved to: {}", path.display());
        }
        Some(path)
    } else {
        None
    };

    Ok(EvaluationRun { report, saved_to })
}
