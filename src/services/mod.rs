// csc-eval Core Services
// Dataset loading, model access, metrics and report output

pub mod config_store;
pub mod corrector;
pub mod data_loader;
pub mod evaluation;
pub mod macbert;
pub mod metrics;
pub mod report;

pub use config_store::{AppConfig, ConfigStore, ModelConfig, MACBERT_CSC_KEY};
pub use corrector::{Corrector, CorrectorError};
pub use data_loader::DataLoader;
pub use evaluation::{run_evaluation, EvaluationOptions, EvaluationRun};
pub use macbert::{create_corrector, MacBertCscCorrector};
pub use metrics::{compute_metrics, f_beta, MetricsCalculator};
pub use report::{format_summary, ReportWriter};
