//! Command line interface of the `csc-eval` binary.

use clap::Parser;
use std::path::PathBuf;

/// Evaluate error detection of a Chinese spelling correction model
#[derive(Parser, Debug)]
#[command(name = "csc-eval")]
#[command(
    version,
    about = "Evaluate error detection of a Chinese spelling correction model",
    long_about = r#"
Every input sentence is treated as containing an error. The model is asked to
correct each one; a sentence counts as detected when the model reports at
least one error. Precision, recall, F0.5, F1 and F2 are computed over the run.

EXAMPLES:
  csc-eval --file data/errors.txt
  csc-eval "今天天汽很好" "我门一起去公园"
  csc-eval -f data/errors.json --endpoint http://gpu-box:5001 --no-save
  csc-eval --dataset train.jsonl --limit 1000
"#
)]
pub struct Cli {
    /// Erroneous sentences to evaluate (ignored when --file or --dataset is given)
    pub sentences: Vec<String>,

    /// Input data file (.txt one sentence per line, or .json)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Correction dataset export (.json or .jsonl rows of source/target/type);
    /// the sources of "negative" rows are evaluated
    #[arg(long, conflicts_with = "file")]
    pub dataset: Option<PathBuf>,

    /// Rows of --dataset to read before filtering (0 reads all)
    #[arg(long, default_value_t = 1000, requires = "dataset")]
    pub limit: usize,

    /// Model to evaluate (defaults to the config's defaultModel)
    #[arg(long)]
    pub model: Option<String>,

    /// Inference service URL, overriding config and MACBERT_CSC_URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Config file (defaults to <config dir>/csc-eval/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory; results are written to <dir>/results
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// False positives measured on a separate set of correct sentences
    #[arg(long, default_value_t = 0)]
    pub false_positives: usize,

    /// Do not save results to a file
    #[arg(long)]
    pub no_save: bool,

    /// Quiet mode: no summary, warnings only
    #[arg(short, long)]
    pub quiet: bool,
}
