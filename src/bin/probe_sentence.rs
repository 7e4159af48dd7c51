use clap::Parser;
use csc_eval_lib::config_store;
use csc_eval_lib::services::{create_corrector, Corrector};
use serde::Serialize;
use std::path::PathBuf;

/// Send a single sentence to the correction model and print what it reports
#[derive(Parser)]
#[command(name = "probe_sentence")]
struct Args {
    /// Sentence to correct
    sentence: String,

    /// Model key from the config
    #[arg(long, default_value = "macbert_csc")]
    model: String,

    /// Inference service URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the raw result as JSON
    #[arg(long)]
    json: bool,
}

fn highlight(sentence: &str, positions: &[usize]) -> String {
    sentence
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if positions.contains(&i) {
                format!("[{}]", c)
            } else {
                c.to_string()
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    csc_eval_lib::init_logging(true);

    let config = config_store(args.config.as_deref())?
        .load()
        .map_err(csc_eval_lib::error::EvalError::Config)?;
    let mut corrector = create_corrector(&args.model, &config)?;
    if let Some(endpoint) = args.endpoint {
        corrector = corrector.with_base_url(endpoint);
    }

    corrector.load().await?;
    let result = corrector.correct(&args.sentence).await?;

    if args.json {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Output<'a> {
            model: &'a str,
            endpoint: &'a str,
            #[serde(flatten)]
            result: &'a csc_eval_lib::models::CorrectionResult,
        }

        let out = Output {
            model: corrector.model_name(),
            endpoint: corrector.base_url(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let positions: Vec<usize> = result.errors.iter().filter_map(|e| e.position).collect();

    println!("Model: {} ({})", corrector.model_name(), corrector.base_url());
    println!("Input:     {}", highlight(&result.original, &positions));
    println!("Corrected: {}", result.corrected);
    println!("Detected:  {}", if result.has_error { "yes" } else { "no" });
    for (i, e) in result.errors.iter().enumerate() {
        let pos = e
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("[E{:02}] pos={} {} -> {}", i, pos, e.original, e.corrected);
    }

    Ok(())
}
