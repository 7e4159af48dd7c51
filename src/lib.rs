pub mod cli;
pub mod error;
pub mod models;
pub mod services;

use anyhow::{bail, Context};
use cli::Cli;
use services::{create_corrector, run_evaluation, ConfigStore, DataLoader, EvaluationOptions};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;

static PROCESS_START: OnceLock<Instant> = OnceLock::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn startup_elapsed_ms() -> u128 {
    PROCESS_START
        .get()
        .map(|t| t.elapsed().as_millis())
        .unwrap_or(0)
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

/// Initialize logging: console on stderr plus one log file per session.
///
/// `RUST_LOG` wins over the default level (`info`, or `warn` when quiet).
pub fn init_logging(quiet: bool) {
    PROCESS_START.get_or_init(Instant::now);

    let default_level = if quiet { "warn" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if env_flag("CSC_EVAL_DISABLE_FILE_LOG") {
        init_console_only_logging(env_filter);
        info!("File logging disabled via CSC_EVAL_DISABLE_FILE_LOG");
        return;
    }

    let logs_dir = match std::env::var("CSC_EVAL_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => get_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("csc-eval_{}.log", timestamp);

    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    info!("Log file: {}/{}", logs_dir.display(), log_filename);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if !env_flag("CSC_EVAL_DISABLE_LOG_CLEANUP") {
        std::thread::spawn(move || {
            cleanup_old_logs(&logs_dir, 30);
        });
    }
}

fn get_logs_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("csc-eval").join("logs");
    }
    PathBuf::from("logs")
}

fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with("csc-eval_") && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len().saturating_sub(keep);
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

/// Config store for an explicit `--config` file, or the per-user default.
pub fn config_store(path: Option<&Path>) -> anyhow::Result<ConfigStore> {
    match path {
        Some(p) => Ok(ConfigStore::from_file(p.to_path_buf())),
        None => ConfigStore::default_config_dir()
            .map(ConfigStore::new)
            .context("could not determine the user config directory; pass --config"),
    }
}

/// Entry point of the `csc-eval` binary.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = config_store(cli.config.as_deref())?;
    let config = store.load().map_err(error::EvalError::Config)?;
    info!(config = %store.config_file().display(), "config.loaded");

    let mut loader = DataLoader::new();
    if let Some(file) = &cli.file {
        loader.load_from_file(file)?;
        if !cli.quiet {
            println!("Loaded {} sentences from {}", loader.len(), file.display());
        }
    } else if let Some(dataset) = &cli.dataset {
        let limit = (cli.limit > 0).then_some(cli.limit);
        loader.load_correction_dataset(dataset, limit)?;
        if !cli.quiet {
            println!(
                "Loaded {} erroneous sentences from {}",
                loader.len(),
                dataset.display()
            );
        }
    } else {
        loader.load_from_list(cli.sentences.clone());
    }
    if loader.is_empty() {
        bail!(
            "no sentences to evaluate: pass sentences as arguments, \
             or use --file <path> or --dataset <path>"
        );
    }

    let model_key = cli.model.clone().unwrap_or_else(|| config.default_model.clone());
    let mut corrector = create_corrector(&model_key, &config)?;
    if let Some(endpoint) = &cli.endpoint {
        corrector = corrector.with_base_url(endpoint.clone());
    }
    if !cli.quiet {
        println!("Model: {} ({})", model_key, corrector.base_url());
    }

    let results_dir = config.output.resolved_results_dir(cli.output_dir.as_deref());

    let options = EvaluationOptions {
        model_key,
        save_results: !cli.no_save,
        verbose: !cli.quiet,
        results_dir,
        keep_results: config.output.keep_results,
        false_positives: cli.false_positives,
        progress_interval: config.evaluation.progress_interval,
        summary_metrics: config.evaluation.metrics.clone(),
    };

    let sentences = loader.into_sentences();
    let run = run_evaluation(&mut corrector, &sentences, &options).await?;
    info!(
        startup_ms = startup_elapsed_ms(),
        run_id = %run.report.run_id,
        "evaluation.done"
    );

    Ok(())
}
