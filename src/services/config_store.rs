// Configuration Storage Service
// Handles config file read/write and version backup

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const MACBERT_CSC_KEY: &str = "macbert_csc";
const MACBERT_CSC_MODEL_ID: &str = "shibing624/macbert4csc-base-chinese";
const MACBERT_CSC_DEFAULT_URL: &str = "http://127.0.0.1:5001";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    pub proxy: Option<ProxyConfig>,
    #[serde(default = "default_models")]
    pub models: HashMap<String, ModelConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_model: default_model(),
            proxy: None,
            models: default_models(),
            output: OutputConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    pub enabled: bool,
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyConfig {
    /// Proxy URL to route requests through, if any.
    pub fn active_url(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.https.as_deref().or(self.http.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub model_id: String,
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Falls back to `<outputDir>/results` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<PathBuf>,
    #[serde(default = "default_keep_results")]
    pub keep_results: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            results_dir: None,
            keep_results: default_keep_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationConfig {
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
            progress_interval: default_progress_interval(),
        }
    }
}

fn default_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
fn default_model() -> String { MACBERT_CSC_KEY.to_string() }
fn default_timeout_secs() -> u64 { 60 }
fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_keep_results() -> usize { 50 }
fn default_progress_interval() -> usize { 100 }

fn default_metrics() -> Vec<String> {
    ["precision", "recall", "f0.5", "f1", "f2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_models() -> HashMap<String, ModelConfig> {
    let mut models = HashMap::new();
    models.insert(
        MACBERT_CSC_KEY.to_string(),
        ModelConfig {
            name: "MacBERT-CSC".to_string(),
            description: "基于MacBERT的中文拼写纠错模型".to_string(),
            model_id: MACBERT_CSC_MODEL_ID.to_string(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
        },
    );
    models
}

impl OutputConfig {
    /// Where report files go. An `--output-dir` override writes to
    /// `<override>/results`; otherwise `resultsDir`, then `<outputDir>/results`.
    pub fn resolved_results_dir(&self, output_dir_override: Option<&Path>) -> PathBuf {
        if let Some(dir) = output_dir_override {
            return dir.join("results");
        }
        self.results_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("results"))
    }
}

impl ModelConfig {
    /// Service URL: `MACBERT_CSC_URL` env var, then config, then the local default.
    pub fn resolved_url(&self) -> String {
        if let Ok(val) = env::var("MACBERT_CSC_URL") {
            let v = val.trim();
            if !v.is_empty() {
                return v.to_string();
            }
        }
        self.base_url
            .clone()
            .unwrap_or_else(|| MACBERT_CSC_DEFAULT_URL.to_string())
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Store reading an explicit config file instead of `<dir>/config.json`.
    pub fn from_file(config_file: PathBuf) -> Self {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("csc-eval"))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), String> {
        fs::create_dir_all(&self.config_dir)
            .map_err(|e| format!("Failed to create config dir: {}", e))
    }

    /// Load configuration from file
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)
            .map_err(|e| format!("Failed to read config: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_file, content)
            .map_err(|e| format!("Failed to write config: {}", e))
    }

    fn create_backup(&self) -> Result<(), String> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)
            .map_err(|e| format!("Failed to create backup dir: {}", e))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));

        fs::copy(&self.config_file, &backup_file)
            .map_err(|e| format!("Failed to create backup: {}", e))?;

        // Keep only last 10 backups
        prune_oldest(&backup_dir, "config_", 10)
            .map_err(|e| format!("Failed to read backup dir: {}", e))
    }

    /// Get a model's config entry
    pub fn model_config(&self, key: &str) -> Result<Option<ModelConfig>, String> {
        let config = self.load()?;
        Ok(config.models.get(key).cloned())
    }

    /// Set a model's service URL in config file
    pub fn set_model_url(&self, key: &str, url: &str) -> Result<(), String> {
        let mut config = self.load()?;
        let model = config
            .models
            .get_mut(key)
            .ok_or_else(|| format!("Unknown model: {}", key))?;
        model.base_url = Some(url.to_string());
        self.save(&config)
    }
}

/// Remove the oldest `.json` files starting with `prefix`, keeping the most recent `keep`.
pub(crate) fn prune_oldest(dir: &Path, prefix: &str, keep: usize) -> std::io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "json"))
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .collect();

    if entries.len() <= keep {
        return Ok(());
    }

    // Oldest first; names carry the timestamp so they break mtime ties.
    entries.sort_by_key(|e| {
        let modified = e
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        (modified, e.file_name())
    });

    let remove_count = entries.len() - keep;
    for entry in entries.iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_model, "macbert_csc");
        let model = &config.models["macbert_csc"];
        assert_eq!(model.name, "MacBERT-CSC");
        assert_eq!(model.model_id, "shibing624/macbert4csc-base-chinese");
        assert_eq!(config.evaluation.metrics, vec!["precision", "recall", "f0.5", "f1", "f2"]);
        assert_eq!(config.evaluation.progress_interval, 100);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"version": "1.0.0", "proxy": null}"#).unwrap();
        assert_eq!(parsed.version, "1.0.0");
        assert!(parsed.models.contains_key("macbert_csc"));
        assert_eq!(
            parsed.output.resolved_results_dir(None),
            PathBuf::from("output").join("results")
        );
    }

    #[test]
    fn test_config_without_version_uses_package_version() {
        let parsed: AppConfig = serde_json::from_str(r#"{"defaultModel": "macbert_csc"}"#).unwrap();
        assert_eq!(parsed.version, env!("CARGO_PKG_VERSION"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        let config = ConfigStore::from_file(path).load().unwrap();
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_results_dir_resolution() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"output": {"outputDir": "runs"}}"#).unwrap();
        assert_eq!(
            parsed.output.resolved_results_dir(None),
            PathBuf::from("runs").join("results")
        );

        let explicit: AppConfig = serde_json::from_str(
            r#"{"output": {"outputDir": "runs", "resultsDir": "reports/csc"}}"#,
        )
        .unwrap();
        assert_eq!(
            explicit.output.resolved_results_dir(None),
            PathBuf::from("reports/csc")
        );

        let cli_dir = Path::new("/tmp/eval");
        assert_eq!(
            explicit.output.resolved_results_dir(Some(cli_dir)),
            cli_dir.join("results")
        );
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        let config = store.load().unwrap();
        assert_eq!(config.default_model, "macbert_csc");
    }

    #[test]
    fn test_set_model_url_roundtrips_and_backs_up() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        store.save(&AppConfig::default()).unwrap();
        store.set_model_url("macbert_csc", "http://gpu-box:5001").unwrap();

        let model = store.model_config("macbert_csc").unwrap().unwrap();
        assert_eq!(model.base_url.as_deref(), Some("http://gpu-box:5001"));
        assert!(dir.path().join("backups").read_dir().unwrap().next().is_some());

        assert!(store.set_model_url("bert_csc", "http://x").is_err());
    }

    #[test]
    fn test_prune_oldest_keeps_recent() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("config_{}.json", i)), "{}").unwrap();
        }
        fs::write(dir.path().join("other.json"), "{}").unwrap();
        prune_oldest(dir.path(), "config_", 2).unwrap();

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 3);
        assert!(dir.path().join("other.json").exists());
    }

    #[test]
    fn test_proxy_active_url() {
        let proxy = ProxyConfig {
            enabled: true,
            http: Some("http://proxy:8080".to_string()),
            https: None,
        };
        assert_eq!(proxy.active_url(), Some("http://proxy:8080"));
        let disabled = ProxyConfig { enabled: false, ..proxy };
        assert_eq!(disabled.active_url(), None);
    }
}
