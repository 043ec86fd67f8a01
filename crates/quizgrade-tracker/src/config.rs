//! Tracker configuration and factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizgrade_core::traits::TaskTracker;

use crate::asana::AsanaTracker;

/// Section reviewed when none is given on the command line.
pub const DEFAULT_SECTION: &str = "Inducción Ingreso Personal Nuevo/Contratista";

/// Configuration for the task tracker backend.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrackerConfig {
    Asana {
        token: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerConfig::Asana { token: _, base_url } => f
                .debug_struct("Asana")
                .field("token", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Top-level quizgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizgradeConfig {
    /// Tracker connection settings.
    #[serde(default)]
    pub tracker: Option<TrackerConfig>,
    /// Project whose sections are reviewed.
    #[serde(default)]
    pub project_gid: Option<String>,
    /// Section name used when `--section` is omitted.
    #[serde(default = "default_section")]
    pub default_section: String,
    /// Overrides the answer key's threshold when set.
    #[serde(default)]
    pub approval_threshold: Option<f64>,
    /// Post a feedback comment on approved tasks too.
    #[serde(default = "default_comment_on_pass")]
    pub comment_on_pass: bool,
    /// Max retries on transient tracker errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}
fn default_comment_on_pass() -> bool {
    true
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizgrade-results")
}

impl Default for QuizgradeConfig {
    fn default() -> Self {
        Self {
            tracker: None,
            project_gid: None,
            default_section: default_section(),
            approval_threshold: None,
            comment_on_pass: default_comment_on_pass(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_tracker_config(config: &TrackerConfig) -> TrackerConfig {
    match config {
        TrackerConfig::Asana { token, base_url } => TrackerConfig::Asana {
            token: resolve_env_vars(token),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizgrade.toml` in the current directory
/// 2. `~/.config/quizgrade/config.toml`
///
/// Environment variable overrides: `QUIZGRADE_ASANA_TOKEN`, `QUIZGRADE_PROJECT`.
pub fn load_config() -> Result<QuizgradeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizgradeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizgradeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("QUIZGRADE_ASANA_TOKEN") {
        match config.tracker.as_mut() {
            Some(TrackerConfig::Asana { token, .. }) => *token = key,
            None => {
                config.tracker = Some(TrackerConfig::Asana {
                    token: key,
                    base_url: None,
                })
            }
        }
    }
    if let Ok(project) = std::env::var("QUIZGRADE_PROJECT") {
        config.project_gid = Some(project);
    }

    config.tracker = config.tracker.as_ref().map(resolve_tracker_config);
    config.project_gid = config
        .project_gid
        .as_deref()
        .map(resolve_env_vars)
        .filter(|gid| !gid.trim().is_empty());

    Ok(config)
}

fn parse_config(content: &str) -> Result<QuizgradeConfig> {
    let config: QuizgradeConfig = toml::from_str(content)?;
    if let Some(t) = config.approval_threshold {
        if !(0.0..=1.0).contains(&t) {
            anyhow::bail!("approval_threshold must be within [0, 1], got {t}");
        }
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizgrade"))
}

/// Create a tracker instance from its configuration.
pub fn create_tracker(config: &TrackerConfig) -> Result<Box<dyn TaskTracker>> {
    match config {
        TrackerConfig::Asana { token, base_url } => {
            if token.trim().is_empty() {
                anyhow::bail!(
                    "Asana token is empty; set it in quizgrade.toml or QUIZGRADE_ASANA_TOKEN"
                );
            }
            let tracker = AsanaTracker::new(token, base_url.clone())
                .context("failed to create Asana tracker")?;
            Ok(Box::new(tracker))
        }
    }
}
