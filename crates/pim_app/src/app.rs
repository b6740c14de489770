use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::session::{replay, SessionReport, SessionScript};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub session_path: Option<PathBuf>,
    pub history_limit: usize,
    pub compact_output: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `PIM_*` variables. Unparseable values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = lookup("PIM_SESSION") {
            if !path.trim().is_empty() {
                config.session_path = Some(PathBuf::from(path));
            }
        }
        if let Some(limit) = lookup("PIM_HISTORY_LIMIT") {
            match limit.trim().parse::<usize>() {
                Ok(value) if value > 0 => config.history_limit = value,
                _ => warn!(value = %limit, "ignoring invalid PIM_HISTORY_LIMIT"),
            }
        }
        if let Some(compact) = lookup("PIM_COMPACT_OUTPUT") {
            match compact.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => config.compact_output = true,
                "0" | "false" | "no" => config.compact_output = false,
                _ => warn!(value = %compact, "ignoring invalid PIM_COMPACT_OUTPUT"),
            }
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_path: None,
            history_limit: 100,
            compact_output: false,
        }
    }
}

pub fn load_script(path: &Path) -> Result<SessionScript> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read session script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid session script {}", path.display()))
}

pub fn replay_file(path: &Path, history_limit: usize) -> Result<SessionReport> {
    let start = Instant::now();
    let script = load_script(path)?;
    info!(
        path = %path.display(),
        incidences = script.incidences.len(),
        steps = script.steps.len(),
        "replaying session"
    );
    let report = replay(script, history_limit)?;
    info!(elapsed_ms = %start.elapsed().as_millis(), "session replayed");
    Ok(report)
}

pub fn run(config: AppConfig) -> Result<()> {
    let path = config
        .session_path
        .as_deref()
        .context("no session script given (set PIM_SESSION or pass a path)")?;
    let report = replay_file(path, config.history_limit)?;

    let rendered = if config.compact_output {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}
