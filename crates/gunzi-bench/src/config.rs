use gunzi_bot::{Difficulty, SearchConfig};
use gunzi_core::TableConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const DEFAULT_DETERMINIZATIONS: usize = 30;
const DEFAULT_TIME_BUDGET_MS: u64 = 1_500;
const DEFAULT_CANDIDATE_CAP: usize = 20;
const DEFAULT_MAX_ROLLOUT_STEPS: usize = 200;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root harness configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchConfig {
    pub run_id: String,
    #[serde(default)]
    pub table: TableKind,
    pub matches: MatchConfig,
    pub seats: Vec<SeatConfig>,
    #[serde(default)]
    pub search: SearchSettings,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.matches.validate()?;
        self.search.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_seats(&self.seats)?;
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let jsonl = resolve_template(&self.run_id, &self.outputs.jsonl);
        let log_dir = jsonl
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ResolvedOutputs {
            jsonl,
            log: log_dir.join("trace.jsonl"),
        }
    }

    /// Seat difficulties in seat order; call after [`BenchConfig::validate`].
    pub fn difficulties(&self) -> Result<Vec<Difficulty>, ValidationError> {
        self.seats
            .iter()
            .enumerate()
            .map(|(index, seat)| seat.difficulty(index))
            .collect()
    }

    /// Search settings for one seat; seats get distinct seeds.
    pub fn search_config(&self, seat_index: usize) -> SearchConfig {
        self.search
            .to_search_config(self.matches.seed.wrapping_add(seat_index as u64))
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    #[default]
    ThreeDeck,
    TwoDeck,
}

impl TableKind {
    pub fn config(self) -> TableConfig {
        match self {
            TableKind::ThreeDeck => TableConfig::three_deck(),
            TableKind::TwoDeck => TableConfig::two_deck(),
        }
    }
}

/// How many rounds to play and from which seed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MatchConfig {
    #[serde(default)]
    pub seed: u64,
    pub rounds: usize,
}

impl MatchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.rounds == 0 {
            return Err(ValidationError::InvalidField {
                field: "matches.rounds".to_string(),
                message: "number of rounds must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeatConfig {
    pub name: String,
    pub difficulty: String,
}

impl SeatConfig {
    fn difficulty(&self, index: usize) -> Result<Difficulty, ValidationError> {
        self.difficulty
            .parse()
            .map_err(|err: gunzi_bot::UnknownDifficulty| ValidationError::InvalidField {
                field: format!("seats[{index}].difficulty"),
                message: err.to_string(),
            })
    }
}

/// Hard-tier search parameters shared by every Hard seat.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchSettings {
    #[serde(default = "default_determinizations")]
    pub determinizations: usize,
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            determinizations: DEFAULT_DETERMINIZATIONS,
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            workers: None,
        }
    }
}

impl SearchSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("search.determinizations", self.determinizations),
            ("search.candidate_cap", self.candidate_cap),
            ("search.time_budget_ms", self.time_budget_ms as usize),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidField {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if self.workers == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "search.workers".to_string(),
                message: "must be greater than zero when set".to_string(),
            });
        }
        Ok(())
    }

    pub fn to_search_config(&self, seed: u64) -> SearchConfig {
        let defaults = SearchConfig::default();
        SearchConfig {
            determinizations: self.determinizations,
            time_budget: Duration::from_millis(self.time_budget_ms),
            candidate_cap: self.candidate_cap,
            seed,
            max_rollout_steps: DEFAULT_MAX_ROLLOUT_STEPS,
            workers: self.workers.unwrap_or(defaults.workers),
        }
    }
}

fn default_determinizations() -> usize {
    DEFAULT_DETERMINIZATIONS
}

fn default_time_budget_ms() -> u64 {
    DEFAULT_TIME_BUDGET_MS
}

fn default_candidate_cap() -> usize {
    DEFAULT_CANDIDATE_CAP
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        if self.jsonl.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "outputs.jsonl".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        if resolve_template(run_id, &self.jsonl).components().count() == 0 {
            return Err(ValidationError::InvalidField {
                field: "outputs.jsonl".to_string(),
                message: "resolved path is invalid".to_string(),
            });
        }
        Ok(())
    }
}

/// Structured logs are off unless enabled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }
    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }
    Ok(())
}

fn validate_seats(seats: &[SeatConfig]) -> Result<(), ValidationError> {
    if seats.len() != 4 {
        return Err(ValidationError::InvalidField {
            field: "seats".to_string(),
            message: format!("exactly 4 seats are required but found {}", seats.len()),
        });
    }

    let mut seen = HashSet::new();
    for (index, seat) in seats.iter().enumerate() {
        if seat.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: format!("seats[{index}].name"),
                message: "seat name must not be empty".to_string(),
            });
        }
        if !seen.insert(seat.name.as_str()) {
            return Err(ValidationError::InvalidField {
                field: "seats".to_string(),
                message: format!("seat name '{}' defined more than once", seat.name),
            });
        }
        seat.difficulty(index)?;
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    /// Structured trace log, written only when enabled.
    pub log: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
