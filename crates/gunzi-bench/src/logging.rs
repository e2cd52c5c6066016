use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::Level;
use tracing::span::EnteredSpan;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Live for the whole run. Every event is recorded inside the `run` span so
/// each JSON line carries the run id; dropping the guard flushes the file.
pub struct LoggingGuard {
    _run: EnteredSpan,
    _writer: WorkerGuard,
    pub log_path: PathBuf,
}

/// JSON trace file at `outputs.log`, or nothing when structured logging is
/// off. `RUST_LOG` overrides the configured level.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    if let Some(dir) = outputs.log.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory at {}", dir.display()))?;
    }
    let file = File::create(&outputs.log)
        .with_context(|| format!("creating log file at {}", outputs.log.display()))?;
    let (writer, writer_guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let json = fmt::layer()
        .json()
        .flatten_event(true)
        .with_span_list(false)
        .with_ansi(false)
        .with_writer(writer);

    // Several runs in one process keep the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(json).try_init();

    let run = tracing::info_span!("run", run_id).entered();
    Ok(Some(LoggingGuard {
        _run: run,
        _writer: writer_guard,
        log_path: outputs.log.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::init_logging;
    use crate::config::{LoggingConfig, ResolvedOutputs};
    use tempfile::tempdir;

    #[test]
    fn disabled_logging_creates_nothing() {
        let dir = tempdir().expect("temp dir");
        let outputs = ResolvedOutputs {
            jsonl: dir.path().join("rounds.jsonl"),
            log: dir.path().join("trace.jsonl"),
        };
        let logging = LoggingConfig {
            enable_structured: false,
            tracing_level: "info".to_string(),
        };
        assert!(init_logging(&logging, &outputs, "quiet").expect("init").is_none());
        assert!(!outputs.log.exists());
    }

    #[test]
    fn events_carry_the_run_id() {
        let dir = tempdir().expect("temp dir");
        let outputs = ResolvedOutputs {
            jsonl: dir.path().join("rounds.jsonl"),
            log: dir.path().join("logs").join("trace.jsonl"),
        };
        let logging = LoggingConfig {
            enable_structured: true,
            tracing_level: "info".to_string(),
        };
        let guard = init_logging(&logging, &outputs, "nightly_seed_7")
            .expect("init")
            .expect("guard");
        tracing::info!(target: "gunzi_bench::round", round_index = 3u32, "round finished");
        drop(guard);

        let text = std::fs::read_to_string(&outputs.log).expect("log readable");
        let line = text
            .lines()
            .find(|line| line.contains("round finished"))
            .expect("event written");
        assert!(line.contains("\"round_index\":3"));
        assert!(line.contains("nightly_seed_7"));
    }
}
