// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Subscriber initialisation
//!
//! Console logging is always available. With `file-logging`, each run also
//! writes JSON logs into a timestamped folder.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;

/// `RUST_LOG` if set, otherwise the filter built from `flags`
pub fn env_filter(flags: &CrateDebugFlags) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(flags.to_filter_string()))
}

/// Install a human-readable console subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(flags: &CrateDebugFlags) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(flags))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install console logger: {}", e))
}

#[cfg(feature = "file-logging")]
pub use file::{init_logging, LogRetention, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result};
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use tracing::{info, warn};
    use tracing_appender::non_blocking::WorkerGuard;
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    use super::env_filter;
    use crate::cli::CrateDebugFlags;
    use crate::KNOWN_CRATES;

    const RUN_PREFIX: &str = "run_";
    const RUN_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

    /// Keeps the file writers alive; logs are flushed when dropped
    pub struct LoggingGuard {
        _file_guards: Vec<WorkerGuard>,
        run_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Folder of the current run
        pub fn run_dir(&self) -> &Path {
            &self.run_dir
        }
    }

    /// Which previous run folders to keep
    #[derive(Debug, Clone, Copy)]
    pub struct LogRetention {
        pub max_age_days: i64,
        pub max_runs: usize,
    }

    impl Default for LogRetention {
        fn default() -> Self {
            Self {
                max_age_days: 30,
                max_runs: 10,
            }
        }
    }

    /// Console output plus JSON files under `log_dir/run_<timestamp>/`
    ///
    /// ```text
    /// logs/
    ///   run_20250101_120000/
    ///     synmat-sparse.log
    ///     synmat-device.log
    ///     ...
    ///     synmat.log        (combined)
    /// ```
    pub fn init_logging(
        flags: &CrateDebugFlags,
        log_dir: &Path,
        retention: LogRetention,
    ) -> Result<LoggingGuard> {
        let run_dir = log_dir.join(format!("{}{}", RUN_PREFIX, Utc::now().format(RUN_TIMESTAMP)));
        std::fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;

        let cleanup_failures = cleanup_old_runs(log_dir, &run_dir, retention, Utc::now())?;

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(env_filter(flags))
                .boxed(),
        );

        for crate_name in KNOWN_CRATES {
            let appender = rolling::daily(&run_dir, format!("{}.log", crate_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let target = crate_name.replace('-', "_");
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_filter(EnvFilter::new(format!("{}=debug,off", target)))
                    .boxed(),
            );
        }

        let combined = rolling::daily(&run_dir, "synmat.log");
        let (writer, guard) = tracing_appender::non_blocking(combined);
        file_guards.push(guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(env_filter(flags))
                .boxed(),
        );

        Registry::default()
            .with(layers)
            .try_init()
            .context("failed to install file logger")?;

        for (path, error) in cleanup_failures {
            warn!("failed to remove old log directory {}: {}", path.display(), error);
        }
        info!(run_dir = %run_dir.display(), "file logging initialised");

        Ok(LoggingGuard {
            _file_guards: file_guards,
            run_dir,
        })
    }

    fn run_timestamp(dir_name: &str) -> Option<DateTime<Utc>> {
        let stamp = dir_name.strip_prefix(RUN_PREFIX)?;
        let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP).ok()?;
        Some(Utc.from_utc_datetime(&naive))
    }

    /// Remove run folders past `retention`, never `current`
    ///
    /// Returns the folders that could not be removed.
    pub(crate) fn cleanup_old_runs(
        log_dir: &Path,
        current: &Path,
        retention: LogRetention,
        now: DateTime<Utc>,
    ) -> Result<Vec<(PathBuf, std::io::Error)>> {
        let mut runs = Vec::new();
        for entry in std::fs::read_dir(log_dir)? {
            let path = entry?.path();
            if !path.is_dir() || path == current {
                continue;
            }
            let stamp = path.file_name().and_then(|n| n.to_str()).and_then(run_timestamp);
            if let Some(stamp) = stamp {
                runs.push((path, stamp));
            }
        }

        // Newest first; the current run counts towards max_runs
        runs.sort_by(|a, b| b.1.cmp(&a.1));
        let cutoff = now - chrono::Duration::days(retention.max_age_days);
        let keep = retention.max_runs.saturating_sub(1);

        let mut failures = Vec::new();
        for (index, (path, stamp)) in runs.into_iter().enumerate() {
            if index >= keep || stamp < cutoff {
                if let Err(error) = std::fs::remove_dir_all(&path) {
                    failures.push((path, error));
                }
            }
        }
        Ok(failures)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tempfile::tempdir;

        fn make_run(base: &Path, stamp: &str) -> PathBuf {
            let dir = base.join(format!("{}{}", RUN_PREFIX, stamp));
            std::fs::create_dir_all(&dir).unwrap();
            dir
        }

        #[test]
        fn test_run_timestamp_parses() {
            let stamp = run_timestamp("run_20250102_030405").unwrap();
            assert_eq!(stamp.format(RUN_TIMESTAMP).to_string(), "20250102_030405");
            assert!(run_timestamp("notes").is_none());
        }

        #[test]
        fn test_cleanup_keeps_recent_runs() {
            let base = tempdir().unwrap();
            let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
            let current = make_run(base.path(), "20250601_120000");
            let recent = make_run(base.path(), "20250531_120000");
            let older = make_run(base.path(), "20250530_120000");
            let expired = make_run(base.path(), "20250101_120000");
            std::fs::create_dir_all(base.path().join("unrelated")).unwrap();

            let retention = LogRetention {
                max_age_days: 30,
                max_runs: 2,
            };
            let failures = cleanup_old_runs(base.path(), &current, retention, now).unwrap();

            assert!(failures.is_empty());
            assert!(current.exists());
            assert!(recent.exists());
            assert!(!older.exists());
            assert!(!expired.exists());
            assert!(base.path().join("unrelated").exists());
        }
    }
}
