//! Rotating file sink for the audit trail.
//!
//! A daily-rotated, gzip-archived log file plus a stdout duplicate, with a
//! bounded number of archives retained. Held as an explicit handle injected
//! into the audit middleware; dropping the service without calling
//! [`AuditTrail::shutdown`] loses at most the final buffered lines.

use flexi_logger::{Age, Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, Logger, LoggerHandle, Naming, Record};
use std::path::Path;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AuditTrailConfig {
    pub dir: String,
    pub retention_days: usize,
}

pub struct AuditTrail {
    handle: Option<LoggerHandle>,
}

impl AuditTrail {
    /// Set up the rotating file sink. Files rotate daily, archives are
    /// gzip-compressed and pruned down to `retention_days`, and leftover
    /// artifacts from previous runs that are not log files are purged.
    pub fn init(config: &AuditTrailConfig) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.dir)?;
        purge_stale_artifacts(Path::new(&config.dir));

        let handle = Logger::try_with_str("warn, audit=info")
            .map_err(|e| AppError::Config(anyhow::anyhow!("invalid audit log spec: {e}")))?
            .format(audit_format)
            .log_to_file(
                FileSpec::default()
                    .directory(&config.dir)
                    .basename("audit")
                    .suffix("log"),
            )
            .rotate(
                Criterion::Age(Age::Day),
                Naming::Timestamps,
                Cleanup::KeepCompressedFiles(config.retention_days),
            )
            .duplicate_to_stdout(Duplicate::All)
            .start()
            .map_err(|e| AppError::Config(anyhow::anyhow!("failed to start audit trail: {e}")))?;

        Ok(AuditTrail {
            handle: Some(handle),
        })
    }

    /// A no-op trail for tests and tooling that must not touch the
    /// filesystem or the global logger.
    pub fn disabled() -> Self {
        AuditTrail { handle: None }
    }

    /// Emit one audit line, severity-routed by the response status.
    pub fn write(&self, status: u16, line: &str) {
        if status >= 500 {
            log::error!(target: "audit", "{line}");
        } else if status >= 400 {
            log::warn!(target: "audit", "{line}");
        } else {
            log::info!(target: "audit", "{line}");
        }
    }

    /// Flush and stop the file sink. Explicit teardown for graceful
    /// shutdown paths.
    pub fn shutdown(&self) {
        if let Some(handle) = &self.handle {
            handle.shutdown();
        }
    }
}

fn audit_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record<'_>,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} [{}]: {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.args()
    )
}

/// Remove files in the log directory left behind by other tooling or
/// previous runs; only the sink's own `.log` and `.gz` files survive.
fn purge_stale_artifacts(dir: &Path) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, dir = %dir.display(), "failed to scan log directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let keep = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("log") | Some("gz")
        );
        if !keep {
            if let Err(err) = std::fs::remove_file(&path) {
                tracing::warn!(error = %err, file = %path.display(), "failed to purge stale log artifact");
            }
        }
    }
}
