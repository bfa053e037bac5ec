use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

use crate::error::ScanError;

/// Environment variable overriding the analyzer script location.
pub const ANALYZER_ENV: &str = "EXODUS_ANALYZE";

const DEFAULT_SCRIPT: &str = "exodus_analyze.py";

/// JSON report exodus-standalone writes to stdout.
#[derive(Debug, Deserialize)]
pub struct Report {
    pub application: ApplicationInfo,
    #[serde(default)]
    pub trackers: Vec<Tracker>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationInfo {
    pub name: String,
    pub version_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Tracker {
    pub name: String,
}

impl Report {
    pub fn parse(json: &str) -> Result<Self, ScanError> {
        serde_json::from_str(json).map_err(|e| ScanError::Analyzer {
            code: None,
            stderr: format!("unreadable analyzer report: {e}"),
        })
    }

    /// Human-readable rendition: a title line, then the tracker listing.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} ({})\n",
            self.application.name, self.application.version_name
        );

        if self.trackers.is_empty() {
            out.push_str("No trackers found.\n");
        } else {
            out.push_str("Trackers found:\n");
            for tracker in &self.trackers {
                out.push_str("  - ");
                out.push_str(&tracker.name);
                out.push('\n');
            }
        }

        out
    }
}

/// Runs the external exodus-standalone analyzer on a local APK.
///
/// The analyzer is a collaborator, not part of this crate: it is spawned
/// once per run, its stdout is the report, its stderr and exit code are
/// surfaced verbatim on failure.
pub struct Analyzer {
    program: PathBuf,
    script: PathBuf,
}

impl Analyzer {
    /// Locates `python3` on the PATH and the analyzer script, which
    /// defaults to `exodus_analyze.py` and can be overridden through the
    /// `EXODUS_ANALYZE` environment variable. `PYTHONPATH` is inherited,
    /// so a vendored exodus-core setup keeps working.
    pub fn locate() -> Result<Self, ScanError> {
        let program = which::which("python3").map_err(|e| ScanError::Analyzer {
            code: None,
            stderr: format!("python3 not found: {e}"),
        })?;

        let script = match std::env::var_os(ANALYZER_ENV) {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_SCRIPT),
        };

        Ok(Self { program, script })
    }

    /// Test seam: run an arbitrary interpreter/script pair.
    pub fn with_command(program: PathBuf, script: PathBuf) -> Self {
        Self { program, script }
    }

    /// Runs the analyzer on `apk_path` and parses its JSON report.
    pub async fn analyze(&self, apk_path: &Path) -> Result<Report, ScanError> {
        info!("analyzing {}", apk_path.display());

        let output = Command::new(&self.program)
            .arg(&self.script)
            .arg("-j")
            .arg(apk_path)
            .output()
            .await
            .map_err(|e| ScanError::Analyzer {
                code: None,
                stderr: format!("failed to run analyzer: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() || stdout.trim().is_empty() {
            return Err(ScanError::Analyzer {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Report::parse(&stdout)
    }
}
