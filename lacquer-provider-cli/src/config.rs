//! Configuration for the local CLI subprocess provider.

use std::path::PathBuf;
use std::time::Duration;

/// Candidate executable names tried, in order, when `executable_path` isn't
/// set explicitly.
pub const CANDIDATE_EXECUTABLES: &[&str] = &["claude", "claude-code", "claude_code"];

/// Configuration for [`crate::CliProvider`].
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Explicit path to the CLI executable. When `None`, resolved at
    /// construction time by searching `PATH` for each of
    /// [`CANDIDATE_EXECUTABLES`] in order.
    pub executable_path: Option<PathBuf>,
    /// Working directory the child process is spawned in.
    pub working_directory: PathBuf,
    /// Wall-clock budget for a single exchange before the subprocess is
    /// killed and the call fails.
    pub session_timeout: Duration,
    /// Model alias passed to the CLI.
    pub model: String,
    /// Whether to surface intermediate assistant/tool events as they
    /// stream, rather than only the final result.
    pub enable_streaming: bool,
    /// Whether a progress sink receives per-line diagnostics.
    pub show_progress: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            working_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            session_timeout: Duration::from_secs(30 * 60),
            model: "sonnet".to_string(),
            enable_streaming: true,
            show_progress: true,
        }
    }
}

/// Resolve the CLI executable: the configured explicit path, or the first
/// of [`CANDIDATE_EXECUTABLES`] found on `PATH`.
pub fn resolve_executable(config: &CliConfig) -> Result<PathBuf, String> {
    if let Some(path) = &config.executable_path {
        return Ok(path.clone());
    }
    for candidate in CANDIDATE_EXECUTABLES {
        if let Ok(found) = which::which(candidate) {
            return Ok(found);
        }
    }
    Err(format!(
        "no CLI executable found on PATH (tried {})",
        CANDIDATE_EXECUTABLES.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_path_search() {
        let config = CliConfig {
            executable_path: Some(PathBuf::from("/opt/tools/claude")),
            ..CliConfig::default()
        };
        assert_eq!(resolve_executable(&config).unwrap(), PathBuf::from("/opt/tools/claude"));
    }

    #[test]
    fn default_model_is_sonnet() {
        assert_eq!(CliConfig::default().model, "sonnet");
    }
}
