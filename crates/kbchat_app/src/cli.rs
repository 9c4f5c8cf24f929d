//! CLI argument definitions for the kbchat terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::terminal::config::{load_config, AppConfig, ConfigError, CONFIG_FILENAME};
use crate::terminal::logging::LogDestination;

/// kbchat: ask questions against a retrieval-augmented knowledge base.
#[derive(Parser, Debug)]
#[command(name = "kbchat", version, about)]
pub struct CliArgs {
    /// Path to the RON configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Base URL of the knowledge service.
    #[arg(short = 'u', long = "base-url")]
    pub base_url: Option<String>,

    /// Seconds a finished ingestion notice stays visible.
    #[arg(long = "notice-secs")]
    pub notice_secs: Option<u64>,

    /// Where log output goes. The terminal is the UI, so a file by default.
    #[arg(long = "log", value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    /// Log at debug level (always on in debug builds).
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > KBCHAT_CONFIG env var > ./kbchat.ron.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref path) = self.config {
            return path.clone();
        }
        if let Ok(path) = std::env::var("KBCHAT_CONFIG") {
            return PathBuf::from(path);
        }
        PathBuf::from(CONFIG_FILENAME)
    }

    pub fn resolve_config(&self) -> Result<AppConfig, ConfigError> {
        let config = load_config(&self.resolve_config_path())?;
        Ok(self.apply_overrides(config, std::env::var("KBCHAT_BASE_URL").ok()))
    }

    fn apply_overrides(&self, mut config: AppConfig, env_base_url: Option<String>) -> AppConfig {
        if let Some(url) = self.base_url.clone().or(env_base_url) {
            config.base_url = url;
        }
        if let Some(secs) = self.notice_secs {
            config.notice_ttl_secs = secs;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["kbchat"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_log_to_file() {
        let parsed = args(&[]);
        assert_eq!(parsed.log, LogDestination::File);
        assert!(parsed.base_url.is_none());
        assert!(!parsed.verbose);
        assert!(args(&["-v"]).verbose);
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = AppConfig {
            base_url: "http://file.test/".to_string(),
            ..AppConfig::default()
        };

        let resolved = args(&[]).apply_overrides(file.clone(), None);
        assert_eq!(resolved.base_url, "http://file.test/");

        let resolved = args(&[]).apply_overrides(file.clone(), Some("http://env.test/".into()));
        assert_eq!(resolved.base_url, "http://env.test/");

        let resolved = args(&["--base-url", "http://flag.test/", "--notice-secs", "9"])
            .apply_overrides(file, Some("http://env.test/".into()));
        assert_eq!(resolved.base_url, "http://flag.test/");
        assert_eq!(resolved.notice_ttl_secs, 9);
    }

    #[test]
    fn explicit_config_path_wins() {
        let parsed = args(&["--config", "/tmp/other.ron", "--log", "both"]);
        assert_eq!(parsed.resolve_config_path(), PathBuf::from("/tmp/other.ron"));
        assert_eq!(parsed.log, LogDestination::Both);
    }
}
