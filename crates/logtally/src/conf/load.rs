//! Load — layered config loading: defaults, config file, environment.

use std::path::Path;
use config::{Config, Environment, File};

use super::model::LogTallyConfig;
use super::ConfigError;

/// Environment variable naming the config file when no path is given.
pub const CONFIG_FILE_ENV: &str = "LOGTALLY_CONFIG_FILE";
/// Config file used when neither an argument nor `LOGTALLY_CONFIG_FILE` is set.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

const ENV_PREFIX: &str = "LOGTALLY";

impl LogTallyConfig {
    /// Pick the config file: explicit path, then `LOGTALLY_CONFIG_FILE`, then `config.json`.
    pub fn resolve_path(explicit: Option<&str>) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_FILE_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }

    /// Load and validate configuration.
    /// Priority: Environment Variables > Config File > Defaults
    ///
    /// Nested keys use a double underscore, e.g.
    /// `LOGTALLY_WALKER__MAX_DISCOVERY_WORKERS=8`. `LOGTALLY_WALKER__LOG_DIRS`
    /// takes a comma-separated list.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_with_env(path, environment())
    }

    /// Same as [`LogTallyConfig::load`] with an explicit environment source.
    pub fn load_with_env(path: &str, env: Environment) -> Result<Self, ConfigError> {
        // Compile-time defaults are the bottom layer so partial files stay valid
        let defaults = Config::try_from(&LogTallyConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new(path).exists() {
            tracing::info!("Loading configuration from: {}", path);
            builder = builder.add_source(File::from(Path::new(path)));
        } else {
            tracing::info!("Config file not found at {}, using defaults and environment", path);
        }

        let config: LogTallyConfig = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("walker.log_dirs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::model::{FileErrorPolicy, ReportFormat};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create config file");
        file.write_all(contents.as_bytes()).expect("write config file");
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        assert_eq!(LogTallyConfig::resolve_path(Some("custom.toml")), "custom.toml");
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            &dir,
            "config.json",
            r#"{
                "walker": { "log_dirs": ["/srv/a", "/srv/b"], "max_discovery_workers": 2 },
                "ingestion": { "max_ingestion_workers": 3, "on_file_error": "stop_worker" },
                "discovered_files_channel_size": 8,
                "processed_log_count_channel_size": 4
            }"#,
        );

        let cfg = LogTallyConfig::load_with_env(&path, env_from(&[])).expect("load json");
        assert_eq!(cfg.walker.log_dirs, vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]);
        assert_eq!(cfg.walker.max_discovery_workers, 2);
        assert_eq!(cfg.ingestion.max_ingestion_workers, 3);
        assert_eq!(cfg.ingestion.on_file_error, FileErrorPolicy::StopWorker);
        assert_eq!(cfg.discovered_files_channel_size, 8);
        assert_eq!(cfg.processed_log_count_channel_size, 4);
        assert_eq!(cfg.ingestion.max_line_bytes, 65536); // default
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            &dir,
            "logtally.toml",
            r#"
                discovered_files_channel_size = 16

                [walker]
                log_dirs = ["/srv/logs"]

                [report]
                format = "json"
            "#,
        );

        let cfg = LogTallyConfig::load_with_env(&path, env_from(&[])).expect("load toml");
        assert_eq!(cfg.walker.log_dirs, vec![PathBuf::from("/srv/logs")]);
        assert_eq!(cfg.discovered_files_channel_size, 16);
        assert_eq!(cfg.report.format, ReportFormat::Json);
        assert_eq!(cfg.walker.max_discovery_workers, 4); // default
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(
            &dir,
            "config.json",
            r#"{ "walker": { "log_dirs": ["/srv/a"], "max_discovery_workers": 2 } }"#,
        );

        let env = env_from(&[
            ("LOGTALLY_WALKER__MAX_DISCOVERY_WORKERS", "6"),
            ("LOGTALLY_INGESTION__MAX_INGESTION_WORKERS", "9"),
        ]);
        let cfg = LogTallyConfig::load_with_env(&path, env).expect("load with env");
        assert_eq!(cfg.walker.max_discovery_workers, 6);
        assert_eq!(cfg.ingestion.max_ingestion_workers, 9);
        assert_eq!(cfg.walker.log_dirs, vec![PathBuf::from("/srv/a")]);
    }

    #[test]
    fn test_environment_only_config() {
        let env = env_from(&[("LOGTALLY_WALKER__LOG_DIRS", "/srv/a,/srv/b")]);
        let cfg = LogTallyConfig::load_with_env("/nonexistent/logtally.json", env)
            .expect("env-only config");
        assert_eq!(cfg.walker.log_dirs, vec![PathBuf::from("/srv/a"), PathBuf::from("/srv/b")]);
    }

    #[test]
    fn test_missing_dirs_is_fatal() {
        let result = LogTallyConfig::load_with_env("/nonexistent/logtally.json", env_from(&[]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_config(&dir, "config.json", "{ not json");
        let result = LogTallyConfig::load_with_env(&path, env_from(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
