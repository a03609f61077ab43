use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::clone::DEFAULT_PACING;
use crate::error::ConfigError;
use crate::model::target::TargetSpec;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub jira: Option<JiraConfig>,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    /// Delay between targets, in milliseconds.
    pub pacing_ms: Option<u64>,
}

/// Connection settings as written in the file; the environment fills gaps.
#[derive(Debug, Deserialize, Default)]
pub struct JiraConfig {
    pub site: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
}

/// Validated settings for one run.
#[derive(Debug)]
pub struct Settings {
    pub connection: Connection,
    pub targets: Vec<TargetSpec>,
    pub pacing: Duration,
}

#[derive(Debug)]
pub struct Connection {
    pub site: String,
    pub email: String,
    pub api_token: String,
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("FANOUT_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fanout")
        .join("config.toml")
}

/// Read the config file. A missing file is an empty config.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Overlay the environment on the file config and check required settings.
pub fn resolve_settings(
    config: AppConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let file = config.jira.unwrap_or_default();
    let pick = |var: &'static str, from_file: Option<String>| {
        env(var)
            .or(from_file)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(var))
    };

    let connection = Connection {
        site: pick("JIRA_SITE", file.site)?,
        email: pick("JIRA_EMAIL", file.email)?,
        api_token: pick("JIRA_API_TOKEN", file.api_token)?,
    };
    if config.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    Ok(Settings {
        connection,
        targets: config.targets,
        pacing: config
            .pacing_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PACING),
    })
}

/// Load the config file and environment (`.env` is read by `main`).
pub fn load_settings() -> anyhow::Result<Settings> {
    let config = load_config(&config_path())?;
    Ok(resolve_settings(config, |var| std::env::var(var).ok())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::target::NamingPolicy;
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"
pacing_ms = 250

[jira]
site = "acme"
email = "ops@acme.io"
api_token = "file-token"

[[targets]]
project = "ACME"
client = "Acme"
labels = ["cloned"]
versions = ["1.4"]

[[targets]]
project = "GLX"
naming = "strip"
components = ["Backend"]
link_type = "Relates"
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_targets_in_order() {
        let file = write_config(SAMPLE);
        let config = load_config(file.path()).unwrap();
        let settings = resolve_settings(config, no_env).unwrap();

        assert_eq!(settings.pacing, Duration::from_millis(250));
        assert_eq!(settings.connection.site, "acme");
        assert_eq!(settings.targets.len(), 2);
        assert_eq!(settings.targets[0].project, "ACME");
        assert_eq!(settings.targets[0].client_tag(), Some("Acme"));
        assert_eq!(settings.targets[1].naming, NamingPolicy::Strip);
        assert_eq!(settings.targets[1].link_type(), "Relates");
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config(SAMPLE);
        let config = load_config(file.path()).unwrap();
        let env: HashMap<&str, &str> = [("JIRA_API_TOKEN", "env-token")].into();
        let settings =
            resolve_settings(config, |var| env.get(var).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.connection.api_token, "env-token");
        assert_eq!(settings.connection.email, "ops@acme.io");
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let config: AppConfig =
            toml::from_str("[jira]\nsite = \"acme\"\nemail = \" \"\n[[targets]]\nproject = \"A\"")
                .unwrap();
        let err = resolve_settings(config, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JIRA_EMAIL")));
    }

    #[test]
    fn no_targets_is_an_error() {
        let config: AppConfig =
            toml::from_str("[jira]\nsite = \"a\"\nemail = \"b\"\napi_token = \"c\"").unwrap();
        assert!(matches!(
            resolve_settings(config, no_env),
            Err(ConfigError::NoTargets)
        ));
    }

    #[test]
    fn missing_file_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert!(config.targets.is_empty());
        assert!(config.jira.is_none());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_config("[[targets]]\nproject = 12");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn pacing_defaults_to_one_second() {
        let config: AppConfig = toml::from_str(
            "[jira]\nsite = \"a\"\nemail = \"b\"\napi_token = \"c\"\n[[targets]]\nproject = \"A\"",
        )
        .unwrap();
        let settings = resolve_settings(config, no_env).unwrap();
        assert_eq!(settings.pacing, DEFAULT_PACING);
    }
}
