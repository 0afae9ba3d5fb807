use opsdesk_notifications::PushSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub push: PushSettings,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.backend.url)
            .map_err(|e| format!("backend.url is not a valid URL: {e}"))?;
        self.push.validate().map_err(|e| e.to_string())?;
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Bearer token for backend calls
    #[serde(default)]
    pub token: Option<String>,
}

fn default_backend_url() -> String {
    "http://localhost:8080/api".into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlatformConfig {
    /// Registration handed to the headless platform; push is off without it
    #[serde(default)]
    pub registration_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    const DEFAULT_FILE: &str = "opsdesk.toml";

    fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".opsdesk").join("config.toml"))
    }

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if !pathbuf.exists() {
                    return Err(format!("config file not found: {p}"));
                }
                builder = builder.add_source(File::from(pathbuf));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                } else if let Some(user_path) = user_config_path().filter(|p| p.exists()) {
                    builder = builder.add_source(File::from(user_path));
                }
            }
        }
        // Environment variable overrides, e.g., OPSDESK__PUSH__TOAST_TTL_MS=5000
        builder = builder.add_source(
            Environment::with_prefix("OPSDESK")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("push.privileged_roles"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::loader::load_config;
    use std::{env, fs};

    #[test]
    fn config_parsing_and_env_overrides_and_validation() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("opsdesk.toml");

        let toml_content = r#"
[backend]
url = "https://api.example.com"

[push]
app_id = "ops-web"
vapid_key = "BExampleKey"
broadcast_topic = "ops_broadcast"
privileged_roles = ["admin"]
toast_ttl_ms = 5000

[logging]
level = "debug"
"#;
        fs::write(&path, toml_content).expect("write toml");

        // 1) Valid config parses
        let cfg = load_config(path.to_str()).expect("should parse config");
        assert_eq!(cfg.backend.url, "https://api.example.com");
        assert_eq!(cfg.push.app_id, "ops-web");
        assert_eq!(cfg.push.toast_ttl_ms, 5000);
        assert_eq!(cfg.push.privileged_roles, vec!["admin".to_string()]);
        assert_eq!(cfg.logging.level, "debug");

        // 2) Env override should win over file
        unsafe {
            env::set_var("OPSDESK__PUSH__BROADCAST_TOPIC", "night_shift");
        }
        let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
        assert_eq!(cfg_env.push.broadcast_topic, "night_shift");
        unsafe {
            env::remove_var("OPSDESK__PUSH__BROADCAST_TOPIC");
        }

        // 3) Invalid values are rejected
        fs::write(&path, "[push]\ntoast_ttl_ms = 0\n").expect("write toml");
        assert!(load_config(path.to_str()).is_err());

        fs::write(&path, "[backend]\nurl = \"not a url\"\n").expect("write toml");
        assert!(load_config(path.to_str()).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load_config(Some("/definitely/not/here/opsdesk.toml")).is_err());
    }
}
