use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "docuquery.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub typewriter_tick_ms: u64,
    pub preview_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            typewriter_tick_ms: 20,
            preview_dir: PathBuf::from("./previews"),
        }
    }
}

impl Settings {
    pub fn server_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("server url must be http or https, got '{}'", url.scheme());
        }
        Ok(url)
    }

    pub fn typewriter_tick(&self) -> Duration {
        Duration::from_millis(self.typewriter_tick_ms.max(1))
    }

    fn apply_file(&mut self, file_cfg: &HashMap<String, toml::Value>) {
        if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
            self.server_url = v.to_string();
        }
        if let Some(v) = file_cfg
            .get("typewriter_tick_ms")
            .and_then(toml::Value::as_integer)
        {
            if let Ok(parsed) = u64::try_from(v) {
                self.typewriter_tick_ms = parsed;
            }
        }
        if let Some(v) = file_cfg.get("preview_dir").and_then(toml::Value::as_str) {
            self.preview_dir = PathBuf::from(v);
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("DOCUQUERY_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = v;
        }

        if let Some(v) = lookup("APP__TYPEWRITER_TICK_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.typewriter_tick_ms = parsed;
            }
        }

        if let Some(v) = lookup("APP__PREVIEW_DIR") {
            self.preview_dir = PathBuf::from(v);
        }
    }
}

/// Defaults, then the TOML file (if present), then environment overrides.
pub fn load_settings(config_path: &Path) -> Settings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

fn load_settings_with(config_path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => settings.apply_file(&file_cfg),
            Err(err) => tracing::warn!(
                path = %config_path.display(),
                "ignoring unreadable config file: {err}"
            ),
        }
    }

    settings.apply_env(lookup);
    settings
}

pub fn prepare_preview_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create preview directory '{}'", dir.display()))?;
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_root(label: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        env::temp_dir().join(format!("docuquery_{label}_{suffix}"))
    }

    #[test]
    fn defaults_when_no_file_and_no_env() {
        let settings = load_settings_with(Path::new("/nonexistent/docuquery.toml"), |_| None);
        assert_eq!(settings.server_url, "http://127.0.0.1:8080");
        assert_eq!(settings.typewriter_tick(), Duration::from_millis(20));
    }

    #[test]
    fn file_values_are_overridden_by_env() {
        let root = temp_root("config");
        fs::create_dir_all(&root).expect("temp root");
        let path = root.join(DEFAULT_CONFIG_FILE);
        fs::write(
            &path,
            "server_url = \"http://docs.internal:9000\"\ntypewriter_tick_ms = 5\npreview_dir = \"/tmp/pv\"\n",
        )
        .expect("write config");

        let from_file = load_settings_with(&path, |_| None);
        assert_eq!(from_file.server_url, "http://docs.internal:9000");
        assert_eq!(from_file.typewriter_tick_ms, 5);
        assert_eq!(from_file.preview_dir, PathBuf::from("/tmp/pv"));

        let overridden = load_settings_with(&path, |key| match key {
            "DOCUQUERY_SERVER_URL" => Some("http://legacy:1".to_string()),
            "APP__SERVER_URL" => Some("http://override:7000".to_string()),
            "APP__TYPEWRITER_TICK_MS" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(overridden.server_url, "http://override:7000");
        assert_eq!(overridden.typewriter_tick_ms, 5);

        fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn rejects_non_http_server_url() {
        let settings = Settings {
            server_url: "ftp://files.example".to_string(),
            ..Settings::default()
        };
        assert!(settings.server_url().is_err());

        let settings = Settings {
            server_url: " http://127.0.0.1:8080/ ".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            settings.server_url().expect("valid").as_str(),
            "http://127.0.0.1:8080/"
        );
    }

    #[test]
    fn creates_preview_dir() {
        let root = temp_root("previews");
        let dir = root.join("nested");
        prepare_preview_dir(&dir).expect("prepare");
        assert!(dir.exists());
        fs::remove_dir_all(root).expect("cleanup");
    }
}
