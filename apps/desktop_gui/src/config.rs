//! Layered settings for the backend base URL.
//!
//! Precedence, lowest to highest: built-in default, `config.toml` under the
//! user config directory, the `VISOR_API_URL` environment variable, the
//! `--api-url` flag.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(name = "visor-dicom", about = "Visor de imágenes DICOM")]
pub struct Cli {
    /// Base URL of the processing backend.
    #[arg(long)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("visor-dicom").join("config.toml"))
}

fn read_file_config(path: &PathBuf) -> anyhow::Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))
}

pub fn load_settings(cli: &Cli) -> Settings {
    let file_cfg = match config_file_path() {
        Some(path) if path.exists() => match read_file_config(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("ignoring config file: {err:#}");
                FileConfig::default()
            }
        },
        _ => FileConfig::default(),
    };

    resolve(
        file_cfg,
        |name| std::env::var(name).ok(),
        cli.api_url.clone(),
    )
}

fn resolve(
    file_cfg: FileConfig,
    env: impl Fn(&str) -> Option<String>,
    flag: Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = env("VISOR_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = flag {
        settings.api_url = v;
    }

    settings.api_url = settings.api_url.trim().trim_end_matches('/').to_string();
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = resolve(FileConfig::default(), no_env, None);
        assert_eq!(settings.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn file_overrides_default() {
        let file_cfg = FileConfig {
            api_url: Some("http://imaging.local:9000".into()),
        };
        let settings = resolve(file_cfg, no_env, None);
        assert_eq!(settings.api_url, "http://imaging.local:9000");
    }

    #[test]
    fn env_overrides_file() {
        let file_cfg = FileConfig {
            api_url: Some("http://from-file:9000".into()),
        };
        let settings = resolve(
            file_cfg,
            |name| (name == "VISOR_API_URL").then(|| "http://from-env:9000".to_string()),
            None,
        );
        assert_eq!(settings.api_url, "http://from-env:9000");
    }

    #[test]
    fn flag_overrides_everything() {
        let file_cfg = FileConfig {
            api_url: Some("http://from-file:9000".into()),
        };
        let settings = resolve(
            file_cfg,
            |_| Some("http://from-env:9000".to_string()),
            Some("http://from-flag:9000".into()),
        );
        assert_eq!(settings.api_url, "http://from-flag:9000");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let settings = resolve(
            FileConfig::default(),
            no_env,
            Some("http://localhost:8000/".into()),
        );
        assert_eq!(settings.api_url, "http://localhost:8000");
    }
}
