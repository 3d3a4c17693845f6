use std::{env, path::PathBuf};

use color_eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::Deserialize;
use tracing::warn;

use club_core::forms::DEFAULT_FAVORITES_MAX;

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8080/api";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    pub api_endpoint: String,
    pub request_timeout_secs: u64,
    pub favorites_max: usize,
    pub tick_rate: f64,
    pub frame_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config: AppConfig {
                data_dir: get_data_dir(),
                config_dir: get_config_dir(),
            },
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            request_timeout_secs: 10,
            favorites_max: DEFAULT_FAVORITES_MAX,
            tick_rate: 4.0,
            frame_rate: 30.0,
        }
    }
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Defaults, then `config.json5` / `config.toml` from the config dir,
    /// then `CLUBS_*` environment variables.
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load_from(&get_config_dir())
    }

    pub fn load_from(config_dir: &std::path::Path) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("data_dir", defaults.config.data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .set_default("api_endpoint", defaults.api_endpoint)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("favorites_max", defaults.favorites_max as u64)?
            .set_default("tick_rate", defaults.tick_rate)?
            .set_default("frame_rate", defaults.frame_rate)?;

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.toml", config::FileFormat::Toml),
        ];
        let mut found_config = false;
        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
            if config_dir.join(file).exists() {
                found_config = true
            }
        }
        if !found_config {
            warn!("No configuration file found, using defaults");
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&PROJECT_NAME)
                .try_parsing(true)
                .separator("__"),
        );

        let cfg: Self = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "clubs", env!("CARGO_PKG_NAME"))
}
