use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendwise_finance::exporter::DEFAULT_EXPORT_PATH;
use spendwise_finance::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use spendwise_finance::LlmSettings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::state::{ensure_spendwise_home, spendwise_home};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "MODEL";

const CONFIG_FILE: &str = "config.toml";

/// Contents of `~/.spendwise/config.toml`. The API key only ever comes from
/// the environment and is never written here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub paths: PathsSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSection {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                temperature: DEFAULT_TEMPERATURE,
            },
            paths: PathsSection {
                input: PathBuf::from("data/transactions.csv"),
                output: PathBuf::from(DEFAULT_EXPORT_PATH),
            },
        }
    }
}

/// File config with environment overrides applied, plus the API key if set.
#[derive(Debug, Clone)]
pub struct Effective {
    pub config: Config,
    pub api_key: Option<String>,
}

impl Effective {
    /// Settings for the LLM client, or `None` when no API key is configured.
    pub fn llm_settings(&self) -> Option<LlmSettings> {
        let key = self.api_key.as_ref()?;
        Some(LlmSettings {
            api_key: key.clone(),
            base_url: self.config.llm.base_url.clone(),
            model: self.config.llm.model.clone(),
            temperature: self.config.llm.temperature,
        })
    }

    pub fn masked_key(&self) -> String {
        match &self.api_key {
            None => "(not set)".to_string(),
            Some(k) if k.len() <= 8 || !k.is_ascii() => "****".to_string(),
            Some(k) => format!("{}****{}", &k[..3], &k[k.len() - 4..]),
        }
    }
}

/// Where config.toml lives. Nothing is created.
pub fn config_path() -> Result<PathBuf> {
    Ok(spendwise_home()?.join(CONFIG_FILE))
}

/// config.toml under `home`, or defaults when there is no home to read from.
pub fn load_home_config(home: Result<PathBuf>) -> Result<Config> {
    match home {
        Ok(dir) => load_config_from(&dir.join(CONFIG_FILE)),
        Err(e) => {
            debug!("no config home ({e:#}), using defaults");
            Ok(Config::default())
        }
    }
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Defaults, then config.toml, then `.env`, then the process environment.
pub fn load_effective() -> Result<Effective> {
    match dotenvy::dotenv() {
        Ok(p) => debug!("loaded {}", p.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("load .env"),
    }
    let config = load_home_config(spendwise_home())?;
    Ok(apply_env(config, |k| std::env::var(k).ok()))
}

/// Overlay environment values on a file config. Empty values count as unset.
pub fn apply_env(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Effective {
    let get = |k: &str| var(k).filter(|v| !v.trim().is_empty());
    if let Some(url) = get(BASE_URL_VAR) {
        config.llm.base_url = url;
    }
    if let Some(model) = get(MODEL_VAR) {
        config.llm.model = model;
    }
    Effective {
        config,
        api_key: get(API_KEY_VAR),
    }
}

pub fn init_config() -> Result<()> {
    let p = ensure_spendwise_home()?.join(CONFIG_FILE);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
