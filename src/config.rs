use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Directory under the home directory holding the rc file and database
pub const CONFIG_DIR: &str = ".register";
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Settings read from `~/.register/rc`
///
/// The rc file holds `key=value` lines; `#` starts a comment line. Recognised
/// keys are `data.location`, `page.size` and `log.level`. Unknown keys are
/// ignored and malformed values fall back to their defaults.
///
/// Parsing runs before the logger is configured, so problems are collected in
/// `warnings` and emitted with [`Config::log_warnings`] once it is.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_location: PathBuf,
    pub page_size: u64,
    pub log_level: Option<String>,
    pub warnings: Vec<String>,
}

impl Config {
    /// `~/.register`
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(CONFIG_DIR))
    }

    /// `~/.register/rc`
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("rc"))
    }

    /// Load the rc file, or the defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        let base_dir = Self::dir()?;

        if !path.exists() {
            return Ok(Self::defaults(&base_dir));
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse(&content, &base_dir))
    }

    /// Parse rc content; relative paths resolve against `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Self {
        let mut config = Self::defaults(base_dir);

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                config.warnings.push(format!("Ignoring malformed config line: {}", line));
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() {
                        base_dir.join(path)
                    } else {
                        path
                    };
                }
                "page.size" => match value.parse::<u64>() {
                    Ok(size) if size > 0 => config.page_size = size,
                    _ => config
                        .warnings
                        .push(format!("Invalid page.size '{}', using {}", value, DEFAULT_PAGE_SIZE)),
                },
                "log.level" if !value.is_empty() => config.log_level = Some(value.to_string()),
                _ => {}
            }
        }

        config
    }

    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
    }

    fn defaults(base_dir: &Path) -> Self {
        Self {
            data_location: base_dir.join("register.db"),
            page_size: DEFAULT_PAGE_SIZE,
            log_level: None,
            warnings: Vec::new(),
        }
    }
}
