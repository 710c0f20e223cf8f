//! Configuration types.
//!
//! Layered like a system tool: built-in defaults, then `/etc/tenantdesk`,
//! then the user config file, then `TENANTDESK_*` environment overrides.
//! Out-of-range values are corrected to defaults with a warning, or rejected
//! outright when `TENANTDESK_STRICT_CONFIG` is set.

use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::list::PAGE_SIZE_OPTIONS;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,

    pub list: ListConfig,

    pub display: DisplayConfig,

    pub behavior: BehaviorConfig,

    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the admin API, e.g. `https://api.example.com/api`
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListConfig {
    /// Rows per page on first load
    pub page_size: u32,

    /// Delay before a live filter edit triggers a fetch
    pub search_debounce_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            search_debounce_ms: 400,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Theme name ("dark" or "light")
    pub theme: String,

    /// View shown on startup
    pub default_view: String,

    /// chrono format string for dates in tables
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            default_view: "dashboard".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Ask before suspend and deactivate
    pub confirm_quick_actions: bool,

    /// Enable clipboard support
    pub copy_to_clipboard: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            confirm_quick_actions: true,
            copy_to_clipboard: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Where exports and receipts are written (defaults to the working directory)
    pub directory: Option<PathBuf>,
}

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_DEBOUNCE_MS: u64 = 5000;

/// Correct an invalid value to its default, or fail in strict mode
fn correct<T: std::fmt::Display>(
    value: &mut T,
    valid: bool,
    field: &str,
    requirement: &str,
    default: T,
    strict: bool,
    warnings: &mut Vec<String>,
) -> Result<(), String> {
    if !valid {
        let msg = format!("{field} {requirement}, got {value}");
        if strict {
            return Err(msg);
        }
        warnings.push(format!("{msg} - using default ({default})"));
        *value = default;
    }
    Ok(())
}

/// A strftime pattern chrono can render without erroring
fn is_valid_date_format(pattern: &str) -> bool {
    !pattern.is_empty() && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

impl AppConfig {
    /// Validate configuration values.
    /// Returns warnings for invalid values that were corrected to defaults.
    /// If `strict` is true, returns Err instead of correcting values.
    pub fn validate(&mut self, strict: bool) -> Result<Vec<String>, String> {
        let mut warnings = Vec::new();
        let defaults = Self::default();

        let timeout = self.api.timeout_secs;
        correct(
            &mut self.api.timeout_secs,
            (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout),
            "api.timeout_secs",
            &format!("must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds"),
            defaults.api.timeout_secs,
            strict,
            &mut warnings,
        )?;

        let page_size = self.list.page_size;
        correct(
            &mut self.list.page_size,
            PAGE_SIZE_OPTIONS.contains(&page_size),
            "list.page_size",
            &format!("must be one of {:?}", PAGE_SIZE_OPTIONS),
            defaults.list.page_size,
            strict,
            &mut warnings,
        )?;

        let debounce = self.list.search_debounce_ms;
        correct(
            &mut self.list.search_debounce_ms,
            debounce <= MAX_DEBOUNCE_MS,
            "list.search_debounce_ms",
            &format!("must be at most {MAX_DEBOUNCE_MS}"),
            defaults.list.search_debounce_ms,
            strict,
            &mut warnings,
        )?;

        let date_format = self.display.date_format.clone();
        correct(
            &mut self.display.date_format,
            is_valid_date_format(&date_format),
            "display.date_format",
            "must be a valid strftime pattern",
            defaults.display.date_format.clone(),
            strict,
            &mut warnings,
        )?;

        let url = self.api.base_url.trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            let msg = format!("api.base_url must start with http:// or https://, got '{}'", url);
            if strict {
                return Err(msg);
            }
            warnings.push(format!("{msg} - using default ({})", defaults.api.base_url));
            self.api.base_url = defaults.api.base_url;
        } else {
            self.api.base_url = url;
        }

        Ok(warnings)
    }

    /// Directory holding `config.toml` and `session.json`, respecting XDG_CONFIG_HOME
    ///
    /// Resolution order:
    /// 1. $XDG_CONFIG_HOME/tenantdesk (if XDG_CONFIG_HOME is set)
    /// 2. $HOME/.config/tenantdesk (if HOME is set)
    /// 3. dirs::config_dir()/tenantdesk (fallback using dirs crate)
    /// 4. None if no config directory can be determined
    #[must_use]
    pub fn user_config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
            && !xdg_config.is_empty()
        {
            return Some(PathBuf::from(xdg_config).join("tenantdesk"));
        }

        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config/tenantdesk"));
        }

        dirs::config_dir().map(|dir| dir.join("tenantdesk"))
    }

    #[must_use]
    pub fn user_config_path() -> Option<PathBuf> {
        Self::user_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from files and environment.
    /// Returns the config and any warnings encountered during loading.
    /// Errors only in strict mode.
    pub fn load() -> Result<(Self, Vec<String>), String> {
        let mut config = Self::default();
        let mut warnings = Vec::new();
        let strict = Self::is_strict_mode();

        Self::load_config_file(&mut config, "/etc/tenantdesk/config.toml", strict, &mut warnings)?;

        if let Some(user_path) = Self::user_config_path() {
            Self::load_config_file(&mut config, &user_path.to_string_lossy(), strict, &mut warnings)?;
        }

        config.apply_env_overrides(strict, &mut warnings)?;

        warnings.extend(config.validate(strict)?);
        for warning in &warnings {
            tracing::warn!(%warning, "Configuration problem");
        }

        Ok((config, warnings))
    }

    /// Check if strict config mode is enabled via TENANTDESK_STRICT_CONFIG
    fn is_strict_mode() -> bool {
        std::env::var("TENANTDESK_STRICT_CONFIG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Load a config file, collecting warnings on parse errors but not on missing files.
    fn load_config_file(config: &mut Self, path: &str, strict: bool, warnings: &mut Vec<String>) -> Result<(), String> {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(parsed) => {
                    tracing::debug!(path, "Loaded config file");
                    config.merge(parsed);
                }
                Err(e) => {
                    let msg = format!("Config parse error in '{}': {}", path, e);
                    if strict {
                        return Err(msg);
                    }
                    warnings.push(msg);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let msg = format!("Could not read config '{}': {}", path, e);
                if strict {
                    return Err(msg);
                }
                warnings.push(msg);
            }
        }
        Ok(())
    }

    fn merge(&mut self, other: AppConfig) {
        self.api = other.api;
        self.list = other.list;
        self.display = other.display;
        self.behavior = other.behavior;
        // Keep an earlier export directory unless the later file sets one
        self.export.directory = other.export.directory.or(self.export.directory.take());
    }

    fn apply_env_overrides(&mut self, strict: bool, warnings: &mut Vec<String>) -> Result<(), String> {
        if let Ok(val) = std::env::var("TENANTDESK_API_URL")
            && !val.is_empty()
        {
            self.api.base_url = val;
        }

        if let Ok(val) = std::env::var("TENANTDESK_PAGE_SIZE") {
            match val.parse::<u32>() {
                Ok(size) if PAGE_SIZE_OPTIONS.contains(&size) => self.list.page_size = size,
                Ok(_) => Self::report_env_error(
                    strict,
                    warnings,
                    "TENANTDESK_PAGE_SIZE",
                    &val,
                    &format!("must be one of {:?}", PAGE_SIZE_OPTIONS),
                )?,
                Err(_) => Self::report_env_error(
                    strict,
                    warnings,
                    "TENANTDESK_PAGE_SIZE",
                    &val,
                    "expected a positive integer",
                )?,
            }
        }

        if let Ok(val) = std::env::var("TENANTDESK_TIMEOUT") {
            match val.parse::<u64>() {
                Ok(secs) if (MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&secs) => {
                    self.api.timeout_secs = secs;
                }
                _ => Self::report_env_error(
                    strict,
                    warnings,
                    "TENANTDESK_TIMEOUT",
                    &val,
                    &format!("expected {MIN_TIMEOUT_SECS}-{MAX_TIMEOUT_SECS} seconds"),
                )?,
            }
        }

        if let Ok(val) = std::env::var("TENANTDESK_THEME") {
            self.display.theme = val;
        }
        if let Ok(val) = std::env::var("TENANTDESK_EXPORT_DIR")
            && !val.is_empty()
        {
            self.export.directory = Some(PathBuf::from(val));
        }
        if std::env::var("TENANTDESK_NO_CLIPBOARD").is_ok() {
            self.behavior.copy_to_clipboard = false;
        }
        Ok(())
    }

    /// Report an environment variable error, failing if strict mode is enabled
    fn report_env_error(
        strict: bool,
        warnings: &mut Vec<String>,
        var_name: &str,
        value: &str,
        reason: &str,
    ) -> Result<(), String> {
        if strict {
            return Err(format!("Invalid value '{}' for {}: {}", value, var_name, reason));
        }
        warnings.push(format!(
            "Invalid value '{}' for {}, {} - using default",
            value, var_name, reason
        ));
        Ok(())
    }

    /// Directory where exports land
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export.directory.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let mut config = AppConfig::default();
        let warnings = config.validate(false).unwrap();
        assert!(warnings.is_empty(), "No warnings expected for defaults: {warnings:?}");
    }

    #[test]
    fn test_invalid_page_size_corrected() {
        let mut config = AppConfig::default();
        config.list.page_size = 33;
        let warnings = config.validate(false).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("list.page_size"));
        assert_eq!(config.list.page_size, ListConfig::default().page_size);
    }

    #[test]
    fn test_multiple_invalid_values() {
        let mut config = AppConfig::default();
        config.api.timeout_secs = 0;
        config.list.search_debounce_ms = 60_000;
        config.api.base_url = "localhost:3000".to_string();
        let warnings = config.validate(false).unwrap();
        assert_eq!(warnings.len(), 3);
        assert_eq!(config.api.timeout_secs, ApiConfig::default().timeout_secs);
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
    }

    #[test]
    fn test_strict_mode_error() {
        let mut config = AppConfig::default();
        config.api.timeout_secs = 0;
        let err = config.validate(true).unwrap_err();
        assert!(err.contains("api.timeout_secs"));
    }

    #[test]
    fn test_bad_date_format_corrected() {
        let mut config = AppConfig::default();
        config.display.date_format = "%Y-%Q".to_string();
        let warnings = config.validate(false).unwrap();
        assert!(warnings[0].contains("display.date_format"));
        assert_eq!(config.display.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let mut config = AppConfig::default();
        config.api.base_url = "https://api.example.com/api/".to_string();
        config.validate(false).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/api");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [list]
            page_size = 50

            [display]
            theme = "light"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.list.page_size, 50);
        assert_eq!(parsed.list.search_debounce_ms, 400);
        assert_eq!(parsed.display.theme, "light");
        assert_eq!(parsed.api.timeout_secs, 30);
    }
}
