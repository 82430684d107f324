//! `quote.toml` configuration.
//!
//! Every section and key is optional; anything left out takes its default.
//! Command-line flags are applied on top with [`AppConfig::apply_overrides`].

use std::path::{Path, PathBuf};

use quote_core::db::DbConfig;
use quote_core::{DEFAULT_GST_RATE, DEFAULT_VALIDITY_DAYS, TermsConditions};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "quote.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub quotation: QuotationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "quotes.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotationConfig {
    pub validity_days: u32,
    pub default_gst_rate: Decimal,
    pub terms: TermsConditions,
}

impl Default for QuotationConfig {
    fn default() -> Self {
        Self {
            validity_days: DEFAULT_VALIDITY_DAYS,
            default_gst_rate: DEFAULT_GST_RATE,
            terms: TermsConditions::default(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults unless `required` is set, which is
    /// the case when the path was named explicitly on the command line.
    pub fn load(
        path: &Path,
        required: bool,
    ) -> Result<Self, ConfigError> {
        if !required && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.quotation.default_gst_rate < Decimal::ZERO {
            warn!(
                rate = %config.quotation.default_gst_rate,
                "negative default GST rate will be treated as zero"
            );
        }
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        overrides: Overrides,
    ) {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(connection_string) = overrides.connection_string {
            self.database.connection_string = connection_string;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.database.backend.clone(),
            connection_string: self.database.connection_string.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const FULL: &str = r#"
[database]
backend = "sqlite"
connection_string = "sqlite:/var/lib/quote/quotes.db"

[logging]
level = "debug"
file = "quote.log"

[quotation]
validity_days = 45
default_gst_rate = "12"

[quotation.terms]
validity = "45 days from the date of quotation"
delivery_time = "4 weeks"
warranty = "2 years onsite"
payment_terms = "50% advance, 50% on delivery"
"#;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database.connection_string, "quotes.db");
        assert_eq!(config.quotation.validity_days, 30);
        assert_eq!(config.quotation.default_gst_rate, dec!(18));
    }

    #[test]
    fn full_file_parses_every_section() {
        let config = AppConfig::from_toml_str(FULL).unwrap();

        assert_eq!(
            config.database.connection_string,
            "sqlite:/var/lib/quote/quotes.db"
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("quote.log")));
        assert_eq!(config.quotation.validity_days, 45);
        assert_eq!(config.quotation.default_gst_rate, dec!(12));
        assert_eq!(config.quotation.terms.warranty, "2 years onsite");
    }

    #[test]
    fn partial_terms_keep_remaining_defaults() {
        let config =
            AppConfig::from_toml_str("[quotation.terms]\nwarranty = \"3 years\"\n").unwrap();

        assert_eq!(config.quotation.terms.warranty, "3 years");
        assert_eq!(
            config.quotation.terms.payment_terms,
            TermsConditions::default().payment_terms
        );
    }

    #[test]
    fn numeric_gst_rate_is_accepted() {
        let config =
            AppConfig::from_toml_str("[quotation]\ndefault_gst_rate = 5\n").unwrap();

        assert_eq!(config.quotation.default_gst_rate, dec!(5));
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(AppConfig::from_toml_str("[quotation]\nvalidity_days = \"soon\"\n").is_err());
    }

    #[test]
    fn missing_optional_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/quote.toml"), false).unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_required_file_is_read_error() {
        let result = AppConfig::load(Path::new("/nonexistent/quote.toml"), true);

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = AppConfig::from_toml_str(FULL).unwrap();

        config.apply_overrides(Overrides {
            backend: None,
            connection_string: Some(":memory:".to_string()),
            log_level: Some("warn".to_string()),
        });

        let db = config.db_config();
        assert_eq!(db.backend, "sqlite");
        assert_eq!(db.connection_string, ":memory:");
        assert_eq!(config.logging.level, "warn");
    }
}
