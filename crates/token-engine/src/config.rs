//! # Token Configuration
//!
//! Bootstrap parameters, consumed once by [`crate::TokenStore::bootstrap`].
//!
//! Loaded from defaults, environment variables (`LEDGER_*`) or a TOML file:
//!
//! ```toml
//! name = "Acme Security Token"
//! symbol = "ACME"
//! decimals = 18
//! granularity = 1
//! global_cap = "1000000000000000000000000"
//! admins = ["0x00000000000000000000000000000000000000a1"]
//! controllers = []
//!
//! [[partitions]]
//! label = "locked"
//! cap = 5000
//!
//! [[partitions]]
//! id = "0x0101010101010101010101010101010101010101010101010101010101010101"
//! ```

use serde::Deserialize;
use shared_types::{Amount, Identity, PartitionId};
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Partition registered during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSeed {
    pub id: PartitionId,
    /// `None` takes the remaining global budget.
    pub cap: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub granularity: Amount,
    pub global_cap: Amount,
    /// Identities granted ADMIN at bootstrap.
    pub admins: Vec<Identity>,
    /// Identities granted CONTROLLER at bootstrap.
    pub controllers: Vec<Identity>,
    pub partitions: Vec<PartitionSeed>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Partitioned Token".to_string(),
            symbol: "PTK".to_string(),
            decimals: 18,
            granularity: 1,
            global_cap: Amount::MAX,
            admins: Vec::new(),
            controllers: Vec::new(),
            partitions: Vec::new(),
        }
    }
}

/// Largest decimals value whose unit still fits in a `u128`.
pub const MAX_DECIMALS: u8 = 38;

impl TokenConfig {
    /// Defaults with a single administrator.
    pub fn with_admin(admin: Identity) -> Self {
        Self {
            admins: vec![admin],
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.granularity == 0 {
            return Err(invalid("granularity", "must be positive"));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(invalid(
                "decimals",
                format!("{} exceeds {}", self.decimals, MAX_DECIMALS),
            ));
        }
        if self.admins.is_empty() {
            return Err(invalid("admins", "at least one administrator is required"));
        }
        if self.admins.iter().chain(&self.controllers).any(Identity::is_zero) {
            return Err(invalid("admins", "the null identity cannot hold roles"));
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.partitions.iter().find(|p| !seen.insert(p.id)) {
            return Err(invalid("partitions", format!("{} listed twice", dup.id)));
        }
        Ok(())
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LEDGER_TOKEN_NAME`, `LEDGER_TOKEN_SYMBOL`: metadata
    /// - `LEDGER_DECIMALS` (default: 18)
    /// - `LEDGER_GRANULARITY` (default: 1)
    /// - `LEDGER_GLOBAL_CAP` (default: unlimited)
    /// - `LEDGER_ADMINS`, `LEDGER_CONTROLLERS`: comma separated hex identities
    /// - `LEDGER_PARTITIONS`: comma separated `label[:cap]` entries
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            name: env::var("LEDGER_TOKEN_NAME").unwrap_or(defaults.name),
            symbol: env::var("LEDGER_TOKEN_SYMBOL").unwrap_or(defaults.symbol),
            decimals: env_parse("LEDGER_DECIMALS", "decimals")?.unwrap_or(defaults.decimals),
            granularity: env_parse("LEDGER_GRANULARITY", "granularity")?
                .unwrap_or(defaults.granularity),
            global_cap: env_parse("LEDGER_GLOBAL_CAP", "global_cap")?
                .unwrap_or(defaults.global_cap),
            admins: env_identities("LEDGER_ADMINS", "admins")?,
            controllers: env_identities("LEDGER_CONTROLLERS", "controllers")?,
            partitions: match env::var("LEDGER_PARTITIONS") {
                Ok(raw) => parse_partition_list(&raw)?,
                Err(_) => Vec::new(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string. Missing keys keep defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let defaults = Self::default();

        let partitions = file
            .partitions
            .iter()
            .map(PartitionEntry::resolve)
            .collect::<Result<Vec<_>, _>>()?;

        let config = Self {
            name: file.name.unwrap_or(defaults.name),
            symbol: file.symbol.unwrap_or(defaults.symbol),
            decimals: file.decimals.unwrap_or(defaults.decimals),
            granularity: match file.granularity {
                Some(v) => v.resolve("granularity")?,
                None => defaults.granularity,
            },
            global_cap: match file.global_cap {
                Some(v) => v.resolve("global_cap")?,
                None => defaults.global_cap,
            },
            admins: parse_identities(&file.admins, "admins")?,
            controllers: parse_identities(&file.controllers, "controllers")?,
            partitions,
        };
        config.validate()?;
        Ok(config)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn env_parse<T: std::str::FromStr>(
    var: &str,
    field: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(field, e.to_string())),
        Err(_) => Ok(None),
    }
}

fn env_identities(var: &str, field: &'static str) -> Result<Vec<Identity>, ConfigError> {
    match env::var(var) {
        Ok(raw) => {
            let items: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            parse_identities(&items, field)
        }
        Err(_) => Ok(Vec::new()),
    }
}

fn parse_identities(items: &[String], field: &'static str) -> Result<Vec<Identity>, ConfigError> {
    items
        .iter()
        .map(|s| {
            s.parse::<Identity>()
                .map_err(|e| invalid(field, format!("{}: {}", s, e)))
        })
        .collect()
}

/// `label[:cap],label[:cap]`
fn parse_partition_list(raw: &str) -> Result<Vec<PartitionSeed>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (label, cap) = match entry.split_once(':') {
                Some((label, cap)) => {
                    let cap = cap
                        .trim()
                        .parse::<Amount>()
                        .map_err(|e| invalid("partitions", format!("{}: {}", entry, e)))?;
                    (label.trim(), Some(cap))
                }
                None => (entry, None),
            };
            Ok(PartitionSeed {
                id: PartitionId::from_label(label),
                cap,
            })
        })
        .collect()
}

// ============================================================================
// File format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    name: Option<String>,
    symbol: Option<String>,
    decimals: Option<u8>,
    granularity: Option<AmountValue>,
    global_cap: Option<AmountValue>,
    #[serde(default)]
    admins: Vec<String>,
    #[serde(default)]
    controllers: Vec<String>,
    #[serde(default)]
    partitions: Vec<PartitionEntry>,
}

/// TOML integers stop at `i64`; larger amounts are written as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AmountValue {
    Number(u64),
    Text(String),
}

impl AmountValue {
    fn resolve(&self, field: &'static str) -> Result<Amount, ConfigError> {
        match self {
            Self::Number(n) => Ok(Amount::from(*n)),
            Self::Text(s) => s
                .trim()
                .replace('_', "")
                .parse()
                .map_err(|e| invalid(field, format!("{}: {}", s, e))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartitionEntry {
    label: Option<String>,
    id: Option<String>,
    cap: Option<AmountValue>,
}

impl PartitionEntry {
    fn resolve(&self) -> Result<PartitionSeed, ConfigError> {
        let id = match (&self.label, &self.id) {
            (Some(label), None) => PartitionId::from_label(label),
            (None, Some(hex)) => hex
                .parse()
                .map_err(|e| invalid("partitions", format!("{}: {}", hex, e)))?,
            _ => {
                return Err(invalid(
                    "partitions",
                    "each partition needs exactly one of `label` or `id`",
                ))
            }
        };
        let cap = self
            .cap
            .as_ref()
            .map(|c| c.resolve("partitions.cap"))
            .transpose()?;
        Ok(PartitionSeed { id, cap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: &str = "0x00000000000000000000000000000000000000a1";

    #[test]
    fn test_default_config_needs_admin() {
        let config = TokenConfig::default();
        assert_eq!(config.decimals, 18);
        assert_eq!(config.granularity, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "admins", .. })
        ));
    }

    #[test]
    fn test_with_admin_is_valid() {
        let admin: Identity = ADMIN.parse().unwrap();
        assert!(TokenConfig::with_admin(admin).validate().is_ok());
    }

    #[test]
    fn test_zero_granularity_rejected() {
        let config = TokenConfig {
            granularity: 0,
            ..TokenConfig::with_admin(ADMIN.parse().unwrap())
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "granularity",
                ..
            })
        ));
    }

    #[test]
    fn test_null_admin_rejected() {
        let config = TokenConfig::with_admin(Identity::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_parse() {
        let toml = r#"
            name = "Acme"
            symbol = "ACME"
            granularity = 2
            global_cap = "340282366920938463463374607431768211455"
            admins = ["0x00000000000000000000000000000000000000a1"]

            [[partitions]]
            label = "locked"
            cap = 5000

            [[partitions]]
            label = "unlocked"
        "#;
        let config = TokenConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.name, "Acme");
        assert_eq!(config.granularity, 2);
        assert_eq!(config.global_cap, Amount::MAX);
        assert_eq!(config.admins.len(), 1);
        assert_eq!(
            config.partitions,
            vec![
                PartitionSeed {
                    id: PartitionId::from_label("locked"),
                    cap: Some(5000)
                },
                PartitionSeed {
                    id: PartitionId::from_label("unlocked"),
                    cap: None
                },
            ]
        );
    }

    #[test]
    fn test_toml_rejects_bad_identity() {
        let toml = r#"admins = ["0x1234"]"#;
        assert!(matches!(
            TokenConfig::from_toml_str(toml),
            Err(ConfigError::Invalid { field: "admins", .. })
        ));
    }

    #[test]
    fn test_toml_rejects_ambiguous_partition() {
        let toml = r#"
            admins = ["0x00000000000000000000000000000000000000a1"]
            [[partitions]]
            label = "a"
            id = "0x0101010101010101010101010101010101010101010101010101010101010101"
        "#;
        assert!(TokenConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_toml_syntax_error() {
        assert!(matches!(
            TokenConfig::from_toml_str("name = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_partition_list_parse() {
        let seeds = parse_partition_list("locked:100, unlocked").unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].cap, Some(100));
        assert_eq!(seeds[1].id, PartitionId::from_label("unlocked"));
        assert!(parse_partition_list("locked:lots").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            TokenConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
