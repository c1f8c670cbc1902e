//! Configuration for the variant engine.
//!
//! Configuration is TOML, merged from three sources (later sources win):
//! - Bundled defaults (include_str! from verso.toml)
//! - `~/.config/verso/verso.toml`
//! - `./verso.toml`

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument};
use verso_core::{OptionPolicy, Partition};
use verso_error::{ConfigError, ConfigErrorKind, VersoError, VersoResult};

/// Descriptor normalisation settings.
///
/// ```toml
/// [descriptor]
/// strict = true
/// known_options = ["resize", "format", "ffmpeg_opts"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DescriptorConfig {
    /// Reject option names not listed in `known_options`
    #[serde(default)]
    pub strict: bool,

    /// Option names accepted in strict mode
    #[serde(default)]
    pub known_options: Vec<String>,
}

impl DescriptorConfig {
    /// The option policy these settings describe.
    pub fn policy(&self) -> OptionPolicy {
        if self.strict {
            OptionPolicy::strict(self.known_options.iter().cloned())
        } else {
            OptionPolicy::lenient()
        }
    }
}

/// Variant index settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Largest number of source ids sent in one batched lookup
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    500
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// Byte store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Filesystem root holding one directory per partition
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Partition new uploads land on when none is given
    #[serde(default = "default_partition")]
    pub default_partition: String,

    /// Every partition provisioned under `root`
    #[serde(default)]
    pub partitions: Vec<String>,
}

fn default_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("verso")
        .join("storage")
}

fn default_partition() -> String {
    "local".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            default_partition: default_partition(),
            partitions: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// The default partition.
    pub fn default_partition(&self) -> Partition {
        Partition::new(self.default_partition.as_str())
    }

    /// All provisioned partitions, the default one included.
    pub fn partitions(&self) -> Vec<Partition> {
        let mut partitions: Vec<Partition> =
            self.partitions.iter().map(|p| Partition::new(p.as_str())).collect();
        let default = self.default_partition();
        if !partitions.contains(&default) {
            partitions.insert(0, default);
        }
        partitions
    }
}

/// Metadata store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection URL; `DATABASE_URL` is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_pool_size() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: default_pool_size(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

/// Top-level verso configuration.
///
/// # Example
///
/// ```no_run
/// use verso_variants::VersoConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = VersoConfig::load()?;
/// println!("Batch size: {}", config.store.batch_size);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct VersoConfig {
    /// Descriptor normalisation
    #[serde(default)]
    pub descriptor: DescriptorConfig,

    /// Variant index
    #[serde(default)]
    pub store: StoreConfig,

    /// Byte store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Metadata store
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VersoConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> VersoResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                VersoError::from(ConfigError::new(ConfigErrorKind::Unreadable {
                    origin: path.as_ref().display().to_string(),
                    detail: e.to_string(),
                }))
            })?
            .try_deserialize()
            .map_err(|e| {
                VersoError::from(ConfigError::new(ConfigErrorKind::Invalid(e.to_string())))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped when absent.
    #[instrument]
    pub fn load() -> VersoResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../verso.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/verso/verso.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("verso").required(false));

        builder
            .build()
            .map_err(|e| {
                VersoError::from(ConfigError::new(ConfigErrorKind::Unreadable {
                    origin: "layered sources".to_string(),
                    detail: e.to_string(),
                }))
            })?
            .try_deserialize()
            .map_err(|e| {
                VersoError::from(ConfigError::new(ConfigErrorKind::Invalid(e.to_string())))
            })
    }

    /// The settings handed to a [`DerivationEngine`](crate::DerivationEngine).
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            policy: self.descriptor.policy(),
            batch_size: self.store.batch_size,
        }
    }
}

/// Settings a [`DerivationEngine`](crate::DerivationEngine) runs with.
///
/// # Example
///
/// ```
/// use verso_core::OptionPolicy;
/// use verso_variants::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .policy(OptionPolicy::strict(["resize"]))
///     .batch_size(100usize)
///     .build()
///     .unwrap();
/// assert_eq!(*config.batch_size(), 100);
/// assert!(config.policy().strict);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Getters, derive_setters::Setters, derive_builder::Builder,
)]
#[setters(prefix = "with_")]
#[builder(setter(into), default)]
pub struct EngineConfig {
    /// Which option names descriptors may carry
    policy: OptionPolicy,
    /// Largest number of source ids sent in one batched lookup
    batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: OptionPolicy::lenient(),
            batch_size: default_batch_size(),
        }
    }
}

impl EngineConfig {
    /// Start building a config from the defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}
