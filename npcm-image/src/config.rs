//! Header configuration options
//!
//! Options come from three places, lowest precedence first: the built-in
//! defaults, an optional TOML file and the command line. Every option is kept
//! as `Option` until resolution so an explicit value equal to the default is
//! still an override.

use crate::error::{ImageError, Result};
use crate::image_types::ImageVariant;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default FIU0 direct read configuration
pub const DEFAULT_FIU0_DRD_CFG: u32 = 0x0301_11bc;

/// Default FIU clock divider
pub const DEFAULT_FIU_CLK_DIVIDER: u8 = 0x00;

/// Default memory controller frequency in MHz
pub const DEFAULT_MC_FREQ: u16 = 800;

/// Default CPU frequency in MHz
pub const DEFAULT_CPU_FREQ: u16 = 800;

/// Default memory controller configuration bits
pub const DEFAULT_MC_CFG: u8 = 0x01;

/// Recognized configuration options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    Fiu0DrdCfg,
    FiuClkDivider,
    McFreq,
    CpuFreq,
    McCfg,
    Version,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::Fiu0DrdCfg,
        ConfigKey::FiuClkDivider,
        ConfigKey::McFreq,
        ConfigKey::CpuFreq,
        ConfigKey::McCfg,
        ConfigKey::Version,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fiu0DrdCfg => "fiu0_drd_cfg",
            Self::FiuClkDivider => "fiu_clk_divider",
            Self::McFreq => "mc_freq",
            Self::CpuFreq => "cpu_freq",
            Self::McCfg => "mc_cfg",
            Self::Version => "version",
        }
    }

    /// Radix used when the value is given as text
    pub fn radix(self) -> u32 {
        match self {
            Self::McFreq | Self::CpuFreq => 10,
            _ => 16,
        }
    }

    /// Width of the destination field in bits
    pub fn bits(self) -> u32 {
        match self {
            Self::Fiu0DrdCfg | Self::Version => 32,
            Self::McFreq | Self::CpuFreq => 16,
            Self::FiuClkDivider | Self::McCfg => 8,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse an option value given as text
///
/// Hexadecimal options accept an optional `0x`/`0X` prefix. Width is not
/// checked here; that happens when the configuration is resolved.
pub fn parse_value(key: ConfigKey, value: &str) -> Result<u64> {
    let trimmed = value.trim();
    let digits = if key.radix() == 16 {
        trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed)
    } else {
        trimmed
    };

    // from_str_radix tolerates a leading '+'
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(key.radix())) {
        let kind = if key.radix() == 16 { "hexadecimal" } else { "decimal" };
        return Err(ImageError::config_parse(
            key.name(),
            value,
            format!("expected a {kind} number"),
        ));
    }

    u64::from_str_radix(digits, key.radix())
        .map_err(|e| ImageError::config_parse(key.name(), value, e.to_string()))
}

/// Overrides for the image header, all optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    pub fiu0_drd_cfg: Option<u64>,
    pub fiu_clk_divider: Option<u64>,
    pub mc_freq: Option<u64>,
    pub cpu_freq: Option<u64>,
    pub mc_cfg: Option<u64>,
    pub version: Option<u64>,
    pub pad: Option<bool>,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, key: ConfigKey) -> &mut Option<u64> {
        match key {
            ConfigKey::Fiu0DrdCfg => &mut self.fiu0_drd_cfg,
            ConfigKey::FiuClkDivider => &mut self.fiu_clk_divider,
            ConfigKey::McFreq => &mut self.mc_freq,
            ConfigKey::CpuFreq => &mut self.cpu_freq,
            ConfigKey::McCfg => &mut self.mc_cfg,
            ConfigKey::Version => &mut self.version,
        }
    }

    pub fn get(&self, key: ConfigKey) -> Option<u64> {
        match key {
            ConfigKey::Fiu0DrdCfg => self.fiu0_drd_cfg,
            ConfigKey::FiuClkDivider => self.fiu_clk_divider,
            ConfigKey::McFreq => self.mc_freq,
            ConfigKey::CpuFreq => self.cpu_freq,
            ConfigKey::McCfg => self.mc_cfg,
            ConfigKey::Version => self.version,
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: u64) {
        *self.slot_mut(key) = Some(value);
    }

    /// Parse `value` with the option's radix and store it
    pub fn set_str(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let parsed = parse_value(key, value)?;
        self.set(key, parsed);
        Ok(())
    }

    /// Overlay `other` on top of `self`; options set in `other` win
    pub fn merge(mut self, other: &BuildConfig) -> Self {
        for key in ConfigKey::ALL {
            if let Some(value) = other.get(key) {
                self.set(key, value);
            }
        }
        if other.pad.is_some() {
            self.pad = other.pad;
        }
        self
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigLoadError> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = BuildConfig {
            pad: file.pad,
            ..Default::default()
        };

        let entries = [
            (ConfigKey::Fiu0DrdCfg, file.fiu0_drd_cfg),
            (ConfigKey::FiuClkDivider, file.fiu_clk_divider),
            (ConfigKey::McFreq, file.mc_freq),
            (ConfigKey::CpuFreq, file.cpu_freq),
            (ConfigKey::McCfg, file.mc_cfg),
            (ConfigKey::Version, file.version),
        ];
        for (key, value) in entries {
            match value {
                Some(ConfigValue::Int(n)) => {
                    let n = u64::try_from(n).map_err(|_| {
                        ImageError::config_parse(key.name(), n.to_string(), "value is negative")
                    })?;
                    config.set(key, n);
                }
                Some(ConfigValue::Text(s)) => config.set_str(key, &s)?,
                None => {}
            }
        }

        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ImageError::config_file(path, e))?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigLoadError::Toml(e) => ImageError::config_file(path, e.message()),
            ConfigLoadError::Value(e) => e,
        })
    }

    /// Apply defaults and check every value against its field width
    pub fn resolve(&self, variant: ImageVariant) -> Result<HeaderSettings> {
        Ok(HeaderSettings {
            fiu0_drd_cfg: narrow(ConfigKey::Fiu0DrdCfg, self.fiu0_drd_cfg, DEFAULT_FIU0_DRD_CFG)?,
            fiu_clk_divider: narrow(
                ConfigKey::FiuClkDivider,
                self.fiu_clk_divider,
                DEFAULT_FIU_CLK_DIVIDER,
            )?,
            mc_freq: narrow(ConfigKey::McFreq, self.mc_freq, DEFAULT_MC_FREQ)?,
            cpu_freq: narrow(ConfigKey::CpuFreq, self.cpu_freq, DEFAULT_CPU_FREQ)?,
            mc_cfg: narrow(ConfigKey::McCfg, self.mc_cfg, DEFAULT_MC_CFG)?,
            version: narrow(ConfigKey::Version, self.version, variant.default_version())?,
            pad: self.pad.unwrap_or(false),
        })
    }

    /// Memory controller options that were set explicitly
    pub fn memory_overrides(&self) -> Vec<ConfigKey> {
        [ConfigKey::McFreq, ConfigKey::CpuFreq, ConfigKey::McCfg]
            .into_iter()
            .filter(|&key| self.get(key).is_some())
            .collect()
    }
}

fn narrow<T: TryFrom<u64>>(key: ConfigKey, value: Option<u64>, default: T) -> Result<T> {
    match value {
        Some(v) => T::try_from(v).map_err(|_| ImageError::field_overflow(key.name(), v, key.bits())),
        None => Ok(default),
    }
}

/// Fully resolved header settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSettings {
    pub fiu0_drd_cfg: u32,
    pub fiu_clk_divider: u8,
    pub mc_freq: u16,
    pub cpu_freq: u16,
    pub mc_cfg: u8,
    pub version: u32,
    pub pad: bool,
}

/// Failure while reading a TOML document
#[derive(thiserror::Error, Debug)]
pub enum ConfigLoadError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Value(#[from] ImageError),
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    fiu0_drd_cfg: Option<ConfigValue>,
    fiu_clk_divider: Option<ConfigValue>,
    mc_freq: Option<ConfigValue>,
    cpu_freq: Option<ConfigValue>,
    mc_cfg: Option<ConfigValue>,
    version: Option<ConfigValue>,
    pad: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ConfigValue {
    Int(i64),
    Text(String),
}
