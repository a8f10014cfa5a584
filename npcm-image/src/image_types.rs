//! Image variant definitions and per-variant header constants

use crate::error::{ImageError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// `BOOT.U.P` as a big-endian word, stored as `P.U.TOOB`
pub const BOOTBLOCK_START_TAG: u64 = 0x424f_4f54_aa55_0750;

/// Stored on disk as the ASCII bytes `UBOOTBLK`
pub const UBOOT_START_TAG: u64 = 0x4b4c_4254_4f4f_4255;

/// Load address of the boot block in internal RAM
pub const BOOTBLOCK_DEST_ADDR: u32 = 0xfffd_5e00;

/// Load address of U-Boot in DRAM
pub const UBOOT_DEST_ADDR: u32 = 0x0000_8000;

/// Version word the boot ROM expects in a boot block header
pub const BOOTBLOCK_VERSION: u32 = 0x0000_0201;

/// Boot stage carried by an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageVariant {
    /// First stage loaded by the boot ROM
    BootBlock,
    /// U-Boot, loaded by the boot block
    Uboot,
}

impl ImageVariant {
    pub const ALL: [ImageVariant; 2] = [ImageVariant::BootBlock, ImageVariant::Uboot];

    pub fn start_tag(self) -> u64 {
        match self {
            Self::BootBlock => BOOTBLOCK_START_TAG,
            Self::Uboot => UBOOT_START_TAG,
        }
    }

    pub fn dest_addr(self) -> u32 {
        match self {
            Self::BootBlock => BOOTBLOCK_DEST_ADDR,
            Self::Uboot => UBOOT_DEST_ADDR,
        }
    }

    /// Version word used when the caller does not supply one
    pub fn default_version(self) -> u32 {
        match self {
            Self::BootBlock => BOOTBLOCK_VERSION,
            Self::Uboot => 0,
        }
    }

    /// Map a decoded start tag back to its variant
    pub fn from_start_tag(tag: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.start_tag() == tag)
    }
}

impl FromStr for ImageVariant {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bootblock" | "boot-block" | "boot_block" => Ok(Self::BootBlock),
            "uboot" | "u-boot" => Ok(Self::Uboot),
            _ => Err(ImageError::UnknownVariant(s.to_string())),
        }
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BootBlock => "bootblock",
            Self::Uboot => "uboot",
        };
        write!(f, "{}", name)
    }
}
