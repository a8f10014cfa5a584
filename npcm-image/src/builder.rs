//! Image builder for creating boot ROM images

use crate::config::{BuildConfig, ConfigKey};
use crate::error::{ImageError, Result};
use crate::file::{read_file, write_file};
use crate::image_header::{FILL_BYTE, HEADER_SIZE, ImageHeader};
use crate::image_types::ImageVariant;
use log::{debug, warn};
use std::io::Write;
use std::path::Path;

/// Images are padded to a multiple of this size when padding is enabled
pub const BLOCK_ALIGN: usize = 4096;

/// Number of fill bytes needed to align an image of `len` bytes
pub fn padding_len(len: usize) -> usize {
    (BLOCK_ALIGN - len % BLOCK_ALIGN) % BLOCK_ALIGN
}

/// Builder for creating boot ROM images
///
/// The variant is fixed at construction. Header fields that are not set
/// explicitly fall back to the defaults in [`crate::config`].
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    variant: ImageVariant,
    config: BuildConfig,
    data: Vec<u8>,
}

impl ImageBuilder {
    /// Create a new image builder for `variant`
    pub fn new(variant: ImageVariant) -> Self {
        Self {
            variant,
            config: BuildConfig::default(),
            data: Vec::new(),
        }
    }

    /// Create a boot block image builder
    pub fn bootblock() -> Self {
        Self::new(ImageVariant::BootBlock)
    }

    /// Create a U-Boot image builder
    pub fn uboot() -> Self {
        Self::new(ImageVariant::Uboot)
    }

    /// Replace the configuration overrides
    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the FIU0 direct read configuration
    pub fn fiu0_drd_cfg(mut self, value: u32) -> Self {
        self.config.set(ConfigKey::Fiu0DrdCfg, value as u64);
        self
    }

    /// Set the FIU clock divider
    pub fn fiu_clk_divider(mut self, value: u8) -> Self {
        self.config.set(ConfigKey::FiuClkDivider, value as u64);
        self
    }

    /// Set the image version word
    pub fn version(mut self, version: u32) -> Self {
        self.config.set(ConfigKey::Version, version as u64);
        self
    }

    /// Pad the image with 0xFF up to the next 4 KiB boundary
    pub fn pad_to_block(mut self, pad: bool) -> Self {
        self.config.pad = Some(pad);
        self
    }

    /// Set the payload (method that can return error)
    pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
        if u32::try_from(data.len()).is_err() {
            return Err(ImageError::field_overflow("code_size", data.len() as u64, 32));
        }

        self.data = data.to_vec();
        Ok(())
    }

    /// Set the payload
    pub fn data(mut self, data: &[u8]) -> Result<Self> {
        self.set_data(data)?;
        Ok(self)
    }

    /// Set the payload from a file
    pub fn data_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let data = read_file(path)?;
        self.set_data(&data)?;
        Ok(self)
    }

    /// Set the payload from a reader
    pub fn data_from_reader<R: std::io::Read>(mut self, reader: &mut R) -> Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        self.set_data(&buffer)?;
        Ok(self)
    }

    pub fn variant(&self) -> ImageVariant {
        self.variant
    }

    /// Get the current configuration overrides
    pub fn get_config(&self) -> &BuildConfig {
        &self.config
    }

    /// Get the current payload
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Construct the header for the current payload and configuration
    pub fn header(&self) -> Result<ImageHeader> {
        let settings = self.config.resolve(self.variant)?;

        for key in self.config.memory_overrides() {
            warn!(
                "'{}' is not encoded by header layout revision {} and will be ignored",
                key,
                crate::LAYOUT_REVISION
            );
        }

        let mut header = ImageHeader::for_variant(self.variant);
        header.fiu0_drd_cfg = settings.fiu0_drd_cfg;
        header.fiu_clk_divider = settings.fiu_clk_divider;
        header.code_size = u32::try_from(self.data.len())
            .map_err(|_| ImageError::field_overflow("code_size", self.data.len() as u64, 32))?;
        header.version = settings.version;

        debug!(
            "{} header: fiu0_drd_cfg=0x{:08x} fiu_clk_divider=0x{:02x} version=0x{:08x} code_size={}",
            self.variant,
            header.fiu0_drd_cfg,
            header.fiu_clk_divider,
            header.version,
            header.code_size
        );

        Ok(header)
    }

    fn padding(&self) -> Result<usize> {
        let pad = self.config.resolve(self.variant)?.pad;
        Ok(if pad {
            padding_len(HEADER_SIZE + self.data.len())
        } else {
            0
        })
    }

    /// Build the complete image
    ///
    /// Returns the header, the payload and any alignment padding.
    pub fn build(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let padding = self.padding()?;

        let mut image = Vec::with_capacity(HEADER_SIZE + self.data.len() + padding);

        // Write header
        header.write_to(&mut image)?;

        // Write data
        image.extend_from_slice(&self.data);

        image.resize(image.len() + padding, FILL_BYTE);

        debug!(
            "Image assembled: {} header + {} payload + {} padding bytes",
            HEADER_SIZE,
            self.data.len(),
            padding
        );

        Ok(image)
    }

    /// Build the image and write it to a file
    ///
    /// Nothing is written unless the image was assembled successfully.
    pub fn build_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image_data = self.build()?;
        write_file(path, &image_data)
    }

    /// Build the image and write it to a writer
    pub fn build_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let image_data = self.build()?;
        writer.write_all(&image_data)?;
        Ok(())
    }

    /// Split an existing image into header, payload and padding
    pub fn from_image(image_data: &[u8]) -> Result<ParsedImage> {
        if image_data.len() < HEADER_SIZE {
            return Err(ImageError::InvalidLength {
                expected: HEADER_SIZE,
                actual: image_data.len(),
            });
        }

        let header = ImageHeader::from_bytes(&image_data[..HEADER_SIZE])?;

        let data_start = HEADER_SIZE;
        let data_end = data_start + header.code_size as usize;

        if image_data.len() < data_end {
            return Err(ImageError::TruncatedImage {
                expected: header.code_size as usize,
                actual: image_data.len() - data_start,
            });
        }

        Ok(ParsedImage {
            header,
            payload: image_data[data_start..data_end].to_vec(),
            trailing: image_data.len() - data_end,
        })
    }
}

/// An image split back into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImage {
    pub header: ImageHeader,
    pub payload: Vec<u8>,
    /// Bytes after the payload, normally alignment padding
    pub trailing: usize,
}

impl ParsedImage {
    pub fn variant(&self) -> Option<ImageVariant> {
        self.header.variant()
    }

    /// Print image information
    pub fn print_info(&self) {
        println!("{}", self.header.summary());
        println!("Trailing Bytes: {}", self.trailing);
    }
}
