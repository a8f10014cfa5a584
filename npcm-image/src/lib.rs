//! # npcm-image
//!
//! Wraps raw BootBlock and U-Boot binaries with the fixed 512-byte header
//! read by the NPCM boot ROM.
//!
//! ## Example
//!
//! ```rust
//! use npcm_image::{ImageBuilder, ImageHeader, HEADER_SIZE};
//!
//! let payload = [0xabu8; 10];
//! let image = ImageBuilder::bootblock()
//!     .version(0x0000_0201)
//!     .data(&payload)?
//!     .build()?;
//!
//! assert_eq!(image.len(), HEADER_SIZE + payload.len());
//! let header = ImageHeader::from_bytes(&image[..HEADER_SIZE])?;
//! assert_eq!(header.dest_addr, 0xfffd_5e00);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod image_header;
pub mod image_types;

// Re-export main types for convenience
pub use builder::{BLOCK_ALIGN, ImageBuilder, ParsedImage};
pub use config::{BuildConfig, ConfigKey, HeaderSettings};
pub use error::{ImageError, Result};
pub use image_header::{HEADER_SIZE, ImageHeader, LAYOUT_REVISION};
pub use image_types::ImageVariant;

/// Current version of the npcm-image implementation
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
