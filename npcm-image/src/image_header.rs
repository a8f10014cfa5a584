//! Boot ROM image header structure and serialization
//!
//! Layout revision 1, 512 bytes, all integers little-endian:
//!
//! ```text
//! 0x000  start_tag        u64
//! 0x008  image_signature  [u8; 256]  0xFF fill
//! 0x108  fiu0_drd_cfg     u32
//! 0x10c  fiu_clk_divider  u8
//! 0x10d  reserved         [u8; 51]   0xFF fill
//! 0x140  dest_addr        u32
//! 0x144  code_size        u32
//! 0x148  version          u32
//! 0x14c  reserved_signed  [u8; 180]  0xFF fill
//! ```

use crate::error::{ImageError, Result};
use crate::image_types::ImageVariant;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Header layout revision produced and accepted by this crate
pub const LAYOUT_REVISION: u32 = 1;

/// Serialized header size in bytes
pub const HEADER_SIZE: usize = 512;

/// Size of the signature block (not computed, always filled)
pub const SIGNATURE_SIZE: usize = 256;

/// Size of the reserved block following `fiu_clk_divider`
pub const RESERVED_SIZE: usize = 51;

/// Size of the trailing reserved block
pub const RESERVED_SIGNED_SIZE: usize = 180;

/// Value written to every fill region
pub const FILL_BYTE: u8 = 0xff;

/// Boot ROM image header
///
/// Only the semantic fields are stored. The signature and reserved blocks
/// are regenerated on every write, so two headers with equal fields always
/// serialize to the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageHeader {
    /// Variant marker read by the boot ROM
    pub start_tag: u64,
    /// FIU0 direct read configuration
    pub fiu0_drd_cfg: u32,
    /// FIU clock divider
    pub fiu_clk_divider: u8,
    /// Address the payload is copied to
    pub dest_addr: u32,
    /// Payload length in bytes
    pub code_size: u32,
    /// Image version word
    pub version: u32,
}

impl ImageHeader {
    /// Create a zeroed header
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a header carrying the fixed fields of `variant`
    pub fn for_variant(variant: ImageVariant) -> Self {
        Self {
            start_tag: variant.start_tag(),
            dest_addr: variant.dest_addr(),
            ..Self::default()
        }
    }

    /// Variant named by the start tag, if it is a known one
    pub fn variant(&self) -> Option<ImageVariant> {
        ImageVariant::from_start_tag(self.start_tag)
    }

    /// Serialize the header to bytes
    ///
    /// The result is always exactly [`HEADER_SIZE`] bytes long.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the header to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.start_tag)?;
        writer.write_all(&[FILL_BYTE; SIGNATURE_SIZE])?;
        writer.write_u32::<LittleEndian>(self.fiu0_drd_cfg)?;
        writer.write_u8(self.fiu_clk_divider)?;
        writer.write_all(&[FILL_BYTE; RESERVED_SIZE])?;
        writer.write_u32::<LittleEndian>(self.dest_addr)?;
        writer.write_u32::<LittleEndian>(self.code_size)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_all(&[FILL_BYTE; RESERVED_SIGNED_SIZE])?;
        Ok(())
    }

    /// Deserialize the header from bytes
    ///
    /// `data` must be exactly [`HEADER_SIZE`] bytes. Fill regions are skipped
    /// without being checked.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != HEADER_SIZE {
            return Err(ImageError::InvalidLength {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let mut cursor = Cursor::new(data);

        let start_tag = cursor.read_u64::<LittleEndian>()?;
        cursor.seek(SeekFrom::Current(SIGNATURE_SIZE as i64))?;
        let fiu0_drd_cfg = cursor.read_u32::<LittleEndian>()?;
        let fiu_clk_divider = cursor.read_u8()?;
        cursor.seek(SeekFrom::Current(RESERVED_SIZE as i64))?;
        let dest_addr = cursor.read_u32::<LittleEndian>()?;
        let code_size = cursor.read_u32::<LittleEndian>()?;
        let version = cursor.read_u32::<LittleEndian>()?;

        Ok(Self {
            start_tag,
            fiu0_drd_cfg,
            fiu_clk_divider,
            dest_addr,
            code_size,
            version,
        })
    }

    /// Read the header from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header_data = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_data)?;
        Self::from_bytes(&header_data)
    }

    /// Header plus payload size, without padding
    pub fn total_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.code_size as u64
    }

    /// Get a summary of the header information
    pub fn summary(&self) -> String {
        let variant = self
            .variant()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        format!(
            "Variant: {} (start tag 0x{:016x})\n\
             Destination Address: 0x{:08x}\n\
             Code Size: {} bytes\n\
             Version: 0x{:08x}\n\
             FIU0 DRD Config: 0x{:08x} FIU Clock Divider: 0x{:02x}",
            variant,
            self.start_tag,
            self.dest_addr,
            self.code_size,
            self.version,
            self.fiu0_drd_cfg,
            self.fiu_clk_divider,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> ImageHeader {
        ImageHeader {
            start_tag: 0x0102_0304_0506_0708,
            fiu0_drd_cfg: 0x0a0b_0c0d,
            fiu_clk_divider: 0x5a,
            dest_addr: 0x1122_3344,
            code_size: 0x5566_7788,
            version: 0x99aa_bbcc,
        }
    }

    #[test]
    fn test_header_size_matches_layout() {
        assert_eq!(
            8 + SIGNATURE_SIZE + 4 + 1 + RESERVED_SIZE + 4 + 4 + 4 + RESERVED_SIGNED_SIZE,
            HEADER_SIZE
        );
    }

    #[test]
    fn test_header_serialization() {
        let header = sample_header();
        let bytes = header.to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let parsed = ImageHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_field_offsets() {
        let bytes = sample_header().to_bytes().unwrap();

        assert_eq!(&bytes[0x000..0x008], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
        assert!(bytes[0x008..0x108].iter().all(|&b| b == FILL_BYTE));
        assert_eq!(&bytes[0x108..0x10c], &[0x0d, 0x0c, 0x0b, 0x0a]);
        assert_eq!(bytes[0x10c], 0x5a);
        assert!(bytes[0x10d..0x140].iter().all(|&b| b == FILL_BYTE));
        assert_eq!(&bytes[0x140..0x144], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(&bytes[0x144..0x148], &[0x88, 0x77, 0x66, 0x55]);
        assert_eq!(&bytes[0x148..0x14c], &[0xcc, 0xbb, 0xaa, 0x99]);
        assert!(bytes[0x14c..].iter().all(|&b| b == FILL_BYTE));
    }

    #[test]
    fn test_fill_regions_not_propagated() {
        let mut bytes = sample_header().to_bytes().unwrap();
        bytes[0x010] = 0x00;
        bytes[0x120] = 0x00;
        bytes[0x1ff] = 0x00;

        let parsed = ImageHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, sample_header());
        assert_eq!(parsed.to_bytes().unwrap(), sample_header().to_bytes().unwrap());
    }

    #[test]
    fn test_zero_header_is_fixed_length() {
        let bytes = ImageHeader::new().to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert!(bytes[..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_length() {
        let bytes = sample_header().to_bytes().unwrap();

        for len in [0, HEADER_SIZE - 1, HEADER_SIZE + 1] {
            let mut data = bytes.clone();
            data.resize(len, 0);
            match ImageHeader::from_bytes(&data) {
                Err(ImageError::InvalidLength { expected, actual }) => {
                    assert_eq!(expected, HEADER_SIZE);
                    assert_eq!(actual, len);
                }
                other => panic!("expected InvalidLength, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_read_from() {
        let mut data = sample_header().to_bytes().unwrap();
        data.extend_from_slice(b"payload");

        let mut reader = Cursor::new(data);
        let parsed = ImageHeader::read_from(&mut reader).unwrap();
        assert_eq!(parsed, sample_header());
        assert_eq!(reader.position(), HEADER_SIZE as u64);
    }

    #[test]
    fn test_for_variant() {
        let header = ImageHeader::for_variant(ImageVariant::BootBlock);
        assert_eq!(header.start_tag, ImageVariant::BootBlock.start_tag());
        assert_eq!(header.dest_addr, 0xfffd5e00);
        assert_eq!(header.variant(), Some(ImageVariant::BootBlock));

        let header = ImageHeader::for_variant(ImageVariant::Uboot);
        assert_eq!(header.dest_addr, 0x00008000);
        assert_eq!(header.variant(), Some(ImageVariant::Uboot));
    }

    #[test]
    fn test_header_summary() {
        let mut header = ImageHeader::for_variant(ImageVariant::Uboot);
        header.code_size = 1024;
        let summary = header.summary();
        assert!(summary.contains("Variant: uboot"));
        assert!(summary.contains("Code Size: 1024 bytes"));

        assert!(sample_header().summary().contains("Variant: unknown"));
    }

    #[test]
    fn test_header_total_size() {
        let mut header = ImageHeader::default();
        header.code_size = 1024;
        assert_eq!(header.total_size(), HEADER_SIZE as u64 + 1024);
    }
}
