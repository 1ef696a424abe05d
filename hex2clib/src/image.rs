//! The `image` module provides the [`Image`] struct, the in-memory result of decoding.
//!
//! An image is a run of bytes located at a base address, plus the entry point found
//! in the input (if any). Memory is allocated lazily: the backing buffer only grows up
//! to the highest address written so far, and cells nobody wrote hold the filler byte.

use crate::error::CodecError;
use std::fmt;
use std::io::Read;

/// Default value of cells that no record wrote.
pub const DEFAULT_FILLER: u8 = 0xFF;

/// Format the image was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    IntelHex,
    Binary,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntelHex => write!(f, "Intel HEX"),
            Self::Binary => write!(f, "Binary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Format of the input the image was built from
    pub format: InputFormat,
    /// Value of unwritten cells
    filler: u8,
    /// Memory from address 0 up to the highest written address
    memory: Vec<u8>,
    /// Lowest written address
    base: usize,
    /// Entry point (0 = none)
    entry: u32,
}

impl Default for Image {
    fn default() -> Self {
        Self::new(DEFAULT_FILLER)
    }
}

impl Image {
    /// Creates an empty Intel HEX image whose unwritten cells hold `filler`.
    ///
    /// # Examples
    /// ```
    /// use hex2clib::Image;
    ///
    /// let image = Image::new(0x00);
    /// assert!(image.is_empty());
    /// assert_eq!(image.filler(), 0x00);
    /// ```
    #[must_use]
    pub const fn new(filler: u8) -> Self {
        Self {
            format: InputFormat::IntelHex,
            filler,
            memory: Vec::new(),
            base: 0,
            entry: 0,
        }
    }

    /// Creates an image holding `bytes` at address 0.
    ///
    /// # Example
    /// ```
    /// use hex2clib::{Image, InputFormat};
    ///
    /// let image = Image::from_binary(vec![0xDE, 0xAD]);
    /// assert_eq!(image.format, InputFormat::Binary);
    /// assert_eq!(image.as_bytes(), &[0xDE, 0xAD]);
    /// ```
    #[must_use]
    pub const fn from_binary(bytes: Vec<u8>) -> Self {
        Self {
            format: InputFormat::Binary,
            filler: DEFAULT_FILLER,
            memory: bytes,
            base: 0,
            entry: 0,
        }
    }

    /// Reads a raw binary image. `size_hint` bytes are reserved up front.
    ///
    /// # Errors
    /// Returns an error if the reservation fails or the reader does.
    pub fn from_reader<R: Read>(mut reader: R, size_hint: usize) -> Result<Self, CodecError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size_hint)?;
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_binary(bytes))
    }

    /// Copy `data` into memory at `address`. Later writes replace earlier ones.
    pub(crate) fn write(&mut self, address: u16, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let start = usize::from(address);
        let end = start + data.len();

        if self.memory.is_empty() || start < self.base {
            self.base = start;
        }
        if end > self.memory.len() {
            self.memory.resize(end, self.filler);
        }
        self.memory[start..end].copy_from_slice(data);
    }

    pub(crate) const fn set_entry(&mut self, entry: u32) {
        self.entry = entry;
    }

    /// Number of bytes between the base address and the highest written address.
    #[must_use]
    pub fn size(&self) -> usize {
        self.memory.len().saturating_sub(self.base)
    }

    /// `true` if nothing was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Lowest written address.
    #[must_use]
    pub const fn base(&self) -> usize {
        self.base
    }

    /// One past the highest written address.
    #[must_use]
    pub fn end(&self) -> usize {
        self.memory.len()
    }

    /// Entry point from a start address record, 0 if there was none.
    #[must_use]
    pub const fn entry(&self) -> u32 {
        self.entry
    }

    #[must_use]
    pub const fn filler(&self) -> u8 {
        self.filler
    }

    /// The payload, i.e. memory from the base address on.
    ///
    /// # Example
    /// ```
    /// use hex2clib::Decoder;
    ///
    /// let decoded = Decoder::default().decode_bytes(b":0300300002337A1E\n:00000001FF\n");
    /// assert_eq!(decoded.image.base(), 0x30);
    /// assert_eq!(decoded.image.as_bytes(), &[0x02, 0x33, 0x7A]);
    /// ```
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.memory[self.base..]
    }

    /// Get byte at the provided address. Gaps between records read as the filler.
    #[must_use]
    pub fn get_byte(&self, address: usize) -> Option<u8> {
        if address < self.base {
            return None;
        }
        self.memory.get(address).copied()
    }

    /// Get the smallest address holding data.
    #[must_use]
    pub fn get_min_addr(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.base)
        }
    }

    /// Get the highest address holding data.
    #[must_use]
    pub fn get_max_addr(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.memory.len() - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tracks_base_and_size() {
        // Arrange
        let mut image = Image::new(DEFAULT_FILLER);

        // Act
        image.write(0x30, &[0x02, 0x33, 0x7A]);

        // Assert
        assert_eq!(image.base(), 0x30);
        assert_eq!(image.end(), 0x33);
        assert_eq!(image.size(), 3);
        assert_eq!(image.as_bytes(), &[0x02, 0x33, 0x7A]);
    }

    #[test]
    fn test_write_lower_address_moves_base() {
        // Arrange
        let mut image = Image::new(0xAA);
        image.write(0x10, &[0x01, 0x02]);

        // Act
        image.write(0x08, &[0x03]);

        // Assert
        assert_eq!(image.base(), 0x08);
        assert_eq!(image.size(), 10);
        assert_eq!(
            image.as_bytes(),
            &[0x03, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x01, 0x02]
        );
    }

    #[test]
    fn test_write_overlap_last_wins() {
        // Arrange
        let mut image = Image::default();
        image.write(0x00, &[0x11, 0x22, 0x33]);

        // Act
        image.write(0x01, &[0x44]);

        // Assert
        assert_eq!(image.as_bytes(), &[0x11, 0x44, 0x33]);
    }

    #[test]
    fn test_write_empty_payload_is_ignored() {
        let mut image = Image::default();
        image.write(0x1234, &[]);
        assert!(image.is_empty());
        assert_eq!(image.base(), 0);
    }

    #[test]
    fn test_write_top_of_address_space() {
        let mut image = Image::default();
        image.write(0xFFFE, &[0x01, 0x02]);
        assert_eq!(image.end(), 0x1_0000);
        assert_eq!(image.get_max_addr(), Some(0xFFFF));
    }

    #[test]
    fn test_get_byte_valid() {
        // Arrange
        let mut image = Image::new(0x00);
        image.write(0x1234, &[0xFF]);

        // Act
        let byte = image.get_byte(0x1234);

        // Assert
        assert_eq!(byte, Some(0xFF));
    }

    #[test]
    fn test_get_byte_invalid() {
        // Arrange
        let mut image = Image::new(0x00);
        image.write(0x1234, &[0xFF]);

        // Act & Assert
        assert!(image.get_byte(0x1233).is_none());
        assert!(image.get_byte(0x1235).is_none());
    }

    #[test]
    fn test_get_min_and_max_addr() {
        // Arrange
        let mut image = Image::default();

        // Assert - empty
        assert!(image.get_min_addr().is_none());
        assert!(image.get_max_addr().is_none());

        // Act
        image.write(10, &[0; 11]);

        // Assert
        assert_eq!(image.get_min_addr(), Some(10));
        assert_eq!(image.get_max_addr(), Some(20));
    }

    #[test]
    fn test_from_reader() {
        // Arrange
        let bytes: &[u8] = &[0x01, 0x02, 0x03];

        // Act
        let res = Image::from_reader(bytes, bytes.len());

        // Assert
        let image = res.unwrap_or_default();
        assert_eq!(image.format, InputFormat::Binary);
        assert_eq!(image.base(), 0);
        assert_eq!(image.as_bytes(), bytes);
    }
}
