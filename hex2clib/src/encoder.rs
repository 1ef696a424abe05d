//! The `encoder` module writes an [`Image`] out in one of the supported formats.
//!
//! Every encoder only depends on the image and the [`EncoderOptions`] it was built with
//! and writes to any [`Write`] sink. A failing sink aborts the output immediately and
//! leaves whatever was already written in place.

use crate::error::CodecError;
use crate::image::Image;
use crate::record::{ADDRESS_SPACE, EOF_RECORD, Record, RecordType};
use std::io::{self, Read, Write};

const DEFAULT_HEX_WRAP: u8 = 16;
const DEFAULT_C_WRAP: u8 = 8;
const DEFAULT_PADDING: u8 = 4;
/// Width of one `0x00, ` item in the C listing
const C_ITEM_WIDTH: usize = 6;

/// Name of the array declared by the C listing unless configured otherwise.
pub const DEFAULT_ARRAY_NAME: &str = "hex2c";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Raw bytes
    Binary,
    /// Intel HEX records
    Hex,
    /// C include file with a byte array
    #[default]
    CListing,
    /// Plain text summary of the image
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    pub format: OutputFormat,
    /// Bytes per output line (0 = format default)
    pub wrap: u8,
    /// Leading spaces of the C listing lines (0 = default)
    pub padding: u8,
    /// If set, binary output is padded with this byte from address 0 up to the base address
    pub filler: Option<u8>,
    pub array_name: String,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            wrap: 0,
            padding: 0,
            filler: None,
            array_name: DEFAULT_ARRAY_NAME.to_string(),
        }
    }
}

const fn nonzero_or(value: u8, default: u8) -> usize {
    if value == 0 {
        default as usize
    } else {
        value as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncoderOptions,
}

impl Encoder {
    #[must_use]
    pub const fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Write `image` in the configured output format.
    ///
    /// # Errors
    /// Returns an error if the sink fails.
    ///
    /// # Example
    /// ```
    /// use hex2clib::{Decoder, Encoder, EncoderOptions, OutputFormat};
    ///
    /// let decoded = Decoder::default().decode_bytes(b":0300300002337A1E\n:00000001FF\n");
    /// let encoder = Encoder::new(EncoderOptions {
    ///     format: OutputFormat::Hex,
    ///     ..EncoderOptions::default()
    /// });
    ///
    /// let mut out = Vec::new();
    /// encoder.encode(&decoded.image, &mut out).unwrap();
    /// assert_eq!(out, b":0300300002337A1E\n:00000001FF\n");
    /// ```
    pub fn encode<W: Write>(&self, image: &Image, sink: &mut W) -> Result<(), CodecError> {
        match self.options.format {
            OutputFormat::Binary => self.write_binary(image, sink)?,
            OutputFormat::Hex => self.write_hex(image, sink)?,
            OutputFormat::CListing => self.write_listing(image, sink)?,
            OutputFormat::Info => self.write_info(image, sink)?,
        }
        sink.flush()?;
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    /// Write data records for the image payload, an optional start linear address
    /// record for the entry point, and the end-of-file record.
    ///
    /// Only the part of the image below 64 KiB is written.
    ///
    /// # Errors
    /// Returns an error if the sink fails.
    pub fn write_hex<W: Write>(&self, image: &Image, sink: &mut W) -> io::Result<()> {
        let wrap = nonzero_or(self.options.wrap, DEFAULT_HEX_WRAP);
        let base = image.base();
        let data = image.as_bytes();
        let len = data.len().min(ADDRESS_SPACE.saturating_sub(base));

        for (i, chunk) in data[..len].chunks(wrap).enumerate() {
            // base + len <= 64 KiB, so every chunk address fits in 16 bits
            let address = (base + i * wrap) as u16;
            let record =
                Record::create(address, RecordType::Data, chunk).map_err(io::Error::other)?;
            writeln!(sink, "{record}")?;
        }

        if image.entry() != 0 {
            let record = Record::create(
                0,
                RecordType::StartLinearAddress,
                &image.entry().to_be_bytes(),
            )
            .map_err(io::Error::other)?;
            writeln!(sink, "{record}")?;
        }

        writeln!(sink, "{EOF_RECORD}")
    }

    /// Write the image as a C array declaration.
    ///
    /// Each line starts with the configured padding and ends with a comment holding the
    /// offset of its first byte; the comments line up even on a short last line.
    ///
    /// # Errors
    /// Returns an error if the sink fails.
    ///
    /// # Example
    /// ```
    /// use hex2clib::{Encoder, Image};
    ///
    /// let mut out = Vec::new();
    /// Encoder::default().write_listing(&Image::from_binary(vec![0xAB]), &mut out).unwrap();
    ///
    /// let text = String::from_utf8(out).unwrap();
    /// assert!(text.contains("const uint8_t hex2c[1] = {"));
    /// assert!(text.contains("    0xab, "));
    /// ```
    pub fn write_listing<W: Write>(&self, image: &Image, sink: &mut W) -> io::Result<()> {
        let wrap = nonzero_or(self.options.wrap, DEFAULT_C_WRAP);
        let padding = nonzero_or(self.options.padding, DEFAULT_PADDING);
        let data = image.as_bytes();

        // Header
        writeln!(sink, "// Generated by hex2c from {}", image.format)?;
        if image.base() != 0 {
            writeln!(sink, "// base address: 0x{:04X}", image.base())?;
        }
        if image.entry() != 0 {
            writeln!(sink, "// entry point: 0x{:08X}", image.entry())?;
        }
        writeln!(
            sink,
            "const uint8_t {}[{}] = {{",
            self.options.array_name,
            data.len()
        )?;

        for (i, chunk) in data.chunks(wrap).enumerate() {
            // Leading space
            write!(sink, "{:padding$}", "")?;

            // Data
            for byte in chunk {
                write!(sink, "0x{byte:02x}, ")?;
            }

            // Trailing space keeps the offset comments in one column
            let trailing = ((wrap - chunk.len()) * C_ITEM_WIDTH + padding - 1).max(1);
            writeln!(sink, "{:trailing$}// {:03x}", "", i * wrap)?;
        }

        // Footer
        writeln!(sink, "}};")
    }

    /// Write the raw payload, preceded by `base` filler bytes if a filler is configured.
    ///
    /// # Errors
    /// Returns an error if the sink fails.
    pub fn write_binary<W: Write>(&self, image: &Image, sink: &mut W) -> io::Result<()> {
        if let Some(filler) = self.options.filler {
            io::copy(&mut io::repeat(filler).take(image.base() as u64), sink)?;
        }
        sink.write_all(image.as_bytes())
    }

    /// Write a short plain text description of the image.
    ///
    /// # Errors
    /// Returns an error if the sink fails.
    #[allow(clippy::unused_self)]
    pub fn write_info<W: Write>(&self, image: &Image, sink: &mut W) -> io::Result<()> {
        fn format_with_commas(n: usize) -> String {
            let s = n.to_string();
            s.as_bytes()
                .rchunks(3)
                .rev()
                .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(",")
        }

        writeln!(sink, "Input Format: {}", image.format)?;
        writeln!(sink, "Data Size:    {} bytes", format_with_commas(image.size()))?;
        if let Some((min, max)) = image.get_min_addr().zip(image.get_max_addr()) {
            writeln!(sink, "Range:        0x{min:04X} - 0x{max:04X}")?;
        }
        if image.entry() != 0 {
            writeln!(sink, "Entry Point:  0x{:08X}", image.entry())?;
        }
        Ok(())
    }
}
