//! # `hex2clib`
//!
//! `hex2clib` converts between Intel HEX, raw binary images and C include files.
//!
//! The library provides:
//! - Record parser and validator for Intel HEX lines (via [`Record`]).
//! - Decoder assembling a 64 KiB memory [`Image`] from Intel HEX text (via [`Decoder`]),
//!   reporting skipped lines as [`Diagnostic`]s instead of failing.
//! - Encoder writing an image as binary, Intel HEX, a C array or an info summary
//!   (via [`Encoder`]).
//!
//! ## Example
//!
//! ```
//! use hex2clib::{Decoder, Encoder, EncoderOptions, OutputFormat};
//!
//! let decoded = Decoder::default().decode_bytes(b":0300300002337A1E\n:00000001FF\n");
//! for warning in &decoded.diagnostics {
//!     eprintln!("{warning}");
//! }
//!
//! let encoder = Encoder::new(EncoderOptions {
//!     format: OutputFormat::CListing,
//!     ..EncoderOptions::default()
//! });
//! let mut out = Vec::new();
//! encoder.encode(&decoded.image, &mut out).unwrap();
//! ```

mod decoder;
mod encoder;
mod error;
mod image;
mod record;

// Public APIs
pub use decoder::{DecodeMode, Decoded, Decoder, DecoderOptions};
pub use encoder::{DEFAULT_ARRAY_NAME, Encoder, EncoderOptions, OutputFormat};
pub use error::{CodecError, Diagnostic, DiagnosticKind, RecordError};
pub use image::{DEFAULT_FILLER, Image, InputFormat};
pub use record::{ADDRESS_SPACE, EOF_RECORD, Record, RecordType, checksum};
