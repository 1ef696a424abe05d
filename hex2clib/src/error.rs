//! The `error` module defines everything that can go wrong while converting an image.
//!
//! Two families of problems exist:
//! 1. Per-line problems found by the decoder. These never abort decoding; each one is
//!    reported as a [`Diagnostic`] (line number + [`DiagnosticKind`]) next to the image.
//!    A malformed record is described by [`RecordError`].
//! 2. Fatal problems of the surrounding I/O layer, described by [`CodecError`].

use std::collections::TryReserveError;
use std::error::Error;
use std::fmt;
use std::io;

/// Reasons a single Intel HEX line is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Record does not begin with a ':'
    MissingStartCode,
    /// Record contains non-hexadecimal characters
    ContainsInvalidCharacters,
    /// Record is shorter than the smallest valid
    RecordTooShort,
    /// Record is longer than the largest valid
    RecordTooLong,
    /// Record holds an odd number of hex digits
    RecordNotEvenLength,
    /// Declared byte count does not match the number of payload digits
    RecordInvalidPayloadLength,
    /// Payload would run past the end of the 64 KiB address space
    AddressOverflow(u16, u8),
    /// Record type is not one of 00..=05
    InvalidRecordType(u8),
    /// Record's payload length does not match the record type
    RecordLengthInvalidForType(u8, u8, u8),
    /// Record's address does not match the record type
    RecordAddressInvalidForType(u8, u16),
    /// Record checksum mismatch (expected, found)
    RecordChecksumMismatch(u8, u8),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartCode => write!(f, "missing start code ':'"),
            Self::ContainsInvalidCharacters => write!(f, "record contains invalid character(s)"),
            Self::RecordTooShort => write!(f, "record too short"),
            Self::RecordTooLong => write!(f, "record too long"),
            Self::RecordNotEvenLength => write!(f, "record with uneven number of hex digits"),
            Self::RecordInvalidPayloadLength => {
                write!(f, "payload size differs from record's byte count")
            }
            Self::AddressOverflow(address, count) => write!(
                f,
                "{count} bytes at 0x{address:04X} exceed the 64KB address space"
            ),
            Self::InvalidRecordType(rtype) => write!(f, "invalid record type 0x{rtype:02X}"),
            Self::RecordLengthInvalidForType(rtype, expected, actual) => write!(
                f,
                "for record type {rtype:02X} expected data length is {expected} bytes, found {actual}"
            ),
            Self::RecordAddressInvalidForType(rtype, actual) => write!(
                f,
                "for record type {rtype:02X} expected address is 0x0000, found 0x{actual:04X}"
            ),
            Self::RecordChecksumMismatch(expected, actual) => write!(
                f,
                "invalid record checksum - expected: 0x{expected:02X}, found: 0x{actual:02X}"
            ),
        }
    }
}

impl Error for RecordError {}

/// What a [`Diagnostic`] is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The line was skipped because it is not a valid record
    InvalidRecord(RecordError),
    /// Input ended before an end-of-file record was seen
    MissingEndOfFile,
    /// An extended segment/linear address record with a non-zero value was ignored
    ExtendedAddressIgnored(u32),
    /// A second start address record replaced the first one
    DuplicateStartAddress,
    /// A record of unknown type was skipped (lenient mode)
    UnsupportedRecordIgnored(u8),
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRecord(err) => write!(f, "invalid record: {err}"),
            Self::MissingEndOfFile => write!(f, "no EOF record"),
            Self::ExtendedAddressIgnored(offset) => {
                write!(f, "extended record (offset 0x{offset:X}) ignored")
            }
            Self::DuplicateStartAddress => write!(f, "second start address record"),
            Self::UnsupportedRecordIgnored(rtype) => {
                write!(f, "unsupported record type 0x{rtype:02X} ignored")
            }
        }
    }
}

/// A non-fatal problem found at a given line of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    #[must_use]
    pub const fn new(line: usize, kind: DiagnosticKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Warning (line {}): {}", self.line, self.kind)
    }
}

/// Unrecoverable failures. Decoding and encoding only fail when the underlying
/// reader/writer does, or when memory for the image cannot be reserved.
#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
    Allocation(TryReserveError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Allocation(err) => write!(f, "memory allocation: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Allocation(err) => Some(err),
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TryReserveError> for CodecError {
    fn from(err: TryReserveError) -> Self {
        Self::Allocation(err)
    }
}
