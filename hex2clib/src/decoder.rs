//! The `decoder` module turns Intel HEX text into an [`Image`].
//!
//! Decoding never stops on a bad line: the line is skipped and a [`Diagnostic`] is
//! collected instead. The first end-of-file record terminates decoding, everything
//! after it is left unread.

use crate::error::{CodecError, Diagnostic, DiagnosticKind};
use crate::image::{DEFAULT_FILLER, Image};
use crate::record::{Record, RecordType, sizes};
use std::io::{BufRead, Read};
use std::ops::ControlFlow;

/// Longest line read into memory: the largest record plus CR and LF.
const LINE_LIMIT: usize = sizes::LARGEST_RECORD + 2;

/// How records outside the plain data / end-of-file pair are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Unknown record types are invalid; address and start records must be well formed.
    #[default]
    Strict,
    /// Unknown record types are skipped with a warning; shape checks are relaxed.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    pub mode: DecodeMode,
    /// Value of cells between records
    pub filler: u8,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            mode: DecodeMode::Strict,
            filler: DEFAULT_FILLER,
        }
    }
}

/// Result of decoding: the image and every warning raised on the way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decoded {
    pub image: Image,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecoderOptions,
}

impl Decoder {
    #[must_use]
    pub const fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    /// Decode lines from `reader` until an end-of-file record or the end of input.
    ///
    /// Lines are read through a buffer bounded by the longest valid record; anything
    /// longer is discarded up to its newline and reported as too long.
    ///
    /// # Errors
    /// Returns an error only if reading fails.
    ///
    /// # Example
    /// ```
    /// use hex2clib::Decoder;
    /// use std::io::Cursor;
    ///
    /// let input = Cursor::new(":0300300002337A1E\r\n:00000001FF\r\n");
    /// let decoded = Decoder::default().decode(input).unwrap();
    ///
    /// assert_eq!(decoded.image.size(), 3);
    /// assert!(decoded.diagnostics.is_empty());
    /// ```
    pub fn decode<R: BufRead>(&self, mut reader: R) -> Result<Decoded, CodecError> {
        let mut assembler = Assembler::new(self.options);
        let mut line = Vec::with_capacity(LINE_LIMIT);

        loop {
            line.clear();
            let n = (&mut reader)
                .take(LINE_LIMIT as u64)
                .read_until(b'\n', &mut line)?;
            if n == 0 {
                return Ok(assembler.finish(false));
            }
            if n == LINE_LIMIT && line.last() != Some(&b'\n') {
                reader.skip_until(b'\n')?;
            }
            if assembler.push(&line).is_break() {
                return Ok(assembler.finish(true));
            }
        }
    }

    /// Decode an in-memory buffer. Same semantics as [`Decoder::decode`].
    ///
    /// # Example
    /// ```
    /// use hex2clib::{DiagnosticKind, Decoder};
    ///
    /// let decoded = Decoder::default().decode_bytes(b":0300300002337A1E\n");
    ///
    /// assert_eq!(decoded.image.as_bytes(), &[0x02, 0x33, 0x7A]);
    /// assert_eq!(decoded.diagnostics[0].kind, DiagnosticKind::MissingEndOfFile);
    /// ```
    #[must_use]
    pub fn decode_bytes(&self, bytes: &[u8]) -> Decoded {
        let mut assembler = Assembler::new(self.options);

        for line in bytes.split_inclusive(|&b| b == b'\n') {
            if assembler.push(line).is_break() {
                return assembler.finish(true);
            }
        }
        assembler.finish(false)
    }
}

/// Decoding state while lines are fed in.
struct Assembler {
    options: DecoderOptions,
    image: Image,
    diagnostics: Vec<Diagnostic>,
    line_no: usize,
    has_entry: bool,
}

impl Assembler {
    const fn new(options: DecoderOptions) -> Self {
        Self {
            options,
            image: Image::new(options.filler),
            diagnostics: Vec::new(),
            line_no: 0,
            has_entry: false,
        }
    }

    fn warn(&mut self, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic::new(self.line_no, kind));
    }

    /// Feed one line. Breaks on the end-of-file record.
    fn push(&mut self, line: &[u8]) -> ControlFlow<()> {
        self.line_no += 1;

        let record = match Record::parse(line, self.options.mode) {
            Ok(record) => record,
            Err(err) => {
                self.warn(DiagnosticKind::InvalidRecord(err));
                return ControlFlow::Continue(());
            }
        };

        match record.rtype {
            RecordType::Data => {
                // Record::parse guarantees address + length <= 64 KiB
                self.image.write(record.address, &record.data);
            }
            RecordType::EndOfFile => return ControlFlow::Break(()),
            RecordType::ExtendedSegmentAddress | RecordType::ExtendedLinearAddress => {
                match record.extended_offset() {
                    Some(0) => {}
                    Some(offset) => self.warn(DiagnosticKind::ExtendedAddressIgnored(offset)),
                    None => self.warn(DiagnosticKind::UnsupportedRecordIgnored(
                        record.rtype.code(),
                    )),
                }
            }
            RecordType::StartSegmentAddress | RecordType::StartLinearAddress => {
                if let Some(entry) = record.start_address() {
                    if self.has_entry {
                        self.warn(DiagnosticKind::DuplicateStartAddress);
                    }
                    self.image.set_entry(entry);
                    self.has_entry = true;
                } else {
                    self.warn(DiagnosticKind::UnsupportedRecordIgnored(
                        record.rtype.code(),
                    ));
                }
            }
            RecordType::Unknown(code) => self.warn(DiagnosticKind::UnsupportedRecordIgnored(code)),
        }

        ControlFlow::Continue(())
    }

    fn finish(mut self, found_eof: bool) -> Decoded {
        if !found_eof {
            self.line_no += 1;
            self.warn(DiagnosticKind::MissingEndOfFile);
        }
        Decoded {
            image: self.image,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordError;
    use std::io::{BufReader, Cursor};

    fn decode_strict(input: &str) -> Decoded {
        Decoder::default().decode_bytes(input.as_bytes())
    }

    #[test]
    fn test_decode_single_record() {
        // Act
        let decoded = decode_strict(":0300300002337A1E\n:00000001FF\n");

        // Assert
        assert!(decoded.diagnostics.is_empty());
        assert_eq!(decoded.image.base(), 0x30);
        assert_eq!(decoded.image.get_byte(0x30), Some(0x02));
        assert_eq!(decoded.image.get_byte(0x32), Some(0x7A));
        assert_eq!(decoded.image.as_bytes(), &[0x02, 0x33, 0x7A]);
    }

    #[test]
    fn test_decode_skips_invalid_line() {
        // Arrange - second line has its checksum flipped
        let input = ":0300300002337A1E\n:0300330002337A1F\n:00000001FF\n";

        // Act
        let decoded = decode_strict(input);

        // Assert
        assert_eq!(decoded.image.as_bytes(), &[0x02, 0x33, 0x7A]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(
                2,
                DiagnosticKind::InvalidRecord(RecordError::RecordChecksumMismatch(0x1B, 0x1F))
            )]
        );
    }

    #[test]
    fn test_decode_stops_at_eof_record() {
        // Arrange
        let input = ":0100000011EE\n:00000001FF\n:0100010022DC\n";

        // Act
        let decoded = decode_strict(input);

        // Assert
        assert!(decoded.diagnostics.is_empty());
        assert_eq!(decoded.image.as_bytes(), &[0x11]);
        assert_eq!(decoded.image.get_byte(0x01), None);
    }

    #[test]
    fn test_decode_missing_eof_record() {
        // Act
        let decoded = decode_strict(":0100000011EE\n:0100010022DC\n");

        // Assert
        assert_eq!(decoded.image.as_bytes(), &[0x11, 0x22]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(3, DiagnosticKind::MissingEndOfFile)]
        );
    }

    #[test]
    fn test_decode_empty_input() {
        let decoded = decode_strict("");
        assert!(decoded.image.is_empty());
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(1, DiagnosticKind::MissingEndOfFile)]
        );

        let decoded = decode_strict(":00000001FF\n");
        assert!(decoded.image.is_empty());
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn test_decode_blank_line_is_invalid() {
        let decoded = decode_strict(":0100000011EE\n\n:00000001FF\n");
        assert_eq!(decoded.image.size(), 1);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(
                2,
                DiagnosticKind::InvalidRecord(RecordError::MissingStartCode)
            )]
        );
    }

    #[test]
    fn test_decode_gap_is_filled() {
        // Arrange
        let options = DecoderOptions {
            mode: DecodeMode::Strict,
            filler: 0x00,
        };

        // Act
        let decoded =
            Decoder::new(options).decode_bytes(b":0100000011EE\n:0100030022DA\n:00000001FF\n");

        // Assert
        assert_eq!(decoded.image.as_bytes(), &[0x11, 0x00, 0x00, 0x22]);
    }

    #[test]
    fn test_decode_start_linear_address() {
        let decoded = decode_strict(":0100000011EE\n:0400000500001234B1\n:00000001FF\n");
        assert!(decoded.diagnostics.is_empty());
        assert_eq!(decoded.image.entry(), 0x1234);
    }

    #[test]
    fn test_decode_duplicate_start_address() {
        let decoded = decode_strict(
            ":0400000500001234B1\n:0400000300100002E7\n:00000001FF\n",
        );
        assert_eq!(decoded.image.entry(), 0x102);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(2, DiagnosticKind::DuplicateStartAddress)]
        );
    }

    #[test]
    fn test_decode_extended_address() {
        // Zero offset is silently accepted, non-zero offset is reported
        let decoded = decode_strict(
            ":020000040000FA\n:0100000011EE\n:020000040001F9\n:0100000022DD\n:00000001FF\n",
        );
        assert_eq!(decoded.image.as_bytes(), &[0x22]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(
                3,
                DiagnosticKind::ExtendedAddressIgnored(0x1_0000)
            )]
        );
    }

    #[test]
    fn test_decode_unknown_type_strict_vs_lenient() {
        // Arrange
        let input = b":00000006FA\n:00000001FF\n";
        let lenient = DecoderOptions {
            mode: DecodeMode::Lenient,
            ..DecoderOptions::default()
        };

        // Act
        let strict = Decoder::default().decode_bytes(input);
        let lenient = Decoder::new(lenient).decode_bytes(input);

        // Assert
        assert_eq!(
            strict.diagnostics,
            vec![Diagnostic::new(
                1,
                DiagnosticKind::InvalidRecord(RecordError::InvalidRecordType(0x06))
            )]
        );
        assert_eq!(
            lenient.diagnostics,
            vec![Diagnostic::new(
                1,
                DiagnosticKind::UnsupportedRecordIgnored(0x06)
            )]
        );
    }

    #[test]
    fn test_decode_reader_matches_bytes() {
        // Arrange
        let input = ":0300300002337A1E\r\n:0300330002337A1F\r\n:00000001FF\r\n:0100000011EE\r\n";

        // Act
        let from_reader = Decoder::default().decode(Cursor::new(input));
        let from_bytes = decode_strict(input);

        // Assert
        assert_eq!(from_reader.ok(), Some(from_bytes));
    }

    #[test]
    fn test_decode_reader_overlong_line() {
        // Arrange - a line longer than any valid record, then a valid record
        let long_line = format!(":{}\n", "0".repeat(2 * LINE_LIMIT));
        let input = format!("{long_line}:0100000011EE\n:00000001FF\n");
        let reader = BufReader::with_capacity(16, Cursor::new(input));

        // Act
        let decoded = Decoder::default().decode(reader);

        // Assert
        let decoded = decoded.unwrap_or_default();
        assert_eq!(decoded.image.as_bytes(), &[0x11]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::new(
                1,
                DiagnosticKind::InvalidRecord(RecordError::RecordTooLong)
            )]
        );
    }
}
