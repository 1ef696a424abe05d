//! The `record` module defines the [`Record`] and [`RecordType`] which are used for parsing
//! (and generating) Intel HEX records.

use crate::decoder::DecodeMode;
use crate::error::RecordError;
use std::fmt;

pub(crate) mod sizes {
    pub const BYTE_CHAR_LEN: usize = 2;
    /// ':' + len + addr + rtype + checksum
    pub const SMALLEST_RECORD: usize = 1 + (1 + 2 + 1 + 1) * BYTE_CHAR_LEN;
    pub const LARGEST_RECORD: usize = SMALLEST_RECORD + 255 * BYTE_CHAR_LEN;
    /// Bytes in front of the payload once the line is decoded: len + addr + rtype
    pub const HEADER_BYTES: usize = 4;
}

/// Size of the address space reachable by 16-bit record addresses.
pub const ADDRESS_SPACE: usize = 0x1_0000;

/// The fixed end-of-file record.
pub const EOF_RECORD: &str = ":00000001FF";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress,
    StartLinearAddress,
    /// Only produced by lenient decoding
    Unknown(u8),
}

impl RecordType {
    fn parse(code: u8, mode: DecodeMode) -> Result<Self, RecordError> {
        match code {
            0x00 => Ok(Self::Data),
            0x01 => Ok(Self::EndOfFile),
            0x02 => Ok(Self::ExtendedSegmentAddress),
            0x03 => Ok(Self::StartSegmentAddress),
            0x04 => Ok(Self::ExtendedLinearAddress),
            0x05 => Ok(Self::StartLinearAddress),
            _ if mode == DecodeMode::Lenient => Ok(Self::Unknown(code)),
            _ => Err(RecordError::InvalidRecordType(code)),
        }
    }

    /// Numeric record type as it appears on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::EndOfFile => 0x01,
            Self::ExtendedSegmentAddress => 0x02,
            Self::StartSegmentAddress => 0x03,
            Self::ExtendedLinearAddress => 0x04,
            Self::StartLinearAddress => 0x05,
            Self::Unknown(code) => code,
        }
    }

    /// Payload length a well-formed record of this type carries, if fixed.
    const fn expected_length(self) -> Option<u8> {
        match self {
            Self::EndOfFile => Some(0),
            Self::ExtendedSegmentAddress | Self::ExtendedLinearAddress => Some(2),
            Self::StartSegmentAddress | Self::StartLinearAddress => Some(4),
            Self::Data | Self::Unknown(_) => None,
        }
    }
}

/// One line of Intel HEX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub length: u8,
    pub address: u16,
    pub rtype: RecordType,
    pub data: Vec<u8>,
    pub checksum: u8,
}

/// Two's complement of the mod-256 sum of `bytes`.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)))
}

const fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Record {
    /// Create a record from address, type and payload. The checksum is computed.
    ///
    /// # Errors
    /// Returns [`RecordError::RecordTooLong`] if `data` holds more than 255 bytes.
    ///
    /// # Example
    /// ```
    /// use hex2clib::{Record, RecordType};
    ///
    /// let record = Record::create(0x0030, RecordType::Data, &[0x02, 0x33, 0x7A]).unwrap();
    /// assert_eq!(record.to_string(), ":0300300002337A1E");
    /// ```
    pub fn create(address: u16, rtype: RecordType, data: &[u8]) -> Result<Self, RecordError> {
        let length = u8::try_from(data.len()).map_err(|_| RecordError::RecordTooLong)?;

        let mut record = Self {
            length,
            address,
            rtype,
            data: data.to_vec(),
            checksum: 0,
        };
        record.checksum = record.calculate_checksum();
        Ok(record)
    }

    /// Calculate checksum from the record's header fields and payload.
    #[must_use]
    pub fn calculate_checksum(&self) -> u8 {
        let [addr_high, addr_low] = self.address.to_be_bytes();
        let header = checksum(&[self.length, addr_high, addr_low, self.rtype.code()]);
        header.wrapping_sub(self.data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b)))
    }

    /// Parse one line into a record.
    ///
    /// A single trailing `\n` and, before it, a single `\r` are ignored.
    ///
    /// # Errors
    /// Returns the first [`RecordError`] found. Nothing is produced for a rejected line.
    ///
    /// # Example
    /// ```
    /// use hex2clib::{DecodeMode, Record, RecordType};
    ///
    /// let record = Record::parse(b":0300300002337A1E\r\n", DecodeMode::Strict).unwrap();
    /// assert_eq!(record.address, 0x0030);
    /// assert_eq!(record.rtype, RecordType::Data);
    /// assert_eq!(record.data, [0x02, 0x33, 0x7A]);
    /// ```
    pub fn parse(line: &[u8], mode: DecodeMode) -> Result<Self, RecordError> {
        // Check for start code
        if line.first() != Some(&b':') {
            return Err(RecordError::MissingStartCode);
        }

        // Cut newline characters
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        // Validate record's size
        if line.len() < sizes::SMALLEST_RECORD {
            return Err(RecordError::RecordTooShort);
        } else if line.len() > sizes::LARGEST_RECORD {
            return Err(RecordError::RecordTooLong);
        }

        // Validate all characters are hexadecimal and decode them pairwise
        let digits = &line[1..];
        if !digits.iter().all(u8::is_ascii_hexdigit) {
            return Err(RecordError::ContainsInvalidCharacters);
        }
        if digits.len() % sizes::BYTE_CHAR_LEN != 0 {
            return Err(RecordError::RecordNotEvenLength);
        }
        let bytes: Vec<u8> = digits
            .chunks_exact(sizes::BYTE_CHAR_LEN)
            .filter_map(|pair| Some((hex_value(pair[0])? << 4) | hex_value(pair[1])?))
            .collect();

        // Header: byte count, big-endian address, record type
        let length = bytes[0];
        let address = u16::from_be_bytes([bytes[1], bytes[2]]);
        let code = bytes[3];

        // Declared length has to match the payload actually present
        if bytes.len() != sizes::HEADER_BYTES + usize::from(length) + 1 {
            return Err(RecordError::RecordInvalidPayloadLength);
        }

        if usize::from(address) + usize::from(length) > ADDRESS_SPACE {
            return Err(RecordError::AddressOverflow(address, length));
        }

        let rtype = RecordType::parse(code, mode)?;

        // Well-formedness of the non-data records is only enforced when strict
        if mode == DecodeMode::Strict && rtype != RecordType::Data {
            if let Some(expected) = rtype.expected_length()
                && expected != length
            {
                return Err(RecordError::RecordLengthInvalidForType(code, expected, length));
            }
            if address != 0 {
                return Err(RecordError::RecordAddressInvalidForType(code, address));
            }
        }

        let data_end = sizes::HEADER_BYTES + usize::from(length);
        let record = Self {
            length,
            address,
            rtype,
            data: bytes[sizes::HEADER_BYTES..data_end].to_vec(),
            checksum: bytes[data_end],
        };

        // Validate checksum
        let calc_checksum = record.calculate_checksum();
        if calc_checksum != record.checksum {
            return Err(RecordError::RecordChecksumMismatch(
                calc_checksum,
                record.checksum,
            ));
        }

        Ok(record)
    }

    /// Absolute entry point carried by a start address record.
    ///
    /// `03` holds `CS:IP` and yields `CS * 16 + IP`, `05` holds a 32-bit linear address.
    #[must_use]
    pub fn start_address(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.data.as_slice().try_into().ok()?;
        match self.rtype {
            RecordType::StartSegmentAddress => {
                let cs = u32::from(u16::from_be_bytes([bytes[0], bytes[1]]));
                let ip = u32::from(u16::from_be_bytes([bytes[2], bytes[3]]));
                Some((cs << 4) + ip)
            }
            RecordType::StartLinearAddress => Some(u32::from_be_bytes(bytes)),
            _ => None,
        }
    }

    /// Address offset selected by an extended segment/linear address record.
    #[must_use]
    pub fn extended_offset(&self) -> Option<u32> {
        let bytes: [u8; 2] = self.data.as_slice().try_into().ok()?;
        let value = u32::from(u16::from_be_bytes(bytes));
        match self.rtype {
            RecordType::ExtendedSegmentAddress => Some(value << 4),
            RecordType::ExtendedLinearAddress => Some(value << 16),
            _ => None,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{:02X}{:04X}{:02X}",
            self.length,
            self.address,
            self.rtype.code()
        )?;
        for byte in &self.data {
            write!(f, "{byte:02X}")?;
        }
        write!(f, "{:02X}", self.checksum)
    }
}
