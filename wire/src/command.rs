//! Self-framing commands.
//!
//! A command starts with its own length. If the whole command fits in 255
//! bytes the length is a single byte, otherwise a zero byte is followed by a
//! 4-byte length. Both lengths count every byte of the command, including the
//! length field itself.

use crate::buffer::{WireReader, WireWriter};
use crate::error::{Result, WireError};

/// Largest payload that still fits the one-byte length form
pub const MAX_SHORT_PAYLOAD: usize = 253;

const SHORT_HEADER: usize = 1;
const LONG_HEADER: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    id: u8,
    payload: Vec<u8>,
}

impl Command {
    pub fn new(id: u8, payload: Vec<u8>) -> Self {
        Self { id, payload }
    }

    pub fn empty(id: u8) -> Self {
        Self::new(id, Vec::new())
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn reader(&self) -> WireReader<'_> {
        WireReader::new(&self.payload)
    }

    pub fn is_long_form(&self) -> bool {
        self.payload.len() > MAX_SHORT_PAYLOAD
    }

    /// Bytes this command occupies on the wire
    pub fn encoded_len(&self) -> usize {
        let header = if self.is_long_form() {
            LONG_HEADER
        } else {
            SHORT_HEADER
        };
        header + 1 + self.payload.len()
    }

    pub fn write(&self, writer: &mut WireWriter) -> Result<()> {
        let total = self.encoded_len();
        if self.is_long_form() {
            let total = u32::try_from(total).map_err(|_| WireError::FrameTooLarge(total))?;
            writer.write_u8(0);
            writer.write_u32(total);
        } else {
            writer.write_u8(total as u8);
        }
        writer.write_u8(self.id);
        writer.write_bytes(&self.payload);
        Ok(())
    }

    /// Reads one command in either length form
    pub fn read(reader: &mut WireReader<'_>) -> Result<Command> {
        let short = reader.read_u8()? as usize;
        let body_len = if short == 0 {
            let total = reader.read_u32()? as usize;
            if total < LONG_HEADER + 1 {
                return Err(WireError::MalformedLength(total));
            }
            total - LONG_HEADER
        } else {
            if short < SHORT_HEADER + 1 {
                return Err(WireError::MalformedLength(short));
            }
            short - SHORT_HEADER
        };

        let body = reader.read_bytes(body_len)?;
        Ok(Command {
            id: body[0],
            payload: body[1..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(command: &Command) -> Vec<u8> {
        let mut writer = WireWriter::new();
        command.write(&mut writer).unwrap();
        writer.into_bytes()
    }

    #[test]
    fn test_empty_payload_uses_short_form() {
        let bytes = encode(&Command::empty(0x7F));
        assert_eq!(bytes, vec![2, 0x7F]);
    }

    #[test]
    fn test_form_boundary() {
        let largest_short = Command::new(0xa4, vec![7; MAX_SHORT_PAYLOAD]);
        let bytes = encode(&largest_short);
        assert_eq!(bytes[0], 255);
        assert_eq!(bytes.len(), 255);

        let smallest_long = Command::new(0xa4, vec![7; MAX_SHORT_PAYLOAD + 1]);
        let bytes = encode(&smallest_long);
        assert_eq!(bytes[0], 0);
        assert_eq!(&bytes[1..5], &(260u32).to_be_bytes());
        assert_eq!(bytes.len(), 260);
        assert_eq!(smallest_long.encoded_len(), 260);
    }

    #[test]
    fn test_both_forms_decode() {
        for len in [0usize, 1, 200, 253, 254, 1000] {
            let command = Command::new(0xc4, (0..len).map(|i| i as u8).collect());
            let bytes = encode(&command);
            let mut reader = WireReader::new(&bytes);
            assert_eq!(Command::read(&mut reader).unwrap(), command);
            assert!(reader.is_empty());
        }
    }

    #[test]
    fn test_short_length_below_two_is_malformed() {
        let mut reader = WireReader::new(&[1, 0xa4]);
        assert_eq!(Command::read(&mut reader), Err(WireError::MalformedLength(1)));
    }

    #[test]
    fn test_long_length_below_minimum_is_malformed() {
        let mut reader = WireReader::new(&[0, 0, 0, 0, 5, 0xa4]);
        assert_eq!(Command::read(&mut reader), Err(WireError::MalformedLength(5)));
    }

    #[test]
    fn test_truncated_body_underflows() {
        let mut reader = WireReader::new(&[10, 0xa4, 1, 2]);
        assert!(matches!(
            Command::read(&mut reader),
            Err(WireError::Underflow { .. })
        ));
    }
}
