//! Core OSC wire types

use crate::{Error, Result};

/// OSC argument type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeTag {
    Int32 = b'i',
    Float32 = b'f',
    String = b's',
    /// Alternate string type, a.k.a. symbol
    AltString = b'S',
    Blob = b'b',
    Int64 = b'h',
    Float64 = b'd',
    TimeTag = b't',
    /// ASCII character sent as 32 bits
    Char = b'c',
    /// 32-bit RGBA color
    Color = b'r',
    /// 4-byte MIDI message
    Midi = b'm',
    True = b'T',
    False = b'F',
    Nil = b'N',
    Infinitum = b'I',
    ArrayStart = b'[',
    ArrayEnd = b']',
}

impl TypeTag {
    pub fn from_byte(b: u8) -> Result<Self> {
        Ok(match b {
            b'i' => TypeTag::Int32,
            b'f' => TypeTag::Float32,
            b's' => TypeTag::String,
            b'S' => TypeTag::AltString,
            b'b' => TypeTag::Blob,
            b'h' => TypeTag::Int64,
            b'd' => TypeTag::Float64,
            b't' => TypeTag::TimeTag,
            b'c' => TypeTag::Char,
            b'r' => TypeTag::Color,
            b'm' => TypeTag::Midi,
            b'T' => TypeTag::True,
            b'F' => TypeTag::False,
            b'N' => TypeTag::Nil,
            b'I' => TypeTag::Infinitum,
            b'[' => TypeTag::ArrayStart,
            b']' => TypeTag::ArrayEnd,
            other => return Err(Error::UnknownTypeTag(other as char)),
        })
    }

    pub fn as_char(self) -> char {
        self as u8 as char
    }

    /// Payload size for fixed-width tags, `None` for strings and blobs
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            TypeTag::Int32
            | TypeTag::Float32
            | TypeTag::Char
            | TypeTag::Color
            | TypeTag::Midi => Some(4),
            TypeTag::Int64 | TypeTag::Float64 | TypeTag::TimeTag => Some(8),
            TypeTag::True
            | TypeTag::False
            | TypeTag::Nil
            | TypeTag::Infinitum
            | TypeTag::ArrayStart
            | TypeTag::ArrayEnd => Some(0),
            TypeTag::String | TypeTag::AltString | TypeTag::Blob => None,
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, TypeTag::String | TypeTag::AltString)
    }
}

/// Element descriptor: where one typed value of a message lives in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub tag: TypeTag,
    pub offset: usize,
}

impl Element {
    pub const fn new(tag: TypeTag, offset: usize) -> Self {
        Self { tag, offset }
    }
}

/// 4-byte MIDI message: port id, status byte, data1, data2
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MidiMessage {
    pub port_id: u8,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    pub const fn new(port_id: u8, status: u8, data1: u8, data2: u8) -> Self {
        Self {
            port_id,
            status,
            data1,
            data2,
        }
    }

    /// Channel number (0-15) from the status byte
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Message kind nibble (0x80 note off, 0x90 note on, ...)
    pub fn kind(&self) -> u8 {
        self.status & 0xF0
    }
}

/// 32-bit RGBA color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Round up to the 4-byte OSC alignment
#[inline]
pub const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_round_trip_chars() {
        for c in "ifsSbhdtcrmTFNI[]".bytes() {
            let tag = TypeTag::from_byte(c).unwrap();
            assert_eq!(tag.as_char(), c as char);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            TypeTag::from_byte(b'x'),
            Err(Error::UnknownTypeTag('x'))
        ));
    }

    #[test]
    fn test_align4() {
        assert_eq!(align4(0), 0);
        assert_eq!(align4(1), 4);
        assert_eq!(align4(4), 4);
        assert_eq!(align4(5), 8);
    }

    #[test]
    fn test_midi_fields() {
        let midi = MidiMessage::new(0, 0x93, 60, 100);
        assert_eq!(midi.channel(), 3);
        assert_eq!(midi.kind(), 0x90);
    }
}
