//! Zero-copy view over one received OSC message
//!
//! An [`OscMessage`] borrows the receive buffer and the element descriptor
//! table the parser filled in for it. Every `read_*` accessor decodes straight
//! out of the buffer; nothing is copied or allocated.
//!
//! Reads never fail. An index past the element count logs a warning and yields
//! the type's default, and so does a tag the accessor cannot interpret. The
//! `*_unchecked` accessors skip the tag test for callers that already know the
//! element types; they keep the bounds check only while the `safety-checks`
//! feature is enabled.

use tracing::warn;

use crate::time::Timestamp;
use crate::types::{Color, Element, MidiMessage, TypeTag};

/// Borrowed view of one message inside the shared receive buffer
#[derive(Debug, Clone, Copy)]
pub struct OscMessage<'a> {
    address: &'a str,
    buffer: &'a [u8],
    elements: &'a [Element],
    bundle_time: Option<Timestamp>,
}

macro_rules! check_bounds {
    ($self:ident, $index:ident) => {
        if $index >= $self.elements.len() {
            warn!(
                "tried to read message element index {}, but there are only {} elements",
                $index,
                $self.elements.len()
            );
            return Default::default();
        }
    };
}

macro_rules! check_bounds_unchecked {
    ($self:ident, $index:ident) => {
        if cfg!(feature = "safety-checks") {
            check_bounds!($self, $index);
        }
    };
}

impl<'a> OscMessage<'a> {
    pub fn new(
        address: &'a str,
        buffer: &'a [u8],
        elements: &'a [Element],
        bundle_time: Option<Timestamp>,
    ) -> Self {
        Self {
            address,
            buffer,
            elements,
            bundle_time,
        }
    }

    /// The literal address the message was sent to
    pub fn address(&self) -> &'a str {
        self.address
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &'a [Element] {
        self.elements
    }

    /// Type tag of an element, if the index is in range
    pub fn tag(&self, index: usize) -> Option<TypeTag> {
        self.elements.get(index).map(|e| e.tag)
    }

    /// Timetag of the enclosing bundle, `None` for a bare message
    pub fn bundle_time(&self) -> Option<Timestamp> {
        self.bundle_time
    }

    /// Read a timetag element; zero if the element is not a timetag
    pub fn read_timestamp(&self, index: usize) -> Timestamp {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::TimeTag => Timestamp::from_be_bytes(self.buffer, element.offset)
                .unwrap_or_default(),
            _ => Timestamp::default(),
        }
    }

    /// Read a timetag element without checking its type tag
    pub fn read_timestamp_unchecked(&self, index: usize) -> Timestamp {
        check_bounds_unchecked!(self, index);
        Timestamp::from_be_bytes(self.buffer, self.elements[index].offset).unwrap_or_default()
    }

    /// Read a 32-bit integer; float elements are truncated
    pub fn read_int(&self, index: usize) -> i32 {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::Int32 => self.word(element.offset).map_or(0, |w| w as i32),
            TypeTag::Float32 => self
                .word(element.offset)
                .map_or(0, |w| f32::from_bits(w) as i32),
            _ => 0,
        }
    }

    pub fn read_int_unchecked(&self, index: usize) -> i32 {
        check_bounds_unchecked!(self, index);
        self.word(self.elements[index].offset)
            .map_or(0, |w| w as i32)
    }

    /// Read a 32-bit float; integer elements are converted
    pub fn read_float(&self, index: usize) -> f32 {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::Float32 => self.word(element.offset).map_or(0.0, f32::from_bits),
            TypeTag::Int32 => self.word(element.offset).map_or(0.0, |w| w as i32 as f32),
            _ => 0.0,
        }
    }

    pub fn read_float_unchecked(&self, index: usize) -> f32 {
        check_bounds_unchecked!(self, index);
        self.word(self.elements[index].offset)
            .map_or(0.0, f32::from_bits)
    }

    pub fn read_int64(&self, index: usize) -> i64 {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::Int64 => self.dword(element.offset).map_or(0, |w| w as i64),
            TypeTag::Int32 => self.word(element.offset).map_or(0, |w| w as i32 as i64),
            _ => 0,
        }
    }

    pub fn read_float64(&self, index: usize) -> f64 {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::Float64 => self.dword(element.offset).map_or(0.0, f64::from_bits),
            TypeTag::Float32 => self
                .word(element.offset)
                .map_or(0.0, |w| f32::from_bits(w) as f64),
            TypeTag::Int32 => self.word(element.offset).map_or(0.0, |w| w as i32 as f64),
            _ => 0.0,
        }
    }

    /// Read a string or symbol element; empty for other tags or invalid UTF-8
    pub fn read_string(&self, index: usize) -> &'a str {
        check_bounds!(self, index);
        let element = self.elements[index];
        if !element.tag.is_string() {
            return "";
        }
        let Some(tail) = self.buffer.get(element.offset..) else {
            return "";
        };
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        std::str::from_utf8(&tail[..end]).unwrap_or_default()
    }

    /// Read a blob element's payload bytes
    pub fn read_blob(&self, index: usize) -> &'a [u8] {
        check_bounds!(self, index);
        let element = self.elements[index];
        if element.tag != TypeTag::Blob {
            return &[];
        }
        self.word(element.offset)
            .and_then(|len| {
                let start = element.offset + 4;
                self.buffer.get(start..start.checked_add(len as usize)?)
            })
            .unwrap_or_default()
    }

    pub fn read_bool(&self, index: usize) -> bool {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::True => true,
            TypeTag::Int32 => self.word(element.offset).is_some_and(|w| w != 0),
            _ => false,
        }
    }

    pub fn read_char(&self, index: usize) -> char {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::Char => self
                .word(element.offset)
                .and_then(char::from_u32)
                .unwrap_or_default(),
            _ => '\0',
        }
    }

    pub fn read_color(&self, index: usize) -> Color {
        check_bounds!(self, index);
        let element = self.elements[index];
        match (element.tag, self.quad(element.offset)) {
            (TypeTag::Color, Some([r, g, b, a])) => Color::new(r, g, b, a),
            _ => Color::default(),
        }
    }

    pub fn read_midi(&self, index: usize) -> MidiMessage {
        check_bounds!(self, index);
        let element = self.elements[index];
        match element.tag {
            TypeTag::Midi => self.midi_at(element.offset),
            _ => MidiMessage::default(),
        }
    }

    pub fn read_midi_unchecked(&self, index: usize) -> MidiMessage {
        check_bounds_unchecked!(self, index);
        self.midi_at(self.elements[index].offset)
    }

    fn midi_at(&self, offset: usize) -> MidiMessage {
        self.quad(offset)
            .map(|[port, status, d1, d2]| MidiMessage::new(port, status, d1, d2))
            .unwrap_or_default()
    }

    fn quad(&self, offset: usize) -> Option<[u8; 4]> {
        self.buffer
            .get(offset..offset.checked_add(4)?)
            .and_then(|b| b.try_into().ok())
    }

    fn word(&self, offset: usize) -> Option<u32> {
        self.quad(offset).map(u32::from_be_bytes)
    }

    fn dword(&self, offset: usize) -> Option<u64> {
        self.buffer
            .get(offset..offset.checked_add(8)?)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_be_bytes)
    }
}
