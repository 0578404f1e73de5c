//! OSC packet framing
//!
//! Splits a received datagram into messages. Each message gets its element
//! descriptors written into a table that is reused from message to message, so
//! a parser that has warmed up does not allocate.
//!
//! ```text
//! message: /address\0 pad  ,tags\0 pad  arg0 arg1 ...
//! bundle:  #bundle\0  timetag(8)  [size(4) packet]*
//! ```

use crate::message::OscMessage;
use crate::time::Timestamp;
use crate::types::{align4, Element, TypeTag};
use crate::{Error, Result};

/// Prefix that marks a bundle
pub const BUNDLE_PREFIX: &[u8; 8] = b"#bundle\0";

/// Largest payload a single UDP datagram can carry
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// Deepest bundle nesting accepted before a packet is rejected as malformed
pub const MAX_BUNDLE_DEPTH: usize = 32;

/// Owns the receive buffer and frames the bytes written into it
#[derive(Debug)]
pub struct OscParser {
    buffer: Vec<u8>,
    elements: Vec<Element>,
}

impl OscParser {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer: vec![0u8; buffer_size],
            elements: Vec::with_capacity(16),
        }
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Buffer the transport receives into
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Frame the first `len` bytes of the buffer, calling `on_message` once per
    /// message found. Returns the number of messages delivered.
    ///
    /// On a malformed packet the error is returned after every message that
    /// preceded the fault has been delivered.
    pub fn parse<F>(&mut self, len: usize, mut on_message: F) -> Result<usize>
    where
        F: FnMut(&OscMessage<'_>),
    {
        if len > self.buffer.len() {
            return Err(Error::BufferTooSmall {
                needed: len,
                have: self.buffer.len(),
            });
        }

        let mut delivered = 0;
        parse_packet(
            &self.buffer[..len],
            0,
            len,
            None,
            0,
            &mut self.elements,
            &mut on_message,
            &mut delivered,
        )?;
        Ok(delivered)
    }
}

fn parse_packet(
    buf: &[u8],
    start: usize,
    end: usize,
    bundle_time: Option<Timestamp>,
    depth: usize,
    elements: &mut Vec<Element>,
    on_message: &mut dyn FnMut(&OscMessage<'_>),
    delivered: &mut usize,
) -> Result<()> {
    if buf[start..end].starts_with(BUNDLE_PREFIX) {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(Error::Malformed(format!(
                "bundles nested deeper than {} levels",
                MAX_BUNDLE_DEPTH
            )));
        }
        parse_bundle(buf, start, end, depth + 1, elements, on_message, delivered)
    } else {
        parse_message(buf, start, end, bundle_time, elements, on_message)?;
        *delivered += 1;
        Ok(())
    }
}

fn parse_bundle(
    buf: &[u8],
    start: usize,
    end: usize,
    depth: usize,
    elements: &mut Vec<Element>,
    on_message: &mut dyn FnMut(&OscMessage<'_>),
    delivered: &mut usize,
) -> Result<()> {
    let time_offset = start + BUNDLE_PREFIX.len();
    let time = Timestamp::from_be_bytes(&buf[..end], time_offset).ok_or(Error::BufferTooSmall {
        needed: time_offset + 8,
        have: end,
    })?;

    let mut pos = time_offset + 8;
    while pos < end {
        let size = read_u32(buf, pos, end)? as usize;
        let content = pos + 4;
        if size % 4 != 0 {
            return Err(Error::Malformed(format!(
                "bundle element size {} is not a multiple of 4",
                size
            )));
        }
        let content_end = content
            .checked_add(size)
            .filter(|&e| e <= end)
            .ok_or(Error::BufferTooSmall {
                needed: content.saturating_add(size),
                have: end,
            })?;
        if size > 0 {
            parse_packet(
                buf,
                content,
                content_end,
                Some(time),
                depth,
                elements,
                on_message,
                delivered,
            )?;
        }
        pos = content_end;
    }
    Ok(())
}

fn parse_message(
    buf: &[u8],
    start: usize,
    end: usize,
    bundle_time: Option<Timestamp>,
    elements: &mut Vec<Element>,
    on_message: &mut dyn FnMut(&OscMessage<'_>),
) -> Result<()> {
    let (address, mut pos) = read_padded_str(buf, start, end)?;
    if !address.starts_with('/') {
        return Err(Error::Malformed(format!(
            "message address must start with '/': {:?}",
            address
        )));
    }

    elements.clear();

    // Type tag string is optional in OSC 1.0 senders
    if pos < end {
        let (tags, args_start) = read_padded_str(buf, pos, end)?;
        let tags = tags.strip_prefix(',').ok_or_else(|| {
            Error::Malformed(format!("type tag string must start with ',': {:?}", tags))
        })?;

        pos = args_start;
        for b in tags.bytes() {
            let tag = TypeTag::from_byte(b)?;
            let size = match tag.fixed_size() {
                Some(size) => size,
                None if tag.is_string() => read_padded_str(buf, pos, end)?.1 - pos,
                None => 4 + align4(read_u32(buf, pos, end)? as usize),
            };
            let next = pos
                .checked_add(size)
                .filter(|&next| next <= end)
                .ok_or(Error::BufferTooSmall {
                    needed: pos.saturating_add(size),
                    have: end,
                })?;
            elements.push(Element::new(tag, pos));
            pos = next;
        }
    }

    on_message(&OscMessage::new(address, buf, elements.as_slice(), bundle_time));
    Ok(())
}

fn read_u32(buf: &[u8], pos: usize, end: usize) -> Result<u32> {
    buf.get(pos..pos + 4)
        .filter(|_| pos + 4 <= end)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or(Error::BufferTooSmall {
            needed: pos + 4,
            have: end,
        })
}

/// Read a NUL-terminated, 4-byte padded string; returns it and the offset past the padding
fn read_padded_str(buf: &[u8], start: usize, end: usize) -> Result<(&str, usize)> {
    let region = &buf[start..end];
    let nul = region
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::Malformed("unterminated string".to_string()))?;
    let s = std::str::from_utf8(&region[..nul])
        .map_err(|e| Error::Malformed(format!("string is not UTF-8: {}", e)))?;

    let next = start + align4(nul + 1);
    if next > end {
        return Err(Error::BufferTooSmall {
            needed: next,
            have: end,
        });
    }
    Ok((s, next))
}
