//! RESP2 values and the framing codec used on client connections.

use crate::command::Command;
use crate::error::TransportError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// An untyped reply from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<Vec<u8>>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    #[inline]
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    #[inline]
    pub fn bulk(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    #[inline]
    pub fn array(elements: Vec<RespValue>) -> Self {
        RespValue::Array(Some(elements))
    }

    #[inline]
    pub fn nil() -> Self {
        RespValue::BulkString(None)
    }

    #[inline]
    pub fn empty_array() -> Self {
        RespValue::Array(Some(Vec::new()))
    }

    /// Short description of the variant, used in decode errors
    pub fn kind(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(None) => "nil bulk string",
            RespValue::BulkString(Some(_)) => "bulk string",
            RespValue::Array(None) => "nil array",
            RespValue::Array(Some(_)) => "array",
        }
    }

    /// Serialize to RESP2 bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.put_u8(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.put_u8(b':');
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::BulkString(None) => buf.extend_from_slice(b"$-1\r\n"),
            RespValue::BulkString(Some(data)) => put_bulk(buf, data),
            RespValue::Array(None) => buf.extend_from_slice(b"*-1\r\n"),
            RespValue::Array(Some(elements)) => {
                put_header(buf, b'*', elements.len());
                for element in elements {
                    element.encode_into(buf);
                }
            }
        }
    }
}

fn put_header(buf: &mut BytesMut, tag: u8, len: usize) {
    buf.put_u8(tag);
    buf.extend_from_slice(len.to_string().as_bytes());
    buf.extend_from_slice(b"\r\n");
}

fn put_bulk(buf: &mut BytesMut, data: &[u8]) {
    put_header(buf, b'$', data.len());
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\r\n");
}

/// Deepest array nesting accepted from the peer. Time-series replies never
/// go past three levels.
pub const MAX_DEPTH: usize = 32;

/// Streaming RESP2 codec.
///
/// Decoding yields one complete value per call and leaves partial input in
/// the buffer. Before a value is built, the frame is walked once to find
/// where it ends; that walk resumes where the previous call stopped, so a
/// large reply arriving over many reads is scanned only once. Commands are
/// encoded as arrays of bulk strings.
#[derive(Debug, Clone, Default)]
pub struct RespCodec {
    scan: FrameScan,
}

/// Progress through the frame at the front of the read buffer
#[derive(Debug, Clone, Default)]
struct FrameScan {
    /// Bytes of the frame already walked
    offset: usize,
    /// Elements still expected by each open array, outermost first
    pending: Vec<usize>,
}

impl FrameScan {
    /// Walk `input` from the saved offset. Returns the frame length once
    /// the outermost value is complete.
    fn advance(&mut self, input: &[u8]) -> Result<Option<usize>, TransportError> {
        loop {
            let rest = &input[self.offset..];
            let Some(&tag) = rest.first() else {
                return Ok(None);
            };
            let Some((line, header_len)) = RespCodec::line(rest) else {
                return Ok(None);
            };

            match tag {
                b'+' | b'-' => self.offset += header_len,
                b':' => {
                    RespCodec::parse_int(line)?;
                    self.offset += header_len;
                }
                b'$' => match RespCodec::bulk_len(line)? {
                    None => self.offset += header_len,
                    Some(len) => {
                        let end = header_len + len;
                        if rest.len() < end + 2 {
                            return Ok(None);
                        }
                        RespCodec::check_bulk_end(&rest[end..end + 2])?;
                        self.offset += end + 2;
                    }
                },
                b'*' => {
                    self.offset += header_len;
                    match RespCodec::array_len(line)? {
                        Some(len) if len > 0 => {
                            if self.pending.len() >= MAX_DEPTH {
                                return Err(RespCodec::too_deep());
                            }
                            self.pending.push(len);
                            continue;
                        }
                        _ => {}
                    }
                }
                other => return Err(RespCodec::unknown_type(other)),
            }

            // One value finished; close every array it completes.
            loop {
                match self.pending.last_mut() {
                    None => {
                        let len = self.offset;
                        self.offset = 0;
                        return Ok(Some(len));
                    }
                    Some(remaining) => {
                        *remaining -= 1;
                        if *remaining > 0 {
                            break;
                        }
                        self.pending.pop();
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.pending.clear();
    }
}

impl RespCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one value from the front of `input`.
    ///
    /// Returns `Ok(None)` when more bytes are needed and the number of bytes
    /// consumed otherwise. Arrays nested deeper than [`MAX_DEPTH`] are a
    /// protocol error.
    pub fn parse(input: &[u8]) -> Result<Option<(RespValue, usize)>, TransportError> {
        Self::parse_at(input, 0)
    }

    fn parse_at(input: &[u8], depth: usize) -> Result<Option<(RespValue, usize)>, TransportError> {
        let Some(&tag) = input.first() else {
            return Ok(None);
        };

        match tag {
            b'+' => Ok(Self::line(input).map(|(line, consumed)| {
                (
                    RespValue::SimpleString(String::from_utf8_lossy(line).into_owned()),
                    consumed,
                )
            })),
            b'-' => Ok(Self::line(input).map(|(line, consumed)| {
                (
                    RespValue::Error(String::from_utf8_lossy(line).into_owned()),
                    consumed,
                )
            })),
            b':' => match Self::line(input) {
                Some((line, consumed)) => {
                    Ok(Some((RespValue::Integer(Self::parse_int(line)?), consumed)))
                }
                None => Ok(None),
            },
            b'$' => Self::parse_bulk_string(input),
            b'*' => Self::parse_array(input, depth),
            other => Err(Self::unknown_type(other)),
        }
    }

    fn parse_bulk_string(input: &[u8]) -> Result<Option<(RespValue, usize)>, TransportError> {
        let Some((line, header_len)) = Self::line(input) else {
            return Ok(None);
        };
        let Some(len) = Self::bulk_len(line)? else {
            return Ok(Some((RespValue::BulkString(None), header_len)));
        };

        let end = header_len + len;
        if input.len() < end + 2 {
            return Ok(None);
        }
        Self::check_bulk_end(&input[end..end + 2])?;

        let data = input[header_len..end].to_vec();
        Ok(Some((RespValue::BulkString(Some(data)), end + 2)))
    }

    fn parse_array(
        input: &[u8],
        depth: usize,
    ) -> Result<Option<(RespValue, usize)>, TransportError> {
        let Some((line, header_len)) = Self::line(input) else {
            return Ok(None);
        };
        let Some(len) = Self::array_len(line)? else {
            return Ok(Some((RespValue::Array(None), header_len)));
        };
        if len > 0 && depth >= MAX_DEPTH {
            return Err(Self::too_deep());
        }

        // Length comes from the peer; don't trust it for preallocation.
        let mut elements = Vec::with_capacity(len.min(1024));
        let mut offset = header_len;
        for _ in 0..len {
            match Self::parse_at(&input[offset..], depth + 1)? {
                Some((value, consumed)) => {
                    elements.push(value);
                    offset += consumed;
                }
                None => return Ok(None),
            }
        }

        Ok(Some((RespValue::Array(Some(elements)), offset)))
    }

    /// Payload between the type byte and the first CRLF
    fn line(input: &[u8]) -> Option<(&[u8], usize)> {
        Self::find_crlf(input).map(|pos| (&input[1..pos], pos + 2))
    }

    fn parse_int(raw: &[u8]) -> Result<i64, TransportError> {
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(|| {
                TransportError::Protocol(format!(
                    "invalid integer {:?}",
                    String::from_utf8_lossy(raw)
                ))
            })
    }

    /// Bulk string length, `None` for nil
    fn bulk_len(line: &[u8]) -> Result<Option<usize>, TransportError> {
        match Self::parse_int(line)? {
            -1 => Ok(None),
            len => usize::try_from(len)
                .map(Some)
                .map_err(|_| TransportError::Protocol(format!("invalid bulk length {}", len))),
        }
    }

    /// Array length, `None` for nil
    fn array_len(line: &[u8]) -> Result<Option<usize>, TransportError> {
        match Self::parse_int(line)? {
            -1 => Ok(None),
            len => usize::try_from(len)
                .map(Some)
                .map_err(|_| TransportError::Protocol(format!("invalid array length {}", len))),
        }
    }

    fn check_bulk_end(terminator: &[u8]) -> Result<(), TransportError> {
        if terminator == b"\r\n" {
            Ok(())
        } else {
            Err(TransportError::Protocol("bulk string not terminated by CRLF".to_string()))
        }
    }

    fn unknown_type(tag: u8) -> TransportError {
        TransportError::Protocol(format!("unknown RESP type byte 0x{:02x}", tag))
    }

    fn too_deep() -> TransportError {
        TransportError::Protocol(format!("arrays nested deeper than {}", MAX_DEPTH))
    }

    #[inline]
    fn find_crlf(input: &[u8]) -> Option<usize> {
        let mut start = 0;
        while let Some(offset) = memchr::memchr(b'\r', &input[start..]) {
            let pos = start + offset;
            match input.get(pos + 1) {
                Some(b'\n') => return Some(pos),
                Some(_) => start = pos + 1,
                None => return None,
            }
        }
        None
    }

    /// Serialize a command as an array of bulk strings
    pub fn encode_command(command: &Command, buf: &mut BytesMut) {
        put_header(buf, b'*', command.args().len() + 1);
        put_bulk(buf, command.name().as_bytes());
        for arg in command.args() {
            put_bulk(buf, arg.as_bytes());
        }
    }
}

impl Decoder for RespCodec {
    type Item = RespValue;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RespValue>, TransportError> {
        let frame_len = match self.scan.advance(src) {
            Ok(Some(len)) => len,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.scan.reset();
                return Err(e);
            }
        };

        match Self::parse(&src[..frame_len])? {
            Some((value, consumed)) => {
                src.advance(consumed);
                Ok(Some(value))
            }
            None => Err(TransportError::Protocol("frame ended before its value".to_string())),
        }
    }
}

impl<'a> Encoder<&'a Command> for RespCodec {
    type Error = TransportError;

    fn encode(&mut self, item: &'a Command, dst: &mut BytesMut) -> Result<(), TransportError> {
        Self::encode_command(item, dst);
        Ok(())
    }
}

impl Encoder<RespValue> for RespCodec {
    type Error = TransportError;

    fn encode(&mut self, item: RespValue, dst: &mut BytesMut) -> Result<(), TransportError> {
        item.encode_into(dst);
        Ok(())
    }
}
