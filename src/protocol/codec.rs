//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Frame Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Frame Kind
//! - LIST_FILES: empty
//! - UPLOAD:     name_len (4) + name + declared_size (8) + data
//! - DOWNLOAD:   name_len (4) + name
//! - DELETE:     name_len (4) + name
//! - VERIFY:     empty
//! - REGISTER:   addr_len (4) + addr + port (2) + path_len (4) + path
//! - STORE:      name_len (4) + name + crc32 (4) + data
//! - RETRIEVE:   path_len (4) + path
//! - REMOVE:     path_len (4) + path
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, StoreError};
use crate::registry::NodeDescriptor;
use super::{NodeCommand, Request, Response, Role, Status};

/// Header size: 1 byte kind/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (64 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

// =============================================================================
// Field Helpers
// =============================================================================

fn put_str(buf: &mut BytesMut, value: &str) {
    buf.put_u32(value.len() as u32);
    buf.put_slice(value.as_bytes());
}

/// Sequential reader over a frame payload with bounds checks
struct Fields<'a> {
    what: &'static str,
    buf: &'a [u8],
}

impl<'a> Fields<'a> {
    fn new(what: &'static str, buf: &'a [u8]) -> Self {
        Self { what, buf }
    }

    fn need(&self, len: usize, field: &str) -> Result<()> {
        if self.buf.remaining() < len {
            return Err(StoreError::Protocol(format!(
                "{} frame: incomplete {} (expected {} bytes, got {})",
                self.what,
                field,
                len,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    fn string(&mut self, field: &str) -> Result<String> {
        self.need(4, field)?;
        let len = self.buf.get_u32() as usize;
        self.need(len, field)?;
        let raw = &self.buf[..len];
        let value = std::str::from_utf8(raw)
            .map_err(|_| {
                StoreError::Protocol(format!("{} frame: {} is not valid UTF-8", self.what, field))
            })?
            .to_string();
        self.buf.advance(len);
        Ok(value)
    }

    fn u16(&mut self, field: &str) -> Result<u16> {
        self.need(2, field)?;
        Ok(self.buf.get_u16())
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        self.need(4, field)?;
        Ok(self.buf.get_u32())
    }

    fn u64(&mut self, field: &str) -> Result<u64> {
        self.need(8, field)?;
        Ok(self.buf.get_u64())
    }

    /// Everything left in the payload
    fn rest(self) -> Bytes {
        Bytes::copy_from_slice(self.buf)
    }

    /// Fail if anything is left over
    fn finish(self) -> Result<()> {
        if !self.buf.is_empty() {
            return Err(StoreError::Protocol(format!(
                "{} frame: unexpected {} trailing bytes",
                self.what,
                self.buf.len()
            )));
        }
        Ok(())
    }
}

/// Wrap a payload into kind + len + payload
fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(kind);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Split a complete frame into kind and payload
fn unframe<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let kind = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(StoreError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(StoreError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a coordinator request to bytes
///
/// Format: kind (1) + payload_len (4) + payload
pub fn encode_request(request: &Request) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match request {
        Request::Register(descriptor) => {
            put_str(&mut payload, &descriptor.address);
            payload.put_u16(descriptor.port);
            put_str(&mut payload, &descriptor.storage_path);
        }
        Request::Upload {
            name,
            declared_size,
            data,
        } => {
            payload.reserve(4 + name.len() + 8 + data.len());
            put_str(&mut payload, name);
            payload.put_u64(*declared_size);
            payload.put_slice(data);
        }
        Request::Download { name } | Request::Delete { name } => {
            put_str(&mut payload, name);
        }
        Request::ListFiles | Request::Verify => {}
    }

    frame(request.request_type() as u8, &payload)
}

/// Decode a coordinator request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (kind, payload) = unframe(bytes, "request")?;

    match kind {
        0x10 => {
            Fields::new("LIST_FILES", payload).finish()?;
            Ok(Request::ListFiles)
        }
        0x11 => {
            let mut fields = Fields::new("UPLOAD", payload);
            let name = fields.string("name")?;
            let declared_size = fields.u64("declared size")?;
            let data = fields.rest();
            Ok(Request::Upload {
                name,
                declared_size,
                data,
            })
        }
        0x12 => {
            let mut fields = Fields::new("DOWNLOAD", payload);
            let name = fields.string("name")?;
            fields.finish()?;
            Ok(Request::Download { name })
        }
        0x13 => {
            let mut fields = Fields::new("DELETE", payload);
            let name = fields.string("name")?;
            fields.finish()?;
            Ok(Request::Delete { name })
        }
        0x14 => {
            Fields::new("VERIFY", payload).finish()?;
            Ok(Request::Verify)
        }
        0x20 => {
            let mut fields = Fields::new("REGISTER", payload);
            let address = fields.string("address")?;
            let port = fields.u16("port")?;
            let storage_path = fields.string("storage path")?;
            fields.finish()?;
            Ok(Request::Register(NodeDescriptor {
                address,
                port,
                storage_path,
            }))
        }
        _ => Err(StoreError::Protocol(format!(
            "Unknown request type: 0x{:02x}",
            kind
        ))),
    }
}

// =============================================================================
// Node Command Encoding/Decoding
// =============================================================================

/// Encode a node command to bytes
///
/// STORE carries a CRC32 of the shard so the node can reject damaged data.
pub fn encode_node_command(command: &NodeCommand) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match command {
        NodeCommand::Store { shard_name, data } => {
            payload.reserve(4 + shard_name.len() + 4 + data.len());
            put_str(&mut payload, shard_name);
            payload.put_u32(crc32fast::hash(data));
            payload.put_slice(data);
        }
        NodeCommand::Retrieve { path } | NodeCommand::Remove { path } => {
            put_str(&mut payload, path);
        }
    }

    frame(command.request_type() as u8, &payload)
}

/// Decode a node command from bytes
///
/// A STORE whose data does not match its CRC fails with `ShardCorruption`.
pub fn decode_node_command(bytes: &[u8]) -> Result<NodeCommand> {
    let (kind, payload) = unframe(bytes, "node command")?;

    match kind {
        0x30 => {
            let mut fields = Fields::new("STORE", payload);
            let shard_name = fields.string("shard name")?;
            let crc = fields.u32("checksum")?;
            let data = fields.rest();
            verify_crc(&shard_name, crc, &data)?;
            Ok(NodeCommand::Store { shard_name, data })
        }
        0x31 => {
            let mut fields = Fields::new("RETRIEVE", payload);
            let path = fields.string("path")?;
            fields.finish()?;
            Ok(NodeCommand::Retrieve { path })
        }
        0x32 => {
            let mut fields = Fields::new("REMOVE", payload);
            let path = fields.string("path")?;
            fields.finish()?;
            Ok(NodeCommand::Remove { path })
        }
        _ => Err(StoreError::Protocol(format!(
            "Unknown node command type: 0x{:02x}",
            kind
        ))),
    }
}

/// Encode the OK body of a RETRIEVE: crc32 (4) + data
pub fn encode_shard_body(data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + data.len());
    body.extend_from_slice(&crc32fast::hash(data).to_be_bytes());
    body.extend_from_slice(data);
    body
}

/// Decode and check the OK body of a RETRIEVE
pub fn decode_shard_body(what: &str, body: &[u8]) -> Result<Bytes> {
    let mut fields = Fields::new("RETRIEVE response", body);
    let crc = fields.u32("checksum")?;
    let data = fields.rest();
    verify_crc(what, crc, &data)?;
    Ok(data)
}

fn verify_crc(what: &str, expected: u32, data: &[u8]) -> Result<()> {
    let actual = crc32fast::hash(data);
    if actual != expected {
        return Err(StoreError::ShardCorruption(format!(
            "{}: checksum mismatch (expected {:08x}, got {:08x})",
            what, expected, actual
        )));
    }
    Ok(())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = unframe(bytes, "response")?;

    let status = Status::from_byte(status_byte).ok_or_else(|| {
        StoreError::Protocol(format!("Unknown response status: 0x{:02x}", status_byte))
    })?;

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read the role byte that opens a coordinator connection
pub fn read_role<R: Read>(reader: &mut R) -> Result<Role> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Role::from_byte(byte[0])
        .ok_or_else(|| StoreError::Protocol(format!("Unknown connection role: 0x{:02x}", byte[0])))
}

/// Write the role byte that opens a coordinator connection
pub fn write_role<W: Write>(writer: &mut W, role: Role) -> Result<()> {
    writer.write_all(&[role as u8])?;
    Ok(())
}

/// Read one complete frame (header + payload) from a stream
///
/// Blocks until a complete frame is received or an error occurs
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    // Parse payload length
    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    // Validate before allocating
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(StoreError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

fn write_frame<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete coordinator request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let message = read_frame(reader, "request")?;
    decode_request(&message)
}

/// Write a coordinator request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_frame(writer, &encode_request(request))
}

/// Read a complete node command from a stream
pub fn read_node_command<R: Read>(reader: &mut R) -> Result<NodeCommand> {
    let message = read_frame(reader, "node command")?;
    decode_node_command(&message)
}

/// Write a node command to a stream
pub fn write_node_command<W: Write>(writer: &mut W, command: &NodeCommand) -> Result<()> {
    write_frame(writer, &encode_node_command(command))
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_frame(writer, &encode_response(response))
}
