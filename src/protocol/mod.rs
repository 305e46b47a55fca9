//! Protocol Module
//!
//! Defines the wire protocol between clients, the coordinator and storage
//! nodes. Every connection carries exactly one request and one response.
//!
//! ## Connection Layout
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │ Role (1) │ Kind (1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//! Node commands sent by the coordinator omit the role byte.
//!
//! ### Roles
//! - 0x01: NODE   - followed by a REGISTER frame
//! - 0x02: CLIENT - followed by one client action frame
//!
//! ### Frame Kinds
//! - 0x10: LIST_FILES - Payload: empty
//! - 0x11: UPLOAD     - Payload: name + declared_size (8) + data
//! - 0x12: DOWNLOAD   - Payload: name
//! - 0x13: DELETE     - Payload: name
//! - 0x14: VERIFY     - Payload: empty
//! - 0x20: REGISTER   - Payload: address + port (2) + storage_path
//! - 0x30: STORE      - Payload: shard_name + crc32 (4) + data
//! - 0x31: RETRIEVE   - Payload: path
//! - 0x32: REMOVE     - Payload: path
//!
//! Strings are encoded as len (4) + UTF-8 bytes. All integers are big-endian.
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR
//! - 0x03: NO_NODES_AVAILABLE
//! - 0x04: PARTIAL_UPLOAD_FAILURE
//! - 0x05: NODE_UNAVAILABLE
//! - 0x06: ALREADY_EXISTS
//! - 0x07: PROTOCOL_ERROR
//! - 0x08: LOG_CORRUPTION
//! - 0x09: INVALID_NAME
//! - 0x0a: SHARD_CORRUPTION

mod command;
mod response;
mod codec;

pub use command::{NodeCommand, Request, RequestType, Role};
pub use response::{Distribution, Response, Status, DELETE_SUCCESS};
pub use codec::{
    decode_node_command, decode_request, decode_response, decode_shard_body,
    encode_node_command, encode_request, encode_response, encode_shard_body,
    read_node_command, read_request, read_response, read_role, write_node_command,
    write_request, write_response, write_role, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
