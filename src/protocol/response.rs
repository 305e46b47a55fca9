//! Response definitions
//!
//! Represents responses to clients and to the coordinator.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Body of a successful DELETE
pub const DELETE_SUCCESS: &str = "SUCCESS";

/// VERIFY body: file name → shard paths in shard order
pub type Distribution = BTreeMap<String, Vec<String>>;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
    NoNodesAvailable = 0x03,
    PartialUploadFailure = 0x04,
    NodeUnavailable = 0x05,
    AlreadyExists = 0x06,
    ProtocolError = 0x07,
    LogCorruption = 0x08,
    InvalidName = 0x09,
    ShardCorruption = 0x0a,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let status = match byte {
            0x00 => Status::Ok,
            0x01 => Status::NotFound,
            0x02 => Status::Error,
            0x03 => Status::NoNodesAvailable,
            0x04 => Status::PartialUploadFailure,
            0x05 => Status::NodeUnavailable,
            0x06 => Status::AlreadyExists,
            0x07 => Status::ProtocolError,
            0x08 => Status::LogCorruption,
            0x09 => Status::InvalidName,
            0x0a => Status::ShardCorruption,
            _ => return None,
        };
        Some(status)
    }
}

/// A response to send back on a connection
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (body for OK, message or details otherwise)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an OK response with a bincode body
    pub fn ok_body<T: Serialize>(body: &T) -> Result<Self> {
        Ok(Self::ok(Some(bincode::serialize(body)?)))
    }

    /// Create a NOT_FOUND response
    pub fn not_found(name: &str) -> Self {
        Self::with_message(Status::NotFound, name)
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self::with_message(Status::Error, message)
    }

    /// Create a PROTOCOL_ERROR response
    pub fn protocol_error(message: &str) -> Self {
        Self::with_message(Status::ProtocolError, message)
    }

    fn with_message(status: Status, message: &str) -> Self {
        Self {
            status,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Translate an error into the response the peer sees
    pub fn from_error(error: &StoreError) -> Self {
        match error {
            StoreError::NotFound(name) => Self::not_found(name),
            StoreError::NoNodesAvailable => Self {
                status: Status::NoNodesAvailable,
                payload: None,
            },
            StoreError::PartialUploadFailure { failed } => {
                let indices: Vec<u32> = failed.iter().map(|&i| i as u32).collect();
                match bincode::serialize(&indices) {
                    Ok(body) => Self {
                        status: Status::PartialUploadFailure,
                        payload: Some(body),
                    },
                    Err(e) => Self::error(&e.to_string()),
                }
            }
            StoreError::NodeUnavailable { .. } => {
                Self::with_message(Status::NodeUnavailable, &error.to_string())
            }
            StoreError::AlreadyExists(name) => Self::with_message(Status::AlreadyExists, name),
            StoreError::Protocol(message) => Self::protocol_error(message),
            StoreError::LogCorruption { .. } => {
                Self::with_message(Status::LogCorruption, &error.to_string())
            }
            StoreError::InvalidName(message) => Self::with_message(Status::InvalidName, message),
            StoreError::ShardCorruption(message) => {
                Self::with_message(Status::ShardCorruption, message)
            }
            other => Self::error(&other.to_string()),
        }
    }

    /// Payload as text (empty when absent)
    pub fn message(&self) -> String {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .unwrap_or_default()
    }

    /// Translate a response back into the caller's result
    pub fn into_result(self) -> Result<Option<Vec<u8>>> {
        let message = self.message();
        match self.status {
            Status::Ok => Ok(self.payload),
            Status::NotFound => Err(StoreError::NotFound(message)),
            Status::Error => Err(StoreError::Remote(message)),
            Status::NoNodesAvailable => Err(StoreError::NoNodesAvailable),
            Status::PartialUploadFailure => {
                let indices: Vec<u32> =
                    bincode::deserialize(self.payload.as_deref().unwrap_or_default())?;
                Err(StoreError::PartialUploadFailure {
                    failed: indices.into_iter().map(|i| i as usize).collect(),
                })
            }
            Status::NodeUnavailable => Err(StoreError::NodeUnavailable {
                node: "remote".to_string(),
                reason: message,
            }),
            Status::AlreadyExists => Err(StoreError::AlreadyExists(message)),
            Status::ProtocolError => Err(StoreError::Protocol(message)),
            Status::LogCorruption => Err(StoreError::LogCorruption {
                line: 0,
                reason: message,
            }),
            Status::InvalidName => Err(StoreError::InvalidName(message)),
            Status::ShardCorruption => Err(StoreError::ShardCorruption(message)),
        }
    }

    /// Decode the bincode body of an OK response
    pub fn into_body<T: DeserializeOwned>(self) -> Result<T> {
        let payload = self.into_result()?.unwrap_or_default();
        Ok(bincode::deserialize(&payload)?)
    }
}
