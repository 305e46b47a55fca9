//! Client
//!
//! Blocking client for the coordinator. Every call opens its own
//! connection, sends one request and reads one response.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::protocol::{
    read_response, write_request, write_role, Distribution, Request, Response, Role,
    DELETE_SUCCESS,
};

/// Client for a coordinator at a fixed address
#[derive(Debug, Clone)]
pub struct Client {
    /// Coordinator "host:port"
    addr: String,

    /// Read/write timeout per call (None waits forever)
    timeout: Option<Duration>,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    /// Bound every read and write of a call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Names of all stored files, oldest upload first
    pub fn list_files(&self) -> Result<Vec<String>> {
        self.call(&Request::ListFiles)?.into_body()
    }

    /// Upload `data` under `name`
    pub fn upload(&self, name: &str, data: impl Into<Bytes>) -> Result<()> {
        let data = data.into();
        let request = Request::Upload {
            name: name.to_string(),
            declared_size: data.len() as u64,
            data,
        };
        self.call(&request)?.into_result()?;
        Ok(())
    }

    /// Download the file stored under `name`
    pub fn download(&self, name: &str) -> Result<Vec<u8>> {
        let request = Request::Download {
            name: name.to_string(),
        };
        Ok(self.call(&request)?.into_result()?.unwrap_or_default())
    }

    /// Delete the file stored under `name`
    pub fn delete(&self, name: &str) -> Result<()> {
        let request = Request::Delete {
            name: name.to_string(),
        };
        let response = self.call(&request)?;
        let message = response.message();
        response.into_result()?;

        if message != DELETE_SUCCESS {
            return Err(StoreError::Remote(message));
        }
        Ok(())
    }

    /// Shard paths of every stored file
    pub fn verify(&self) -> Result<Distribution> {
        self.call(&Request::Verify)?.into_body()
    }

    /// One request/response exchange on a fresh connection
    fn call(&self, request: &Request) -> Result<Response> {
        let stream = TcpStream::connect(&self.addr)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        stream.set_nodelay(true)?;

        let mut writer = BufWriter::new(stream.try_clone()?);
        write_role(&mut writer, Role::Client)?;
        write_request(&mut writer, request)?;

        let mut reader = BufReader::new(stream);
        read_response(&mut reader)
    }
}
