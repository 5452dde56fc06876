//! Process addresses.
//!
//! A [`ProcessAddress`] names one protocol endpoint. Two textual forms
//! are understood:
//!
//! - `host:port/process_id` (the canonical form, used in the
//!   `Libprocess-From` header and in logs)
//! - `process_id@host:port` (the libprocess pid form, used inside
//!   message bodies such as offer pids and master info)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, ProtoResult};

/// Identity of a protocol endpoint: `(host, port, process_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProcessAddress {
    host: String,
    port: u16,
    process_id: String,
}

impl ProcessAddress {
    /// Build an address from its parts.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        process_id: impl Into<String>,
    ) -> ProtoResult<Self> {
        let host = host.into();
        let process_id = process_id.into();
        let display = format!("{host}:{port}/{process_id}");
        if host.is_empty() {
            return Err(invalid(&display, "empty host"));
        }
        if process_id.is_empty() {
            return Err(invalid(&display, "empty process id"));
        }
        if process_id.contains('/') || process_id.contains('@') {
            return Err(invalid(&display, "process id contains a separator"));
        }
        Ok(Self {
            host,
            port,
            process_id,
        })
    }

    /// Parse either `host:port/process_id` or `process_id@host:port`.
    pub fn parse(input: &str) -> ProtoResult<Self> {
        let input = input.trim();
        let (process_id, endpoint) = if let Some((id, endpoint)) = input.split_once('@') {
            (id, endpoint)
        } else if let Some((endpoint, id)) = input.split_once('/') {
            (id, endpoint)
        } else {
            return Err(invalid(input, "missing process id"));
        };

        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| invalid(input, "missing port"))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid(input, "port is not a number in 0..=65535"))?;

        Self::new(host, port, process_id).map_err(|_| invalid(input, "empty component"))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// `host:port`, the address a transport connects to.
    pub fn transport_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `process_id@host:port`, the pid form carried inside messages.
    pub fn pid(&self) -> String {
        format!("{}@{}:{}", self.process_id, self.host, self.port)
    }

    /// Request path for delivering `message_type` to this process.
    pub fn message_path(&self, message_type: &str) -> String {
        format!("/{}/{}", self.process_id, message_type.trim_start_matches('/'))
    }
}

impl fmt::Display for ProcessAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.process_id)
    }
}

impl FromStr for ProcessAddress {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProcessAddress {
    type Error = ProtoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProcessAddress> for String {
    fn from(addr: ProcessAddress) -> Self {
        addr.to_string()
    }
}

fn invalid(input: &str, reason: &'static str) -> ProtoError {
    ProtoError::InvalidAddress {
        input: input.to_string(),
        reason,
    }
}
