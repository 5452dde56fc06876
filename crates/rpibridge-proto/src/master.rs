//! Master state and its conversion into [`MasterInfo`].

use std::net::{IpAddr, Ipv4Addr};

use crate::address::ProcessAddress;
use crate::error::{ProtoError, ProtoResult};
use crate::types::MasterInfo;

/// Protocol version advertised in every registration acknowledgement.
pub const PROTOCOL_VERSION: &str = "0.28.0";

/// The bridge's view of the cluster master: a version plus the leader's
/// address in any form [`ProcessAddress::parse`] accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterState {
    pub version: String,
    pub leader: String,
}

impl MasterState {
    /// State advertising `leader` at [`PROTOCOL_VERSION`].
    pub fn new(leader: &ProcessAddress) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            leader: leader.to_string(),
        }
    }

    /// Derive the [`MasterInfo`] frameworks expect on registration.
    ///
    /// Non-literal hosts are resolved; the first IPv4 result is used.
    pub async fn to_master_info(&self) -> ProtoResult<MasterInfo> {
        let leader = ProcessAddress::parse(&self.leader)
            .map_err(|e| ProtoError::Conversion(e.to_string()))?;
        let ip = resolve_ipv4(&leader).await?;

        Ok(MasterInfo {
            id: format!("{}@{}:{}", leader.process_id(), ip, leader.port()),
            ip: u32::from(ip),
            port: u32::from(leader.port()),
            pid: leader.pid(),
            hostname: leader.host().to_string(),
            version: self.version.clone(),
        })
    }
}

async fn resolve_ipv4(addr: &ProcessAddress) -> ProtoResult<Ipv4Addr> {
    if let Ok(ip) = addr.host().parse::<Ipv4Addr>() {
        return Ok(ip);
    }

    let resolved = tokio::net::lookup_host(addr.transport_addr())
        .await
        .map_err(|e| ProtoError::Conversion(format!("resolving {}: {e}", addr.host())))?;

    resolved
        .filter_map(|sock| match sock.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| ProtoError::Conversion(format!("{} has no IPv4 address", addr.host())))
}
