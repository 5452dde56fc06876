//! rpibridge.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use rpibridge_messenger::{DriverConfig, OfferCapacity};
use rpibridge_proto::{ProcessAddress, Range};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub master: MasterConfig,
    pub driver: DriverSection,
    pub dispatch: DispatchSection,
    pub messenger: MessengerSection,
    pub offer: OfferSection,
    pub registry: RegistrySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 4000 }
    }
}

/// The master identity the bridge speaks as.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    pub address: String,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            address: "master@127.0.0.1:4000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSection {
    pub framework_id: String,
    pub framework_name: String,
    pub user: String,
    /// Cluster master the driver sends directives to.
    pub master: String,
    pub slave_id: String,
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            framework_id: "rpibridge".to_string(),
            framework_name: "rpibridge".to_string(),
            user: "root".to_string(),
            master: "master@127.0.0.1:5050".to_string(),
            slave_id: "rpi-slave".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSection {
    /// Unset means callers wait for their action indefinitely.
    pub submit_timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerSection {
    pub request_timeout: String,
}

impl Default for MessengerSection {
    fn default() -> Self {
        Self {
            request_timeout: "10s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferSection {
    pub cpus: f64,
    pub mem: f64,
    pub disk: f64,
    /// Inclusive `[begin, end]` port ranges.
    pub ports: Vec<[u64; 2]>,
}

impl Default for OfferSection {
    fn default() -> Self {
        let capacity = OfferCapacity::default();
        Self {
            cpus: capacity.cpus,
            mem: capacity.mem,
            disk: capacity.disk,
            ports: capacity.ports.iter().map(|r| [r.begin, r.end]).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    pub data_dir: PathBuf,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/rpibridge"),
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: BridgeConfig =
            toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn master_address(&self) -> anyhow::Result<ProcessAddress> {
        ProcessAddress::parse(&self.master.address).context("[master] address")
    }

    pub fn driver_config(&self) -> anyhow::Result<DriverConfig> {
        Ok(DriverConfig {
            master: ProcessAddress::parse(&self.driver.master).context("[driver] master")?,
            framework_id: self.driver.framework_id.clone(),
            framework_name: self.driver.framework_name.clone(),
            user: self.driver.user.clone(),
            default_slave_id: self.driver.slave_id.clone(),
        })
    }

    pub fn submit_timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.dispatch
            .submit_timeout
            .as_deref()
            .map(|s| duration_setting("[dispatch] submit_timeout", s))
            .transpose()
    }

    pub fn request_timeout(&self) -> anyhow::Result<Duration> {
        duration_setting("[messenger] request_timeout", &self.messenger.request_timeout)
    }

    pub fn offer_capacity(&self) -> anyhow::Result<OfferCapacity> {
        let mut ports = Vec::with_capacity(self.offer.ports.len());
        for [begin, end] in &self.offer.ports {
            if begin > end {
                bail!("[offer] ports: range {begin}-{end} is reversed");
            }
            ports.push(Range {
                begin: *begin,
                end: *end,
            });
        }
        Ok(OfferCapacity {
            cpus: self.offer.cpus,
            mem: self.offer.mem,
            disk: self.offer.disk,
            ports,
        })
    }
}

fn duration_setting(key: &str, value: &str) -> anyhow::Result<Duration> {
    match parse_duration(value) {
        Some(d) => Ok(d),
        None => bail!("{key}: cannot parse duration {value:?}"),
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
