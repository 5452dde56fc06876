//! The synthetic offer advertising a provider's whole capacity.

use rpibridge_proto::{FrameworkId, Offer, OfferId, ProcessAddress, Range, Resource, SlaveId};

/// Capacity advertised in every synthetic offer.
///
/// The provider behind the bridge does its own placement, so the offer
/// is never split: frameworks always see the full pool.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferCapacity {
    pub cpus: f64,
    /// Megabytes.
    pub mem: f64,
    /// Megabytes.
    pub disk: f64,
    pub ports: Vec<Range>,
}

impl Default for OfferCapacity {
    fn default() -> Self {
        Self {
            cpus: 1024.0,
            mem: 4.0 * 1024.0 * 1024.0,
            disk: 64.0 * 1024.0 * 1024.0,
            ports: vec![Range {
                begin: 1024,
                end: 65535,
            }],
        }
    }
}

impl OfferCapacity {
    pub fn resources(&self) -> Vec<Resource> {
        let mut resources = vec![
            Resource::scalar("cpus", self.cpus),
            Resource::scalar("mem", self.mem),
            Resource::scalar("disk", self.disk),
        ];
        if !self.ports.is_empty() {
            resources.push(Resource::ranges("ports", self.ports.clone()));
        }
        resources
    }

    /// One offer for the whole capacity, hosted on `slave`.
    pub fn offer(
        &self,
        framework_id: &str,
        offer_id: &str,
        slave_id: &str,
        slave: &ProcessAddress,
    ) -> Offer {
        Offer {
            id: OfferId::new(offer_id),
            framework_id: FrameworkId::new(framework_id),
            slave_id: SlaveId::new(slave_id),
            hostname: slave.host().to_string(),
            resources: self.resources(),
        }
    }
}
