//! Wire types for the subset of the Compute Engine instance resource we read.

use serde::Deserialize;

use crate::driver::AddressKind;

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceResource {
    #[serde(default)]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) network_interfaces: Vec<NetworkInterface>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NetworkInterface {
    #[serde(rename = "networkIP", default)]
    pub(crate) network_ip: Option<String>,
    #[serde(default)]
    pub(crate) access_configs: Vec<AccessConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(crate) struct AccessConfig {
    #[serde(rename = "natIP", default)]
    pub(crate) nat_ip: Option<String>,
}

impl InstanceResource {
    /// First non-empty NAT address across all interfaces.
    pub(crate) fn nat_ip(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .flat_map(|interface| interface.access_configs.iter())
            .filter_map(|config| config.nat_ip.as_deref())
            .find(|ip| !ip.is_empty())
    }

    /// First non-empty private address across all interfaces.
    pub(crate) fn internal_ip(&self) -> Option<&str> {
        self.network_interfaces
            .iter()
            .filter_map(|interface| interface.network_ip.as_deref())
            .find(|ip| !ip.is_empty())
    }

    pub(crate) fn address(&self, kind: AddressKind) -> Option<&str> {
        match kind {
            AddressKind::Nat => self.nat_ip(),
            AddressKind::Internal => self.internal_ip(),
        }
    }
}

/// Google API error envelope (`{"error": {"code": .., "message": ..}}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub(crate) error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub(crate) message: String,
}
