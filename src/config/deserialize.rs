// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles service names, branch names and the service list.

use nonempty::NonEmpty;
use serde::Deserialize;

use super::ServiceConfig;
use crate::types::{BranchName, ServiceName};

pub fn deserialize_service_name<'de, D>(deserializer: D) -> Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_branch_name<'de, D>(deserializer: D) -> Result<BranchName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BranchName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_services<'de, D>(deserializer: D) -> Result<NonEmpty<ServiceConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<ServiceEntry> = Vec::deserialize(deserializer)?;
    let services = values
        .into_iter()
        .map(|entry| entry.into_service_config())
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(services)
        .ok_or_else(|| serde::de::Error::custom("at least one service is required"))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServiceEntry {
    Simple(String),
    Detailed(ServiceConfig),
}

impl ServiceEntry {
    fn into_service_config(self) -> Result<ServiceConfig, String> {
        match self {
            ServiceEntry::Simple(s) => ServiceName::new(&s)
                .map(ServiceConfig::new)
                .map_err(|e| e.to_string()),
            ServiceEntry::Detailed(c) => Ok(c),
        }
    }
}
