//! Records handed to the host process, serialized as JSON.

use serde::Serialize;

use crate::system::error::SampleError;
use crate::system::network::InterfaceDelta;
use crate::system::snapshot::InterfaceSnapshot;
use crate::system::usage::{CoreUsage, CpuSummary};

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuUsageRecord {
    pub core_index: usize,
    pub total_percent: f64,
    pub user_percent: f64,
    pub system_percent: f64,
}

impl From<&CoreUsage> for CpuUsageRecord {
    fn from(usage: &CoreUsage) -> Self {
        Self {
            core_index: usage.core,
            total_percent: usage.total_percent,
            user_percent: usage.user_percent,
            system_percent: usage.system_percent,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpuSummaryRecord {
    pub total_percent: f64,
    pub user_percent: f64,
    pub system_percent: f64,
}

impl From<&CpuSummary> for CpuSummaryRecord {
    fn from(summary: &CpuSummary) -> Self {
        Self {
            total_percent: summary.total_percent,
            user_percent: summary.user_percent,
            system_percent: summary.system_percent,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Direction {
    pub input: u64,
    pub output: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct NetworkRecord {
    pub name: String,
    pub index: u32,
    pub packets: Direction,
    pub bytes: Direction,
}

impl From<&InterfaceSnapshot> for NetworkRecord {
    fn from(iface: &InterfaceSnapshot) -> Self {
        Self {
            name: iface.name.clone(),
            index: iface.index,
            packets: Direction {
                input: iface.input_packets,
                output: iface.output_packets,
            },
            bytes: Direction {
                input: iface.input_bytes,
                output: iface.output_bytes,
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRateRecord {
    pub name: String,
    pub index: u32,
    pub per_second: PerSecond,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PerSecond {
    pub packets: Direction,
    pub bytes: Direction,
}

impl From<&InterfaceDelta> for NetworkRateRecord {
    fn from(delta: &InterfaceDelta) -> Self {
        Self {
            name: delta.name.clone(),
            index: delta.index,
            per_second: PerSecond {
                packets: Direction {
                    input: delta.input_packets,
                    output: delta.output_packets,
                },
                bytes: Direction {
                    input: delta.input_bytes,
                    output: delta.output_bytes,
                },
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub error_code: i32,
    pub message: String,
}

impl From<&SampleError> for ErrorRecord {
    fn from(err: &SampleError) -> Self {
        Self {
            error_code: err.code(),
            message: err.to_string(),
        }
    }
}

pub fn cpu_records(usages: &[CoreUsage]) -> Vec<CpuUsageRecord> {
    usages.iter().map(CpuUsageRecord::from).collect()
}

pub fn network_records(interfaces: &[InterfaceSnapshot]) -> Vec<NetworkRecord> {
    interfaces.iter().map(NetworkRecord::from).collect()
}

pub fn rate_records(deltas: &[InterfaceDelta]) -> Vec<NetworkRateRecord> {
    deltas.iter().map(NetworkRateRecord::from).collect()
}
