use super::error::SampleError;
use super::platform::Sampler;
use super::snapshot::InterfaceSnapshot;

/// Enumerates every interface and finalizes the list with its total.
///
/// A failing host query discards everything collected so far.
pub fn enumerate(sampler: &dyn Sampler) -> Result<Vec<InterfaceSnapshot>, SampleError> {
    let _span = tracing::debug_span!("network.enumerate").entered();
    let interfaces = sampler.sample_network()?;
    tracing::debug!(count = interfaces.len(), "interfaces enumerated");
    Ok(with_total(interfaces))
}

/// Appends the synthetic `"total"` record summing every real interface.
///
/// Exactly one total is appended, last, even when `interfaces` is empty.
pub fn with_total(mut interfaces: Vec<InterfaceSnapshot>) -> Vec<InterfaceSnapshot> {
    let mut total = InterfaceSnapshot {
        name: InterfaceSnapshot::TOTAL_NAME.to_string(),
        ..InterfaceSnapshot::default()
    };
    for iface in &interfaces {
        total.input_packets += iface.input_packets;
        total.output_packets += iface.output_packets;
        total.input_bytes += iface.input_bytes;
        total.output_bytes += iface.output_bytes;
    }
    interfaces.push(total);
    interfaces
}

/// Counter growth of one interface between two enumerations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceDelta {
    pub name: String,
    pub index: u32,
    pub input_packets: u64,
    pub output_packets: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

/// Pairs records and subtracts `previous` from `current`.
///
/// Named records pair by name. Records whose name could not be resolved pair
/// by index with another unnamed record. Interfaces absent from `previous`
/// are skipped.
pub fn activity_delta(
    previous: &[InterfaceSnapshot],
    current: &[InterfaceSnapshot],
) -> Vec<InterfaceDelta> {
    current
        .iter()
        .filter_map(|now| {
            let before = previous.iter().find(|p| same_interface(p, now))?;
            Some(InterfaceDelta {
                name: now.name.clone(),
                index: now.index,
                input_packets: counter_delta(before.input_packets, now.input_packets),
                output_packets: counter_delta(before.output_packets, now.output_packets),
                input_bytes: counter_delta(before.input_bytes, now.input_bytes),
                output_bytes: counter_delta(before.output_bytes, now.output_bytes),
            })
        })
        .collect()
}

fn same_interface(a: &InterfaceSnapshot, b: &InterfaceSnapshot) -> bool {
    if a.name.is_empty() || b.name.is_empty() {
        a.name.is_empty() && b.name.is_empty() && a.index == b.index
    } else {
        a.name == b.name
    }
}

/// Growth of a cumulative counter.
///
/// Some hosts keep 32-bit counters. A value that fell by more than half that
/// range from a previous reading that fit in 32 bits is taken as one wrap.
/// Any other decrease is a reset and reports 0.
pub fn counter_delta(before: u64, now: u64) -> u64 {
    const WRAP: u64 = 1 << 32;
    if now >= before {
        now - before
    } else if before < WRAP && before - now > WRAP / 2 {
        now + WRAP - before
    } else {
        0
    }
}
