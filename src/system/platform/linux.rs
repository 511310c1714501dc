use std::ffi::CStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::ptr;

use super::{Sampler, parse_proc_stat};
use crate::system::error::SampleError;
use crate::system::snapshot::{InterfaceSnapshot, TickSnapshot};

/// Reads CPU ticks from a `/proc/stat` pseudo-file and traffic counters from
/// the link-layer entries of `getifaddrs`.
pub struct Platform {
    stat_path: PathBuf,
}

impl Platform {
    pub fn new(stat_path: &Path) -> Self {
        Self {
            stat_path: stat_path.to_path_buf(),
        }
    }
}

impl Sampler for Platform {
    fn sample_cpu(&self) -> Result<Vec<TickSnapshot>, SampleError> {
        let file = File::open(&self.stat_path).map_err(|err| {
            tracing::warn!(path = %self.stat_path.display(), %err, "cannot open cpu counter source");
            SampleError::CounterSourceMissing {
                path: self.stat_path.clone(),
            }
        })?;
        parse_proc_stat(BufReader::new(file))
    }

    fn sample_network(&self) -> Result<Vec<InterfaceSnapshot>, SampleError> {
        let addrs = IfAddrs::new()?;
        // Index is the 1-based position in the list walk, counting every entry.
        let interfaces = addrs
            .iter()
            .enumerate()
            // SAFETY: every entry is owned by the live list.
            .filter_map(|(position, entry)| unsafe { decode_entry(entry, position) })
            .collect();
        Ok(interfaces)
    }
}

/// Turns one list entry into a snapshot. Entries without an address or
/// statistics block, and entries of any family but `AF_PACKET`, yield `None`.
///
/// # Safety
/// Non-null pointers in `entry` must be valid as `getifaddrs` leaves them.
unsafe fn decode_entry(entry: &libc::ifaddrs, position: usize) -> Option<InterfaceSnapshot> {
    if entry.ifa_addr.is_null() || entry.ifa_data.is_null() {
        return None;
    }
    let family = unsafe { (*entry.ifa_addr).sa_family };
    if i32::from(family) != libc::AF_PACKET {
        return None;
    }

    // For AF_PACKET entries ifa_data points at rtnl_link_stats.
    let stats = unsafe { decode_link_stats(entry.ifa_data) };
    let name = if entry.ifa_name.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(entry.ifa_name) }
            .to_string_lossy()
            .into_owned()
    };

    Some(InterfaceSnapshot {
        name,
        index: position as u32 + 1,
        input_packets: stats.rx_packets.into(),
        output_packets: stats.tx_packets.into(),
        input_bytes: stats.rx_bytes.into(),
        output_bytes: stats.tx_bytes.into(),
    })
}

/// Leading fields of the kernel's `struct rtnl_link_stats`.
#[repr(C)]
#[derive(Clone, Copy)]
struct LinkStats {
    rx_packets: u32,
    tx_packets: u32,
    rx_bytes: u32,
    tx_bytes: u32,
}

/// # Safety
/// `data` must point at a readable `rtnl_link_stats`.
unsafe fn decode_link_stats(data: *mut libc::c_void) -> LinkStats {
    unsafe { ptr::read_unaligned(data as *const LinkStats) }
}

/// Owned `getifaddrs` list, freed on drop.
struct IfAddrs {
    head: *mut libc::ifaddrs,
}

impl IfAddrs {
    fn new() -> Result<Self, SampleError> {
        let mut head: *mut libc::ifaddrs = ptr::null_mut();
        // SAFETY: head is a valid out-pointer.
        if unsafe { libc::getifaddrs(&mut head) } == -1 {
            let err = SampleError::last_os_error();
            tracing::warn!(%err, "getifaddrs failed");
            return Err(err);
        }
        Ok(Self { head })
    }

    fn iter(&self) -> impl Iterator<Item = &libc::ifaddrs> {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            // SAFETY: every node stays valid until the list is freed in drop.
            let entry = unsafe { cursor.as_ref() }?;
            cursor = entry.ifa_next;
            Some(entry)
        })
    }
}

impl Drop for IfAddrs {
    fn drop(&mut self) {
        if !self.head.is_null() {
            // SAFETY: head came from getifaddrs and is freed exactly once.
            unsafe { libc::freeifaddrs(self.head) };
        }
    }
}
