use std::ffi::CStr;
use std::mem;
use std::ptr;
use std::slice;

use super::Sampler;
use crate::system::error::SampleError;
use crate::system::snapshot::{InterfaceSnapshot, TickSnapshot};

/// Reads CPU ticks through `host_processor_info` and traffic counters from the
/// `NET_RT_IFLIST2` routing table dump.
pub struct Platform;

impl Sampler for Platform {
    #[allow(deprecated)]
    fn sample_cpu(&self) -> Result<Vec<TickSnapshot>, SampleError> {
        let mut cpu_count: libc::natural_t = 0;
        let mut info: libc::processor_info_array_t = ptr::null_mut();
        let mut info_count: libc::mach_msg_type_number_t = 0;

        // SAFETY: all out-pointers are valid for the duration of the call.
        let rc = unsafe {
            libc::host_processor_info(
                libc::mach_host_self(),
                libc::PROCESSOR_CPU_LOAD_INFO,
                &mut cpu_count,
                &mut info,
                &mut info_count,
            )
        };
        if rc != libc::KERN_SUCCESS {
            tracing::warn!(rc, "host_processor_info failed");
            return Err(SampleError::processor_query(rc));
        }

        // SAFETY: on success the kernel hands back cpu_count load records.
        let loads = unsafe {
            slice::from_raw_parts(
                info as *const libc::processor_cpu_load_info,
                cpu_count as usize,
            )
        };
        let ticks = loads
            .iter()
            .map(|load| {
                let t = &load.cpu_ticks;
                TickSnapshot::new(
                    t[libc::CPU_STATE_USER as usize].into(),
                    t[libc::CPU_STATE_NICE as usize].into(),
                    t[libc::CPU_STATE_SYSTEM as usize].into(),
                    t[libc::CPU_STATE_IDLE as usize].into(),
                )
            })
            .collect();

        // SAFETY: the array was allocated by the kernel in our task; freed once.
        unsafe {
            libc::vm_deallocate(
                libc::mach_task_self(),
                info as libc::vm_address_t,
                info_count as usize * mem::size_of::<libc::integer_t>(),
            );
        }

        Ok(ticks)
    }

    fn sample_network(&self) -> Result<Vec<InterfaceSnapshot>, SampleError> {
        let buf = route_table()?;
        let mut interfaces = Vec::new();
        for (index, stats) in decode_if_records(&buf) {
            interfaces.push(InterfaceSnapshot {
                name: interface_name(index),
                index: index.into(),
                input_packets: stats.ifi_ipackets,
                output_packets: stats.ifi_opackets,
                input_bytes: stats.ifi_ibytes,
                output_bytes: stats.ifi_obytes,
            });
        }
        Ok(interfaces)
    }
}

fn route_table() -> Result<Vec<u8>, SampleError> {
    let mut mib = [
        libc::CTL_NET,
        libc::PF_ROUTE,
        0,
        0,
        libc::NET_RT_IFLIST2,
        0,
    ];
    let mut len: libc::size_t = 0;

    // SAFETY: sizing call, no output buffer.
    let rc = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as libc::c_uint,
            ptr::null_mut(),
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc < 0 {
        let err = SampleError::last_os_error();
        tracing::warn!(%err, "sysctl NET_RT_IFLIST2 sizing failed");
        return Err(err);
    }

    let mut buf = vec![0u8; len];
    // SAFETY: buf holds len writable bytes.
    let rc = unsafe {
        libc::sysctl(
            mib.as_mut_ptr(),
            mib.len() as libc::c_uint,
            buf.as_mut_ptr().cast(),
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    if rc < 0 {
        let err = SampleError::last_os_error();
        tracing::warn!(%err, "sysctl NET_RT_IFLIST2 failed");
        return Err(err);
    }
    buf.truncate(len);
    Ok(buf)
}

/// Walks the variable-length routing messages and returns the interface
/// index and counters of every `RTM_IFINFO2` record.
fn decode_if_records(buf: &[u8]) -> Vec<(u16, libc::if_data64)> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset + mem::size_of::<libc::if_msghdr>() <= buf.len() {
        // SAFETY: bounds checked above; read_unaligned tolerates packing.
        let header: libc::if_msghdr =
            unsafe { ptr::read_unaligned(buf[offset..].as_ptr().cast()) };
        let msg_len = usize::from(header.ifm_msglen);
        if msg_len == 0 {
            break;
        }
        if i32::from(header.ifm_type) == libc::RTM_IFINFO2
            && offset + mem::size_of::<libc::if_msghdr2>() <= buf.len()
        {
            // SAFETY: bounds checked above.
            let full: libc::if_msghdr2 =
                unsafe { ptr::read_unaligned(buf[offset..].as_ptr().cast()) };
            records.push((full.ifm_index, full.ifm_data));
        }
        offset += msg_len;
    }
    records
}

/// Empty when the index has no name; enumeration carries on.
fn interface_name(index: u16) -> String {
    let mut buf = [0 as libc::c_char; libc::IF_NAMESIZE];
    // SAFETY: buf is IF_NAMESIZE bytes as if_indextoname requires.
    let ptr = unsafe { libc::if_indextoname(index.into(), buf.as_mut_ptr()) };
    if ptr.is_null() {
        tracing::debug!(index, "no name for interface index");
        return String::new();
    }
    // SAFETY: on success buf holds a NUL-terminated name.
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
