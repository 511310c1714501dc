use std::path::Path;
use std::time::Duration;

use hostprobe::system::platform;
use hostprobe::system::task::Dispatcher;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

fn host_is_supported() -> bool {
    cfg!(any(target_os = "linux", target_os = "macos"))
}

#[test]
fn cpu_sample_covers_every_logical_core() {
    if !host_is_supported() {
        return;
    }
    let sampler = platform::host(Path::new("/proc/stat"));
    let ticks = sampler.sample_cpu().expect("host cpu counters");

    let sys = System::new_with_specifics(
        RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing()),
    );
    assert_eq!(ticks.len(), sys.cpus().len());
    assert!(ticks.iter().all(|t| t.total() > 0));
}

#[test]
fn network_enumeration_ends_with_total() {
    if !host_is_supported() {
        return;
    }
    let sampler = platform::host(Path::new("/proc/stat"));
    let interfaces = hostprobe::system::network::enumerate(sampler.as_ref()).expect("interfaces");

    let (total, real) = interfaces.split_last().expect("total record");
    assert!(total.is_total());
    assert_eq!(total.input_bytes, real.iter().map(|i| i.input_bytes).sum::<u64>());
    assert_eq!(total.output_bytes, real.iter().map(|i| i.output_bytes).sum::<u64>());
    assert!(real.iter().all(|i| !i.is_total()));
}

#[tokio::test]
async fn live_cpu_usage_is_a_percentage() {
    if !host_is_supported() {
        return;
    }
    let dispatcher = Dispatcher::with_load_interval(
        platform::host(Path::new("/proc/stat")),
        Duration::from_millis(250),
    )
    .expect("spawn sampling worker");

    // An idle core can legitimately see zero elapsed ticks in a short window.
    match dispatcher.cpu_usage().await {
        Ok(usages) => {
            for usage in usages {
                assert!((0.0..=100.0 + 1e-9).contains(&usage.total_percent), "{usage:?}");
            }
        }
        Err(err) => assert!(err.is_retryable(), "unexpected error: {err}"),
    }
}
