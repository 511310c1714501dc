use std::fmt;
use std::path::PathBuf;

pub const CODE_UNSUPPORTED: i32 = 1;
pub const CODE_COUNTER_SOURCE_MISSING: i32 = 1002;
pub const CODE_DIVIDE_BY_ZERO: i32 = 1003;
pub const CODE_NOT_LOADED: i32 = 1004;
pub const CODE_CORE_COUNT_MISMATCH: i32 = 1005;
pub const CODE_ABANDONED: i32 = 1006;
pub const CODE_NO_CORES: i32 = 1007;

/// Hard failure of a sampling pass. Partial data never accompanies one.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleError {
    /// A host query or list call failed.
    Io { code: i32, message: String },
    /// The cumulative CPU counter pseudo-file could not be opened.
    CounterSourceMissing { path: PathBuf },
    UnsupportedPlatform,
    /// No ticks elapsed on `core` between the two generations.
    DivideByZero { core: usize },
    NotLoaded,
    CoreCountMismatch { current: usize, previous: usize },
    /// The worker went away without delivering a completion.
    Abandoned,
    /// The counter source was readable but listed no cores.
    NoCores,
}

impl SampleError {
    pub fn io(code: i32, message: impl Into<String>) -> Self {
        SampleError::Io {
            code,
            message: message.into(),
        }
    }

    /// Failure of the aggregate per-processor query, keeping its native return code.
    pub fn processor_query(code: i32) -> Self {
        SampleError::io(code, "Failed to scan processor info.")
    }

    /// Builds an `Io` error from the calling thread's current errno.
    pub fn last_os_error() -> Self {
        let err = std::io::Error::last_os_error();
        let code = match err.raw_os_error() {
            Some(0) | None => 1,
            Some(code) => code,
        };
        SampleError::io(code, err.to_string())
    }

    /// Host-visible error code.
    pub fn code(&self) -> i32 {
        match self {
            SampleError::Io { code, .. } => *code,
            SampleError::CounterSourceMissing { .. } => CODE_COUNTER_SOURCE_MISSING,
            SampleError::UnsupportedPlatform => CODE_UNSUPPORTED,
            SampleError::DivideByZero { .. } => CODE_DIVIDE_BY_ZERO,
            SampleError::NotLoaded => CODE_NOT_LOADED,
            SampleError::CoreCountMismatch { .. } => CODE_CORE_COUNT_MISMATCH,
            SampleError::Abandoned => CODE_ABANDONED,
            SampleError::NoCores => CODE_NO_CORES,
        }
    }

    /// True when the data exists but is not meaningful yet, so a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SampleError::DivideByZero { .. })
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Io { message, .. } => f.write_str(message),
            SampleError::CounterSourceMissing { path } => {
                write!(f, "File {} does not exist.", path.display())
            }
            SampleError::UnsupportedPlatform => f.write_str("Failed to scan processor info."),
            SampleError::DivideByZero { core } => {
                write!(f, "No CPU ticks elapsed on core {core} between samples.")
            }
            SampleError::NotLoaded => f.write_str("CPU usage requested before two samples were taken."),
            SampleError::CoreCountMismatch { current, previous } => write!(
                f,
                "Core count changed between samples ({previous} then {current})."
            ),
            SampleError::Abandoned => f.write_str("Sampling worker stopped before completing the task."),
            SampleError::NoCores => f.write_str("No per-core CPU counters found."),
        }
    }
}

impl std::error::Error for SampleError {}
