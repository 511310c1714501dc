use super::Sampler;
use crate::system::error::SampleError;
use crate::system::snapshot::{InterfaceSnapshot, TickSnapshot};

/// Sampler for hosts with neither counter mechanism. Refuses every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unsupported;

impl Sampler for Unsupported {
    fn sample_cpu(&self) -> Result<Vec<TickSnapshot>, SampleError> {
        Err(SampleError::UnsupportedPlatform)
    }

    fn sample_network(&self) -> Result<Vec<InterfaceSnapshot>, SampleError> {
        Err(SampleError::UnsupportedPlatform)
    }
}
