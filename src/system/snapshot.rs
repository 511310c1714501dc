/// Cumulative CPU tick counters for one logical core at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSnapshot {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl TickSnapshot {
    pub fn new(user: u64, nice: u64, system: u64, idle: u64) -> Self {
        Self {
            user,
            nice,
            system,
            idle,
        }
    }

    pub fn used(&self) -> u64 {
        self.user + self.nice + self.system
    }

    pub fn total(&self) -> u64 {
        self.used() + self.idle
    }
}

/// Identity and cumulative traffic counters of one network interface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    /// Empty when the host could not resolve a name for `index`.
    pub name: String,
    pub index: u32,
    pub input_packets: u64,
    pub output_packets: u64,
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl InterfaceSnapshot {
    pub const TOTAL_NAME: &'static str = "total";

    pub fn is_total(&self) -> bool {
        self.name == Self::TOTAL_NAME
    }
}
