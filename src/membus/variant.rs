use crate::error::WardenError;
use crate::traits::MemAccess;

use super::{MockBus, SimBus};

/// Enum representing all platform memory backends.
pub enum MemBusVariant {
    Sim(SimBus),
    Mock(MockBus),
}

impl MemBusVariant {
    pub fn new_sim(limit: u32) -> Self {
        MemBusVariant::Sim(SimBus::new(limit))
    }

    pub fn new_mock(mock: MockBus) -> Self {
        MemBusVariant::Mock(mock)
    }

    pub fn as_sim_mut(&mut self) -> Option<&mut SimBus> {
        match self {
            MemBusVariant::Sim(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_mock(&self) -> Option<&MockBus> {
        match self {
            MemBusVariant::Mock(inner) => Some(inner),
            _ => None,
        }
    }
}

impl MemAccess for MemBusVariant {
    fn name(&self) -> &'static str {
        match self {
            MemBusVariant::Sim(inner) => inner.name(),
            MemBusVariant::Mock(inner) => inner.name(),
        }
    }

    fn validate_range(&self, addr: u32, len: u32) -> bool {
        match self {
            MemBusVariant::Sim(inner) => inner.validate_range(addr, len),
            MemBusVariant::Mock(inner) => inner.validate_range(addr, len),
        }
    }

    fn crc_range(&self, addr: u32, len: u32, partial: u32) -> Result<u32, WardenError> {
        match self {
            MemBusVariant::Sim(inner) => inner.crc_range(addr, len, partial),
            MemBusVariant::Mock(inner) => inner.crc_range(addr, len, partial),
        }
    }
}
