use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::WardenError;
use crate::traits::MemAccess;

/// Mock bus for testing: scripted CRC return values and range verdicts,
/// with full call recording. `RefCell` because the trait reads through `&self`.
#[derive(Debug, Default)]
pub struct MockBus {
    /// Values popped front-first by `crc_range`; when exhausted a
    /// deterministic fallback is produced.
    pub crc_returns: RefCell<VecDeque<u32>>,
    /// Ranges reported as invalid by `validate_range`.
    pub invalid_ranges: Vec<(u32, u32)>,
    /// When set, every `crc_range` call fails.
    pub fail_crc: bool,
    /// Recorded `(addr, len, partial)` of every `crc_range` call.
    pub crc_calls: RefCell<Vec<(u32, u32, u32)>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(values: &[u32]) -> Self {
        Self {
            crc_returns: RefCell::new(values.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(u32, u32, u32)> {
        self.crc_calls.borrow().clone()
    }
}

impl MemAccess for MockBus {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn validate_range(&self, addr: u32, len: u32) -> bool {
        len > 0 && !self.invalid_ranges.contains(&(addr, len))
    }

    fn crc_range(&self, addr: u32, len: u32, partial: u32) -> Result<u32, WardenError> {
        self.crc_calls.borrow_mut().push((addr, len, partial));
        if self.fail_crc {
            return Err(WardenError::InvalidRange { addr, len });
        }
        // Scripted value if any, otherwise a deterministic fold so budget
        // arithmetic tests do not need a full script.
        let next = self.crc_returns.borrow_mut().pop_front();
        Ok(next.unwrap_or_else(|| partial.wrapping_add(len).wrapping_add(addr >> 4)))
    }
}
