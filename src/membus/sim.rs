use std::collections::BTreeMap;

use crate::error::WardenError;
use crate::traits::MemAccess;

/// Simulated platform memory: a sparse map of provisioned regions below a
/// configured address limit. Regions are filled with a deterministic pattern
/// so checksums are stable across runs.
pub struct SimBus {
    limit: u32,
    regions: BTreeMap<u32, Vec<u8>>,
}

impl SimBus {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            regions: BTreeMap::new(),
        }
    }

    /// Deterministic fill pattern seeded by the byte's absolute address.
    fn pattern(addr: u32) -> u8 {
        let x = addr.wrapping_mul(0x9E37_79B9).rotate_left(13);
        (x ^ (x >> 16)) as u8
    }

    /// Map `[addr, addr + len)` with the deterministic pattern. A range fully
    /// inside an existing region is a no-op; a partial overlap is rejected.
    pub fn provision(&mut self, addr: u32, len: u32) -> Result<(), WardenError> {
        if len == 0 || addr.checked_add(len).map_or(true, |end| end > self.limit) {
            return Err(WardenError::InvalidRange { addr, len });
        }
        if self.locate(addr, len).is_some() {
            return Ok(());
        }
        if self.overlaps(addr, len) {
            return Err(WardenError::InvalidRange { addr, len });
        }
        let data = (0..len).map(|i| Self::pattern(addr + i)).collect();
        self.regions.insert(addr, data);
        Ok(())
    }

    /// Install explicit content at `addr`, replacing any region starting there.
    pub fn install(&mut self, addr: u32, data: Vec<u8>) -> Result<(), WardenError> {
        let len = data.len() as u32;
        if len == 0 || addr.checked_add(len).map_or(true, |end| end > self.limit) {
            return Err(WardenError::InvalidRange { addr, len });
        }
        self.regions.remove(&addr);
        if self.overlaps(addr, len) {
            return Err(WardenError::InvalidRange { addr, len });
        }
        self.regions.insert(addr, data);
        Ok(())
    }

    /// Overwrite bytes inside an already-mapped region (test/demo corruption).
    pub fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<(), WardenError> {
        let len = bytes.len() as u32;
        for (start, data) in self.regions.iter_mut() {
            let end = start + data.len() as u32;
            if addr >= *start && addr + len <= end {
                let off = (addr - start) as usize;
                data[off..off + bytes.len()].copy_from_slice(bytes);
                return Ok(());
            }
        }
        Err(WardenError::InvalidRange { addr, len })
    }

    fn overlaps(&self, addr: u32, len: u32) -> bool {
        let end = addr + len;
        self.regions
            .iter()
            .any(|(start, data)| addr < start + data.len() as u32 && *start < end)
    }

    fn locate(&self, addr: u32, len: u32) -> Option<&[u8]> {
        let (start, data) = self.regions.range(..=addr).next_back()?;
        let end = start + data.len() as u32;
        if addr.checked_add(len)? <= end {
            let off = (addr - start) as usize;
            Some(&data[off..off + len as usize])
        } else {
            None
        }
    }
}

impl MemAccess for SimBus {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn validate_range(&self, addr: u32, len: u32) -> bool {
        len > 0 && self.locate(addr, len).is_some()
    }

    fn crc_range(&self, addr: u32, len: u32, partial: u32) -> Result<u32, WardenError> {
        if len == 0 {
            return Ok(partial);
        }
        let slice = self
            .locate(addr, len)
            .ok_or(WardenError::InvalidRange { addr, len })?;
        let mut hasher = crc32fast::Hasher::new_with_initial(partial);
        hasher.update(slice);
        Ok(hasher.finalize())
    }
}
