use crate::error::WardenError;

/// Platform memory access: range validation plus the external CRC primitive.
///
/// The monitor never implements the checksum algorithm; it only threads the
/// `partial` accumulator across budgeted calls.
pub trait MemAccess: Send {
    /// Identifier for logging/telemetry (e.g. "sim", "mock").
    fn name(&self) -> &'static str;

    /// True when `[addr, addr + len)` is mapped and addressable.
    fn validate_range(&self, addr: u32, len: u32) -> bool;

    /// CRC over `len` bytes at `addr`, continuing from `partial`.
    /// `partial = 0` starts a fresh computation.
    fn crc_range(&self, addr: u32, len: u32, partial: u32) -> Result<u32, WardenError>;
}
