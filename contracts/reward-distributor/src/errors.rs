use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotListed = 3,
    /// Zero or unchanged address, or a global speed change while paused.
    InvalidParameter = 4,
    /// Speed recomputation requested from inside a guarded section.
    CallerNotEOA = 5,
    LengthMismatch = 6,
    TransferFailed = 7,
    MathOverflow = 8,
}
