use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    AccessDenied = 3,
    NotListed = 4,
    AlreadyListed = 5,
    InvalidParameter = 6,
    PriceUnavailable = 7,
    InsufficientLiquidity = 8,
    ActionPaused = 9,
    /// A pause guardian tried to lift a pause; only the owner can unpause.
    OwnerOnlyUnpause = 10,
    NotMarketToken = 11,
    CapacityExceeded = 12,
    NoShortfall = 13,
    RepayTooLarge = 14,
    InsufficientBalance = 15,
    InsufficientCash = 16,
    OutstandingBorrow = 17,
    FlashloanNotRepaid = 18,
    MathOverflow = 19,
}
