//! Error types for terminal operations.
//!
//! The terminal reports failures as negative integers whose meaning depends on
//! the command that produced them. They are mapped to closed enumerations here
//! so that callers never have to compare against bare numbers.

/// Result type alias for terminal operations.
pub type Result<T> = std::result::Result<T, TcrsError>;

/// Status codes returned by `write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteError {
    WriteError,
    NoCard,
    CardBlocked,
    UnknownCard,
    Invalid,
    MaxTransactionReached,
    ValueTooHigh,
    GroupNotAllowed,
    WriteBeforeRead,
    ReadBeforeWrite,
    ComparisonMismatch,
}

impl WriteError {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::WriteError),
            -2 => Some(Self::NoCard),
            -3 => Some(Self::CardBlocked),
            -4 => Some(Self::UnknownCard),
            -5 => Some(Self::Invalid),
            -6 => Some(Self::MaxTransactionReached),
            -7 => Some(Self::ValueTooHigh),
            -8 => Some(Self::GroupNotAllowed),
            -9 => Some(Self::WriteBeforeRead),
            -10 => Some(Self::ReadBeforeWrite),
            -11 => Some(Self::ComparisonMismatch),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::WriteError => -1,
            Self::NoCard => -2,
            Self::CardBlocked => -3,
            Self::UnknownCard => -4,
            Self::Invalid => -5,
            Self::MaxTransactionReached => -6,
            Self::ValueTooHigh => -7,
            Self::GroupNotAllowed => -8,
            Self::WriteBeforeRead => -9,
            Self::ReadBeforeWrite => -10,
            Self::ComparisonMismatch => -11,
        }
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::WriteError => "write error",
            Self::NoCard => "no card",
            Self::CardBlocked => "card blocked",
            Self::UnknownCard => "unknown card",
            Self::Invalid => "invalid",
            Self::MaxTransactionReached => "maximum number of transactions reached",
            Self::ValueTooHigh => "value too high",
            Self::GroupNotAllowed => "group not allowed",
            Self::WriteBeforeRead => "write before read",
            Self::ReadBeforeWrite => "read before write",
            Self::ComparisonMismatch => "comparison error",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

/// Status codes returned by `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadError {
    ReadError,
}

impl ReadError {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::ReadError),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        -1
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "read error ({})", self.code())
    }
}

/// Status codes returned by the group administration commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminError {
    IllegalGroup,
    NotAdmin,
    ListFull,
    AdminNotAllowed,
}

impl AdminError {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::IllegalGroup),
            -9 => Some(Self::NotAdmin),
            -10 => Some(Self::ListFull),
            -11 => Some(Self::AdminNotAllowed),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::IllegalGroup => -1,
            Self::NotAdmin => -9,
            Self::ListFull => -10,
            Self::AdminNotAllowed => -11,
        }
    }
}

impl std::fmt::Display for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::IllegalGroup => "illegal group",
            Self::NotAdmin => "not an administrator card",
            Self::ListFull => "group list full",
            Self::AdminNotAllowed => "administrator card not allowed",
        };
        write!(f, "{} ({})", text, self.code())
    }
}

/// Errors that can occur while talking to a terminal.
#[derive(Debug, thiserror::Error)]
pub enum TcrsError {
    /// A command was attempted after the session was closed.
    #[error("Device {device} is not open")]
    DeviceClosed { device: String },

    /// Transport layer error (open, read, write or flush).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid parameter passed to a function.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The command exists on the hardware but this driver does not implement it.
    #[error("Unsupported operation: {command}")]
    Unsupported { command: &'static str },

    /// The payload could not be converted to the expected type.
    #[error("Cannot parse answer to {command}: {payload:?}")]
    Parse { command: String, payload: String },

    /// The operation needs an answer but the terminal's was empty or malformed.
    #[error("No usable answer to {command}")]
    UnknownAnswer { command: String },

    #[error("Write failed: {0}")]
    Write(WriteError),

    #[error("Read failed: {0}")]
    Read(ReadError),

    #[error("Administration command failed: {0}")]
    Admin(AdminError),

    /// Negative status code with no named meaning for this command.
    #[error("Unknown status {code} for {command}")]
    UnknownStatus { command: String, code: i32 },

    /// The value staged in the register differs from the one requested.
    #[error("Staged value {staged:?} does not match requested value {expected}")]
    VerificationMismatch { expected: i32, staged: Option<i32> },

    /// Balance operation on a card that carries no value.
    #[error("Card carries no balance")]
    NoBalance,

    /// The transaction was used after its card was released.
    #[error("Card transaction used after release")]
    TransactionReleased,
}
