//! Driver for Cartadis TCRS vending card readers.
//!
//! The terminal speaks a line oriented text protocol over a serial link. This
//! crate frames commands, strips echoes and prompts from the answers, and
//! offers a verified "adjust balance" operation on top.
//!
//! # Features
//!
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use tcrs::{CardTransaction, SessionConfig, Terminal, TerminalSession};
//!
//! let config = SessionConfig::new("/dev/ttyS0").with_debug(true);
//! let mut session = TerminalSession::open_serial(config)?;
//!
//! let mut card = CardTransaction::begin(&mut session)?;
//! let balance = card.adjust_balance(-3)?;
//! println!("Remaining credits: {}", balance);
//! card.release()?;
//! session.close();
//! ```

mod codec;
mod config;
mod error;
mod session;
mod terminal;
mod transaction;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use codec::{Frame, FrameCodec, ParsedResponse};
pub use config::{SessionConfig, DEFAULT_DEBIT_CARD_TYPES};
pub use error::{AdminError, ReadError, Result, TcrsError, WriteError};
pub use session::TerminalSession;
pub use terminal::Terminal;
pub use transaction::{CardState, CardTransaction};
pub use transport::TerminalTransport;
pub use types::{CardFields, CardType, SensorState};

#[cfg(feature = "serial")]
pub use serial::{SerialTransport, BAUD_RATE};
