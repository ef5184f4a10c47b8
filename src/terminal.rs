use crate::codec::ParsedResponse;
use crate::config::SessionConfig;
use crate::error::Result;

/// Capability every terminal model provides.
///
/// Model specific commands are layered on top of `send_command`.
pub trait Terminal: Sized {
    /// Byte stream the terminal is reached through
    type Transport;

    /// Takes ownership of `transport` and performs the startup handshake.
    fn open(transport: Self::Transport, config: SessionConfig) -> Result<Self>;

    /// Releases the transport. Calling it again is a no-op.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Sends one command and blocks until its answer is framed or the read times out.
    fn send_command(&mut self, command: &str, parameter: Option<&str>) -> Result<ParsedResponse>;
}
