/// Trait for terminal communication backends.
/// Implement this trait for the byte stream the terminal is attached to (serial port, mock, etc.)
pub trait TerminalTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug;

    /// Write data to the transport.
    ///
    /// Returns the number of bytes written; anything short of `data.len()` is
    /// treated as a failure by the session.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read data from the transport with a timeout in milliseconds.
    ///
    /// Returns `Ok(0)` when the timeout expires without any data.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Push any buffered output to the device
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Clear the input buffer
    fn clear_input(&mut self) -> Result<(), Self::Error>;
}
