//! Session configuration

use std::time::Duration;

/// Card types whose balance is tracked by default.
///
/// The terminal's manual does not list which card type codes are debit cards,
/// so this is a placeholder. Installations should set the codes their cards
/// use through [`SessionConfig::with_debit_card_types`].
pub const DEFAULT_DEBIT_CARD_TYPES: [i32; 4] = [3, 5, 6, 7];

/// Settings for a [`TerminalSession`](crate::TerminalSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Device the terminal is attached to, e.g. `/dev/ttyS0`
    pub device: String,
    /// How long to wait for a complete answer
    pub timeout: Duration,
    /// Log malformed answers
    pub debug: bool,
    /// Swallow the single prompt byte some terminals emit after power-up
    pub consume_power_up_prompt: bool,
    /// Delay between two `sensor` polls while waiting for a card
    pub poll_interval: Duration,
    pub debit_card_types: Vec<i32>,
}

impl SessionConfig {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_power_up_prompt(mut self, consume: bool) -> Self {
        self.consume_power_up_prompt = consume;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_debit_card_types(mut self, types: impl Into<Vec<i32>>) -> Self {
        self.debit_card_types = types.into();
        self
    }

    /// Timeout in milliseconds, saturated to what the transport accepts
    pub(crate) fn timeout_ms(&self) -> u32 {
        u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyS0".into(),
            timeout: Duration::from_secs(5),
            debug: false,
            consume_power_up_prompt: false,
            poll_interval: Duration::from_secs(1),
            debit_card_types: DEFAULT_DEBIT_CARD_TYPES.to_vec(),
        }
    }
}
