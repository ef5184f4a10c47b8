use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

use crate::codec::{Frame, FrameCodec, ParsedResponse};
use crate::config::SessionConfig;
use crate::error::{AdminError, ReadError, Result, TcrsError, WriteError};
use crate::terminal::Terminal;
use crate::transport::TerminalTransport;
use crate::types::{CardFields, CardType, SensorState};

#[cfg(feature = "serial")]
use crate::serial::SerialTransport;

/// Connection to a Cartadis TCRS terminal.
///
/// Commands are strictly sequential: each call blocks until the answer is
/// framed or the read timeout expires. The session performs no locking.
pub struct TerminalSession<T: TerminalTransport> {
    transport: Option<T>,
    config: SessionConfig,
    last_command: Option<Vec<u8>>,
    version_string: Option<String>,
    serial_number: Option<String>,
    supported_commands: Option<String>,
    fields: CardFields,
}

fn transport_error<E: std::fmt::Debug>(e: E) -> TcrsError {
    TcrsError::Transport(format!("{:?}", e))
}

impl<T: TerminalTransport> Terminal for TerminalSession<T> {
    type Transport = T;

    fn open(mut transport: T, config: SessionConfig) -> Result<Self> {
        // A failure before the session exists drops the transport right here.
        transport.clear_input().map_err(|e| {
            error!("Cannot clear input on {}: {:?}", config.device, e);
            transport_error(e)
        })?;

        if config.consume_power_up_prompt {
            let mut byte = [0u8; 1];
            let n = transport
                .read(&mut byte, config.timeout_ms())
                .map_err(transport_error)?;
            if n > 0 {
                debug!("Discarded power-up byte {:?}", byte[0] as char);
            }
        }

        let mut session = Self {
            transport: Some(transport),
            config,
            last_command: None,
            version_string: None,
            serial_number: None,
            supported_commands: None,
            fields: CardFields::default(),
        };

        // From here on an error drops the session, and Drop closes the transport.
        session.version_string = session.version()?;
        session.serial_number = session.serial()?;
        info!(
            "{} terminal detected on device {} with serial number {}",
            session.version_string.as_deref().unwrap_or("Unknown"),
            session.config.device,
            session.serial_number.as_deref().unwrap_or("unknown"),
        );
        session.supported_commands = session.help()?;
        debug!(
            "Supported commands: {}",
            session.supported_commands.as_deref().unwrap_or("unknown")
        );

        Ok(session)
    }

    fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            debug!("Closing serial link to {}", self.config.device);
            drop(transport);
            info!("Serial link to {} closed", self.config.device);
        }
    }

    fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    fn send_command(&mut self, command: &str, parameter: Option<&str>) -> Result<ParsedResponse> {
        let Some(transport) = self.transport.as_mut() else {
            error!("Device {} is not open", self.config.device);
            return Err(TcrsError::DeviceClosed {
                device: self.config.device.clone(),
            });
        };

        let line = Frame::new(command, parameter).encode()?;
        debug!("Sending {:?} to terminal", String::from_utf8_lossy(&line));
        let written = transport.write(&line).map_err(|e| {
            error!("Write error: {:?}", e);
            transport_error(e)
        })?;
        if written < line.len() {
            error!("Short write: {} of {} bytes", written, line.len());
            return Err(TcrsError::Transport(format!(
                "short write: {} of {} bytes",
                written,
                line.len()
            )));
        }
        transport.flush().map_err(transport_error)?;
        self.last_command = Some(line.clone());
        let raw = Self::read_answer(transport, self.config.timeout_ms())?;
        debug!("Terminal answered {:?}", String::from_utf8_lossy(&raw));

        let response = FrameCodec::decode(&raw, &line);
        if response.is_malformed() && self.config.debug {
            warn!(
                "Unknown answer {:?} to {:?}",
                String::from_utf8_lossy(&raw),
                String::from_utf8_lossy(&line)
            );
        }
        Ok(response)
    }
}

#[cfg(feature = "serial")]
impl TerminalSession<SerialTransport> {
    /// Opens the serial device named in `config` and performs the handshake.
    pub fn open_serial(config: SessionConfig) -> Result<Self> {
        let transport = SerialTransport::open(&config.device, config.timeout).map_err(|e| {
            error!("Cannot open {}: {}", config.device, e);
            TcrsError::Transport(e.to_string())
        })?;
        Self::open(transport, config)
    }
}

impl<T: TerminalTransport> TerminalSession<T> {
    pub fn device(&self) -> &str {
        &self.config.device
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Last wire line sent, including the end-of-command marker
    pub fn last_command(&self) -> Option<&[u8]> {
        self.last_command.as_deref()
    }

    /// Version string reported during the handshake
    pub fn version_string(&self) -> Option<&str> {
        self.version_string.as_deref()
    }

    /// Serial number reported during the handshake
    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Answer to `help` obtained during the handshake
    pub fn supported_commands(&self) -> Option<&str> {
        self.supported_commands.as_deref()
    }

    /// Card fields as last read or staged through this session
    pub fn card_fields(&self) -> &CardFields {
        &self.fields
    }

    pub fn is_debit(&self, card_type: CardType) -> bool {
        card_type.is_debit(&self.config.debit_card_types)
    }

    /// Returns the list of commands supported by the terminal.
    pub fn help(&mut self) -> Result<Option<String>> {
        self.query_text("help")
    }

    /// Returns the terminal's version string.
    pub fn version(&mut self) -> Result<Option<String>> {
        self.query_text("version")
    }

    /// Returns the terminal's serial number.
    pub fn serial(&mut self) -> Result<Option<String>> {
        self.query_text("serial")
    }

    /// Loads the card's content into the terminal's register.
    ///
    /// Returns the card type. A missing answer counts as a read error.
    pub fn read(&mut self) -> Result<CardType> {
        let code = match self.send_command("read", None)? {
            ParsedResponse::Payload(payload) => FrameCodec::parse_int("read", &payload)?,
            _ => return Err(TcrsError::Read(ReadError::ReadError)),
        };
        if code < 0 {
            // The terminal documents a single read failure kind.
            debug!("read failed with status {}", code);
            return Err(TcrsError::Read(ReadError::ReadError));
        }
        self.fields = CardFields::default();
        Ok(CardType(code))
    }

    /// Writes the register's values onto the card.
    pub fn write(&mut self) -> Result<()> {
        match self.status("write", None)? {
            0 => Ok(()),
            code => Err(WriteError::from_code(code)
                .map(TcrsError::Write)
                .unwrap_or_else(|| TcrsError::UnknownStatus {
                    command: "write".into(),
                    code,
                })),
        }
    }

    /// Reports whether a card is present.
    pub fn sensor(&mut self) -> Result<Option<SensorState>> {
        match self.query_int("sensor")? {
            Some(code) => SensorState::from_code(code)
                .map(Some)
                .ok_or_else(|| TcrsError::Parse {
                    command: "sensor".into(),
                    payload: code.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Polls `sensor` until a card is fully inserted.
    ///
    /// There is no retry limit: this blocks until a card shows up.
    pub fn wait_for_card(&mut self) -> Result<()> {
        loop {
            match self.sensor()? {
                Some(SensorState::FullyInserted) => return Ok(()),
                state => debug!("Waiting for card, sensor reports {:?}", state),
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Ejects the card from the terminal.
    pub fn eject(&mut self) -> Result<()> {
        self.send_command("eject", None)?;
        self.fields = CardFields::default();
        Ok(())
    }

    /// Returns the number of transactions made with this card.
    pub fn trnum(&mut self) -> Result<Option<i32>> {
        self.query_field("trnum", |fields| &mut fields.transaction_count)
    }

    /// Returns the value held in the register.
    pub fn value(&mut self) -> Result<Option<i32>> {
        self.query_field("value", |fields| &mut fields.value)
    }

    /// Stages a new value. Nothing reaches the card until `write`.
    pub fn set_value(&mut self, value: i32) -> Result<()> {
        self.stage_field("value", value, |fields| &mut fields.value)
    }

    pub fn account(&mut self) -> Result<Option<i32>> {
        self.query_field("account", |fields| &mut fields.account)
    }

    pub fn set_account(&mut self, account: i32) -> Result<()> {
        self.stage_field("account", account, |fields| &mut fields.account)
    }

    pub fn department(&mut self) -> Result<Option<i32>> {
        self.query_field("department", |fields| &mut fields.department)
    }

    pub fn set_department(&mut self, department: i32) -> Result<()> {
        self.stage_field("department", department, |fields| &mut fields.department)
    }

    pub fn group(&mut self) -> Result<Option<i32>> {
        self.query_field("group", |fields| &mut fields.group)
    }

    pub fn set_group(&mut self, group: i32) -> Result<()> {
        self.stage_field("group", group, |fields| &mut fields.group)
    }

    /// Adds a group to the allowed list. Without a group, the one on the admin card is used.
    pub fn addgrp(&mut self, group: Option<i32>) -> Result<()> {
        let parameter = group.map(|g| g.to_string());
        let code = self.status("addgrp", parameter.as_deref())?;
        Self::admin_result("addgrp", code)
    }

    /// Returns the allowed group numbers in the order the terminal lists them.
    pub fn listgrp(&mut self) -> Result<Option<Vec<i32>>> {
        match self.send_command("listgrp", None)? {
            ParsedResponse::Payload(payload) => {
                FrameCodec::parse_int_list("listgrp", &payload).map(Some)
            }
            ParsedResponse::EmptyAck => Ok(Some(Vec::new())),
            ParsedResponse::Malformed(_) => Ok(None),
        }
    }

    /// Removes a group from the allowed list.
    pub fn delgrp(&mut self, group: i32) -> Result<()> {
        let code = self.status("delgrp", Some(&group.to_string()))?;
        Self::admin_result("delgrp", code)
    }

    pub fn cardtype(&mut self) -> Result<Option<i32>> {
        self.query_int("cardtype")
    }

    pub fn set_cardtype(&mut self, card_type: i32) -> Result<()> {
        self.send_command("cardtype", Some(&card_type.to_string()))?;
        Ok(())
    }

    /// Shows `text` on the terminal's screen.
    pub fn display(&mut self, text: &str) -> Result<()> {
        self.send_command("display", Some(text))?;
        Ok(())
    }

    /// Changes the keyboard echo mode. Not supported.
    pub fn echo(&mut self, _mode: i32) -> Result<()> {
        Err(TcrsError::Unsupported { command: "echo" })
    }

    pub fn key(&mut self, _key: i32) -> Result<()> {
        Err(TcrsError::Unsupported { command: "key" })
    }

    /// Reads a string typed on the keyboard. Not supported.
    pub fn getstr(&mut self) -> Result<String> {
        Err(TcrsError::Unsupported { command: "getstr" })
    }

    /// Returns the last key pressed. Not supported.
    pub fn getkey(&mut self) -> Result<i32> {
        Err(TcrsError::Unsupported { command: "getkey" })
    }

    /// Changes the "Introduce card" message. Not supported.
    pub fn prompt1(&mut self, _text: &str) -> Result<()> {
        Err(TcrsError::Unsupported { command: "prompt1" })
    }

    /// Changes the "Credit:" message. Not supported.
    pub fn prompt2(&mut self, _text: &str) -> Result<()> {
        Err(TcrsError::Unsupported { command: "prompt2" })
    }

    /// Changes the text shown after the card's value. Not supported.
    pub fn prompt3(&mut self, _text: &str) -> Result<()> {
        Err(TcrsError::Unsupported { command: "prompt3" })
    }

    fn read_answer(transport: &mut T, timeout_ms: u32) -> Result<Vec<u8>> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        let mut answer = Vec::new();
        let mut chunk = [0u8; 64];

        while !FrameCodec::is_complete(&answer) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("Timed out after {} bytes", answer.len());
                break;
            }
            let remaining_ms = u32::try_from(remaining.as_millis()).unwrap_or(u32::MAX).max(1);

            match transport.read(&mut chunk, remaining_ms) {
                Ok(0) => {
                    debug!("Read timed out after {} bytes", answer.len());
                    break;
                }
                Ok(n) => answer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    error!("Read error: {:?}", e);
                    return Err(transport_error(e));
                }
            }
        }

        Ok(answer)
    }

    fn query_text(&mut self, command: &str) -> Result<Option<String>> {
        Ok(match self.send_command(command, None)? {
            ParsedResponse::Payload(payload) => Some(payload),
            _ => None,
        })
    }

    fn query_int(&mut self, command: &str) -> Result<Option<i32>> {
        match self.send_command(command, None)? {
            ParsedResponse::Payload(payload) => FrameCodec::parse_int(command, &payload).map(Some),
            _ => Ok(None),
        }
    }

    fn query_field(
        &mut self,
        command: &str,
        field: fn(&mut CardFields) -> &mut Option<i32>,
    ) -> Result<Option<i32>> {
        let value = self.query_int(command)?;
        *field(&mut self.fields) = value;
        Ok(value)
    }

    fn stage_field(
        &mut self,
        command: &str,
        value: i32,
        field: fn(&mut CardFields) -> &mut Option<i32>,
    ) -> Result<()> {
        self.send_command(command, Some(&value.to_string()))?;
        *field(&mut self.fields) = Some(value);
        Ok(())
    }

    /// Status code of a command whose outcome must be known.
    fn status(&mut self, command: &str, parameter: Option<&str>) -> Result<i32> {
        match self.send_command(command, parameter)? {
            ParsedResponse::Payload(payload) => FrameCodec::parse_int(command, &payload),
            _ => Err(TcrsError::UnknownAnswer {
                command: command.into(),
            }),
        }
    }

    fn admin_result(command: &str, code: i32) -> Result<()> {
        if code >= 0 {
            return Ok(());
        }
        Err(AdminError::from_code(code)
            .map(TcrsError::Admin)
            .unwrap_or_else(|| TcrsError::UnknownStatus {
                command: command.into(),
                code,
            }))
    }
}

impl<T: TerminalTransport> Drop for TerminalSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}
