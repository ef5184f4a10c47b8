//! Line framing for the TCRS text protocol.
//!
//! A request is `KEYWORD[ PARAMETER]\r`. The terminal answers with
//! `\r\n<payload>\r\n$`, possibly preceded by a stray `$` left over from the
//! previous prompt and by the echo of the request itself.

use crate::error::{Result, TcrsError};

/// Outcome of decoding one raw answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// Text found between the start-of-line and prompt markers
    Payload(String),
    /// The terminal acknowledged without any payload
    EmptyAck,
    /// The answer did not match the expected framing; holds the untouched raw bytes
    Malformed(Vec<u8>),
}

impl ParsedResponse {
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Payload(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// One request: a keyword and its optional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub command: &'a str,
    pub parameter: Option<&'a str>,
}

impl<'a> Frame<'a> {
    pub fn new(command: &'a str, parameter: Option<&'a str>) -> Self {
        Self { command, parameter }
    }

    /// Wire line for this frame, see [`FrameCodec::encode`].
    pub fn encode(&self) -> Result<Vec<u8>> {
        FrameCodec::encode(self.command, self.parameter)
    }
}

pub struct FrameCodec;

impl FrameCodec {
    /// Start of line, begins each answer
    pub const START_OF_LINE: &'static [u8] = b"\r\n";
    /// Marks the end of an answer
    pub const PROMPT: &'static [u8] = b"\r\n$";
    /// Short form of the prompt a terminal may leave behind
    pub const PROMPT_CHAR: &'static [u8] = b"$";
    /// End of command
    pub const END_OF_COMMAND: &'static [u8] = b"\r";

    /// Builds the wire line for `command` and its optional parameter.
    ///
    /// No escaping is done, so CR or LF inside either part is rejected.
    pub fn encode(command: &str, parameter: Option<&str>) -> Result<Vec<u8>> {
        if command.is_empty() {
            return Err(TcrsError::InvalidParameter("Command must not be empty".into()));
        }
        Self::check_field("command", command)?;

        let mut line = Vec::with_capacity(command.len() + 2);
        line.extend_from_slice(command.as_bytes());
        if let Some(parameter) = parameter {
            Self::check_field("parameter", parameter)?;
            line.push(b' ');
            line.extend_from_slice(parameter.as_bytes());
        }
        line.extend_from_slice(Self::END_OF_COMMAND);
        Ok(line)
    }

    /// Decodes a raw answer to the wire line `sent`.
    ///
    /// Stripping order matters: stray prompt first, then the echoed command,
    /// then the framing markers.
    pub fn decode(raw: &[u8], sent: &[u8]) -> ParsedResponse {
        let mut rest = raw.strip_prefix(Self::PROMPT_CHAR).unwrap_or(raw);
        if !sent.is_empty() {
            rest = rest.strip_prefix(sent).unwrap_or(rest);
        }

        if rest.is_empty() || rest == Self::START_OF_LINE || rest == Self::PROMPT {
            return ParsedResponse::EmptyAck;
        }

        let framed_len = Self::START_OF_LINE.len() + Self::PROMPT.len();
        if rest.len() >= framed_len
            && rest.starts_with(Self::START_OF_LINE)
            && rest.ends_with(Self::PROMPT)
        {
            let payload = &rest[Self::START_OF_LINE.len()..rest.len() - Self::PROMPT.len()];
            if payload.is_empty() {
                return ParsedResponse::EmptyAck;
            }
            return ParsedResponse::Payload(String::from_utf8_lossy(payload).into_owned());
        }

        ParsedResponse::Malformed(raw.to_vec())
    }

    /// True once `buffer` holds a complete answer.
    pub fn is_complete(buffer: &[u8]) -> bool {
        buffer.ends_with(Self::PROMPT)
    }

    /// Parses a space separated list of integers such as the `listgrp` payload.
    pub fn parse_int_list(command: &str, payload: &str) -> Result<Vec<i32>> {
        payload
            .split_whitespace()
            .map(|item| {
                item.parse::<i32>().map_err(|_| TcrsError::Parse {
                    command: command.into(),
                    payload: payload.into(),
                })
            })
            .collect()
    }

    pub fn parse_int(command: &str, payload: &str) -> Result<i32> {
        payload.trim().parse::<i32>().map_err(|_| TcrsError::Parse {
            command: command.into(),
            payload: payload.into(),
        })
    }

    fn check_field(name: &str, value: &str) -> Result<()> {
        if value.contains(['\r', '\n']) {
            return Err(TcrsError::InvalidParameter(format!(
                "{} must not contain CR or LF: {:?}",
                name, value
            )));
        }
        Ok(())
    }
}
