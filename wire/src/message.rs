//! Request and response messages.
//!
//! Every message is framed by a 4-byte length that counts itself. A request
//! is a plain command sequence. A response is a sequence of containers, each
//! led by a status block; what follows the status depends on the echoed
//! command id (see [`crate::constants::STATUS_ONLY_COMMANDS`]).

use crate::buffer::{WireReader, WireWriter};
use crate::command::Command;
use crate::constants::{is_status_only, CMD_SIMSTEP, RTYPE_ERR, RTYPE_OK};
use crate::error::{Result, WireError};

const FRAME_HEADER: usize = 4;

fn open_frame(bytes: &[u8]) -> Result<WireReader<'_>> {
    let mut reader = WireReader::new(bytes);
    let declared = reader.read_u32()? as usize;
    if declared != bytes.len() {
        return Err(WireError::LengthMismatch {
            declared,
            actual: bytes.len(),
        });
    }
    Ok(reader)
}

fn close_frame(body: WireWriter) -> Result<Vec<u8>> {
    let total = FRAME_HEADER + body.len();
    let declared = u32::try_from(total).map_err(|_| WireError::FrameTooLarge(total))?;
    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(&declared.to_be_bytes());
    bytes.extend_from_slice(body.as_slice());
    Ok(bytes)
}

/// Ordered commands sent as one physical message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMessage {
    commands: Vec<Command>,
}

impl RequestMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut body = WireWriter::new();
        for command in &self.commands {
            command.write(&mut body)?;
        }
        close_frame(body)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = open_frame(bytes)?;
        let mut commands = Vec::new();
        while !reader.is_empty() {
            commands.push(Command::read(&mut reader)?);
        }
        Ok(Self { commands })
    }
}

impl Extend<Command> for RequestMessage {
    fn extend<T: IntoIterator<Item = Command>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}

/// The status block leading every response container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    command: u8,
    result: u8,
    description: String,
}

impl StatusResponse {
    pub fn new(command: u8, result: u8, description: impl Into<String>) -> Self {
        Self {
            command,
            result,
            description: description.into(),
        }
    }

    pub fn ok(command: u8) -> Self {
        Self::new(command, RTYPE_OK, "")
    }

    pub fn error(command: u8, description: impl Into<String>) -> Self {
        Self::new(command, RTYPE_ERR, description)
    }

    /// The command id this status answers
    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn result(&self) -> u8 {
        self.result
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_ok(&self) -> bool {
        self.result == RTYPE_OK
    }

    fn from_command(command: Command) -> Result<Self> {
        let mut reader = command.reader();
        let result = reader.read_u8()?;
        let description = reader.read_string()?;
        Ok(Self::new(command.id(), result, description))
    }

    fn to_command(&self) -> Result<Command> {
        let mut payload = WireWriter::new();
        payload.write_u8(self.result);
        payload.write_string(&self.description)?;
        Ok(Command::new(self.command, payload.into_bytes()))
    }
}

/// One status plus whatever the answered command returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseContainer {
    status: StatusResponse,
    response: Option<Command>,
    sub_responses: Option<Vec<Command>>,
}

impl ResponseContainer {
    pub fn status_only(status: StatusResponse) -> Self {
        Self {
            status,
            response: None,
            sub_responses: None,
        }
    }

    pub fn with_response(status: StatusResponse, response: Command) -> Self {
        Self {
            status,
            response: Some(response),
            sub_responses: None,
        }
    }

    pub fn with_sub_responses(status: StatusResponse, sub_responses: Vec<Command>) -> Self {
        Self {
            status,
            response: None,
            sub_responses: Some(sub_responses),
        }
    }

    pub fn status(&self) -> &StatusResponse {
        &self.status
    }

    pub fn response(&self) -> Option<&Command> {
        self.response.as_ref()
    }

    pub fn sub_responses(&self) -> Option<&[Command]> {
        self.sub_responses.as_deref()
    }

    fn read(reader: &mut WireReader<'_>) -> Result<Self> {
        let status = StatusResponse::from_command(Command::read(reader)?)?;

        if !status.is_ok() || is_status_only(status.command()) {
            return Ok(Self::status_only(status));
        }

        if status.command() == CMD_SIMSTEP {
            let count = reader.read_count()?;
            let mut sub_responses = Vec::with_capacity(count.min(reader.remaining()));
            for _ in 0..count {
                sub_responses.push(Command::read(reader)?);
            }
            return Ok(Self::with_sub_responses(status, sub_responses));
        }

        let response = Command::read(reader)?;
        Ok(Self::with_response(status, response))
    }

    fn write(&self, writer: &mut WireWriter) -> Result<()> {
        self.status.to_command()?.write(writer)?;
        if let Some(sub_responses) = &self.sub_responses {
            writer.write_count(sub_responses.len())?;
            for command in sub_responses {
                command.write(writer)?;
            }
        } else if let Some(response) = &self.response {
            response.write(writer)?;
        }
        Ok(())
    }
}

/// All containers parsed out of one framed response buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMessage {
    containers: Vec<ResponseContainer>,
}

impl ResponseMessage {
    pub fn new(containers: Vec<ResponseContainer>) -> Self {
        Self { containers }
    }

    pub fn containers(&self) -> &[ResponseContainer] {
        &self.containers
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = open_frame(bytes)?;
        let mut containers = Vec::new();
        while !reader.is_empty() {
            containers.push(ResponseContainer::read(&mut reader)?);
        }
        Ok(Self { containers })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut body = WireWriter::new();
        for container in &self.containers {
            container.write(&mut body)?;
        }
        close_frame(body)
    }
}
