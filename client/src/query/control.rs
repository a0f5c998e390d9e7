//! Control commands that do not address a simulation object.

use super::{Query, Responses};
use crate::error::{Result, TraciError};
use parking_lot::Mutex;
use wire::constants::{CMD_CLOSE, CMD_GETVERSION, CMD_SIMSTEP};
use wire::{Command, WireWriter};

/// Advances the simulation to an absolute target time (seconds).
///
/// The only command answered by a variable number of sub-responses; they are
/// kept for inspection but not interpreted.
pub struct StepQuery {
    target: Mutex<f64>,
    sub_responses: Mutex<Vec<Command>>,
}

impl StepQuery {
    pub fn new() -> Self {
        Self {
            target: Mutex::new(0.0),
            sub_responses: Mutex::new(Vec::new()),
        }
    }

    pub fn set_target(&self, time: f64) {
        *self.target.lock() = time;
    }

    pub fn target(&self) -> f64 {
        *self.target.lock()
    }

    pub fn sub_responses(&self) -> Vec<Command> {
        self.sub_responses.lock().clone()
    }
}

impl Default for StepQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl Query for StepQuery {
    fn requests(&self) -> Result<Vec<Command>> {
        let mut payload = WireWriter::new();
        payload.write_f64(self.target());
        Ok(vec![Command::new(CMD_SIMSTEP, payload.into_bytes())])
    }

    fn consume(&self, responses: &mut Responses<'_>) -> Result<()> {
        let container = responses.next_container()?;
        let sub_responses = container
            .sub_responses()
            .ok_or(TraciError::MissingResponse(CMD_SIMSTEP))?;
        *self.sub_responses.lock() = sub_responses.to_vec();
        Ok(())
    }
}

/// API level and version string reported by the simulator
pub struct VersionQuery {
    cache: Mutex<Option<(i32, String)>>,
}

impl VersionQuery {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    pub fn cached(&self) -> Option<(i32, String)> {
        self.cache.lock().clone()
    }
}

impl Default for VersionQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl Query for VersionQuery {
    fn requests(&self) -> Result<Vec<Command>> {
        Ok(vec![Command::empty(CMD_GETVERSION)])
    }

    fn consume(&self, responses: &mut Responses<'_>) -> Result<()> {
        let container = responses.next_container()?;
        let response = container
            .response()
            .ok_or(TraciError::MissingResponse(CMD_GETVERSION))?;
        if response.id() != CMD_GETVERSION {
            return Err(TraciError::UnexpectedCommand {
                expected: CMD_GETVERSION,
                actual: response.id(),
            });
        }
        let mut reader = response.reader();
        let api_level = reader.read_i32()?;
        let version = reader.read_string()?;
        *self.cache.lock() = Some((api_level, version));
        Ok(())
    }
}

/// Asks the simulator to shut down; answered by a status only
#[derive(Default)]
pub struct CloseQuery;

impl Query for CloseQuery {
    fn requests(&self) -> Result<Vec<Command>> {
        Ok(vec![Command::empty(CMD_CLOSE)])
    }

    fn consume(&self, responses: &mut Responses<'_>) -> Result<()> {
        responses.next_container()?;
        Ok(())
    }
}
