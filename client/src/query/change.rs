//! The write path: status-only commands with explicit invalidation hooks.

use super::{Dispatcher, Obsolete, Query, Responses};
use crate::error::{Result, TraciError};
use crate::link::Link;
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use wire::constants::REMOVE;
use wire::{Command, Value, WireWriter};

/// Sets one variable of one object, or adds/removes an object.
///
/// The simulator answers with a status only. After a successful status every
/// read query registered through [`ChangeStateQuery::invalidates`] is made
/// obsolete; nothing is inferred.
pub struct ChangeStateQuery {
    command: u8,
    object_id: String,
    variable: u8,
    value: Mutex<Option<Value>>,
    on_success: Vec<Arc<dyn Obsolete>>,
}

impl ChangeStateQuery {
    pub fn new(command: u8, object_id: impl Into<String>, variable: u8) -> Self {
        Self {
            command,
            object_id: object_id.into(),
            variable,
            value: Mutex::new(None),
            on_success: Vec::new(),
        }
    }

    /// Creates a simulation object described by `descriptor`
    pub fn add(command: u8, variable: u8, object_id: impl Into<String>, descriptor: Value) -> Self {
        Self::new(command, object_id, variable).with_value(descriptor)
    }

    /// Removes a simulation object, `reason` being one of the REMOVE_* codes
    pub fn remove(command: u8, object_id: impl Into<String>, reason: u8) -> Self {
        Self::new(command, object_id, REMOVE).with_value(Value::UByte(reason))
    }

    pub fn with_value(self, value: Value) -> Self {
        *self.value.lock() = Some(value);
        self
    }

    /// Declares a read query that a successful run makes obsolete
    pub fn invalidates(mut self, query: Arc<dyn Obsolete>) -> Self {
        self.on_success.push(query);
        self
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn variable(&self) -> u8 {
        self.variable
    }

    pub fn value(&self) -> Option<Value> {
        self.value.lock().clone()
    }

    pub fn set_value(&self, value: Value) {
        *self.value.lock() = Some(value);
    }

    pub fn run<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<()> {
        dispatcher.dispatch(&[self])
    }

    /// Sets the value and runs in one call
    pub fn run_with<L: Link>(&self, value: Value, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.set_value(value);
        self.run(dispatcher)
    }
}

impl Query for ChangeStateQuery {
    fn requests(&self) -> Result<Vec<Command>> {
        let value = self.value.lock();
        let value = value.as_ref().ok_or_else(|| TraciError::MissingValue {
            object: self.object_id.clone(),
            variable: self.variable,
        })?;

        let mut payload = WireWriter::new();
        payload.write_u8(self.variable);
        payload.write_string(&self.object_id)?;
        value.write(&mut payload)?;
        Ok(vec![Command::new(self.command, payload.into_bytes())])
    }

    fn consume(&self, responses: &mut Responses<'_>) -> Result<()> {
        let container = responses.next_container()?;
        if !container.status().is_ok() {
            return Err(TraciError::Simulator {
                command: container.status().command(),
                result: container.status().result(),
                description: container.status().description().to_string(),
            });
        }

        debug!(
            "changed 0x{:02x} of '{}', invalidating {} reads",
            self.variable,
            self.object_id,
            self.on_success.len()
        );
        for query in &self.on_success {
            query.set_obsolete();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ReadQuery;
    use crate::testing::{ok, value_reply, ScriptedLink};
    use wire::constants::*;
    use wire::{ResponseContainer, StatusResponse, ValueType, WireReader};

    fn max_speed_read() -> Arc<ReadQuery> {
        Arc::new(ReadQuery::new(
            CMD_GET_VEHICLE_VARIABLE,
            "veh0",
            VAR_MAXSPEED,
            ValueType::Double,
        ))
    }

    #[test]
    fn test_success_runs_invalidation_hooks() {
        let link = ScriptedLink::new();
        link.push_reply(vec![value_reply(
            CMD_GET_VEHICLE_VARIABLE,
            VAR_MAXSPEED,
            "veh0",
            Value::Double(30.0),
        )]);
        link.push_reply(vec![ok(CMD_SET_VEHICLE_VARIABLE)]);
        let dispatcher = Dispatcher::new(link);

        let read = max_speed_read();
        let write = ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, "veh0", VAR_MAXSPEED)
            .invalidates(read.clone());

        read.get(&dispatcher).unwrap();
        assert!(read.is_cached());

        write.run_with(Value::Double(20.0), &dispatcher).unwrap();
        assert!(!read.is_cached());
    }

    #[test]
    fn test_failure_keeps_dependent_reads() {
        let link = ScriptedLink::new();
        link.push_reply(vec![value_reply(
            CMD_GET_VEHICLE_VARIABLE,
            VAR_MAXSPEED,
            "veh0",
            Value::Double(30.0),
        )]);
        link.push_reply(vec![ResponseContainer::status_only(StatusResponse::error(
            CMD_SET_VEHICLE_VARIABLE,
            "Invalid speed",
        ))]);
        let dispatcher = Dispatcher::new(link);

        let read = max_speed_read();
        let write = ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, "veh0", VAR_MAXSPEED)
            .invalidates(read.clone());

        read.get(&dispatcher).unwrap();
        let err = write.run_with(Value::Double(-1.0), &dispatcher).unwrap_err();
        assert!(matches!(err, TraciError::Simulator { .. }));
        assert!(read.is_cached());
    }

    #[test]
    fn test_missing_value_is_misuse() {
        let write = ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, "veh0", VAR_COLOR);
        assert!(matches!(
            write.requests(),
            Err(TraciError::MissingValue { variable: VAR_COLOR, .. })
        ));
    }

    #[test]
    fn test_remove_payload() {
        let remove = ChangeStateQuery::remove(CMD_SET_VEHICLE_VARIABLE, "veh7", REMOVE_VAPORIZED);
        let commands = remove.requests().unwrap();
        assert_eq!(commands[0].id(), CMD_SET_VEHICLE_VARIABLE);

        let mut reader = WireReader::new(commands[0].payload());
        assert_eq!(reader.read_u8().unwrap(), REMOVE);
        assert_eq!(reader.read_string().unwrap(), "veh7");
        assert_eq!(
            Value::read(&mut reader).unwrap(),
            Value::UByte(REMOVE_VAPORIZED)
        );
        assert!(reader.is_empty());
    }
}
