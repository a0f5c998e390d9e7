//! The read path: one lazily cached value per (object, variable).

use super::{Dispatcher, Obsolete, Query, Responses};
use crate::error::{Result, TraciError};
use crate::link::Link;
use crate::object::StepListener;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;
use wire::constants::RESPONSE_OFFSET;
use wire::{
    BoundingBox, Color, Command, LonLatPosition, Polygon, Position2D, RoadMapPosition, Value,
    ValueType, WireWriter,
};

/// Reads one variable of one object and keeps the last answer until it is
/// declared obsolete.
pub struct ReadQuery {
    command: u8,
    object_id: String,
    variable: u8,
    value_type: ValueType,
    requires_parameter: bool,
    parameter: Mutex<Option<Value>>,
    cache: Mutex<Option<Value>>,
}

impl ReadQuery {
    pub fn new(
        command: u8,
        object_id: impl Into<String>,
        variable: u8,
        value_type: ValueType,
    ) -> Self {
        Self {
            command,
            object_id: object_id.into(),
            variable,
            value_type,
            requires_parameter: false,
            parameter: Mutex::new(None),
            cache: Mutex::new(None),
        }
    }

    /// A query whose request carries a typed parameter, such as a point in time
    pub fn parameterized(
        command: u8,
        object_id: impl Into<String>,
        variable: u8,
        value_type: ValueType,
    ) -> Self {
        Self {
            requires_parameter: true,
            ..Self::new(command, object_id, variable, value_type)
        }
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

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn parameter(&self) -> Option<Value> {
        self.parameter.lock().clone()
    }

    /// Changing the parameter makes the cached value obsolete
    pub fn set_parameter(&self, value: Value) {
        let mut parameter = self.parameter.lock();
        if parameter.as_ref() != Some(&value) {
            *parameter = Some(value);
            self.set_obsolete();
        }
    }

    pub fn cached(&self) -> Option<Value> {
        self.cache.lock().clone()
    }

    pub fn is_cached(&self) -> bool {
        self.cache.lock().is_some()
    }

    pub fn set_obsolete(&self) {
        *self.cache.lock() = None;
    }

    /// Returns the cached value, fetching it in a batch of its own if needed
    pub fn get<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Value> {
        if let Some(value) = self.cached() {
            return Ok(value);
        }
        dispatcher.dispatch(&[self])?;
        self.cached().ok_or_else(|| {
            TraciError::Invariant(format!(
                "value of 0x{:02x} for '{}' was discarded before it could be read",
                self.variable, self.object_id
            ))
        })
    }

    fn decode(&self, response: &Command) -> Result<Value> {
        let expected_command = self.command + RESPONSE_OFFSET;
        if response.id() != expected_command {
            return Err(TraciError::UnexpectedCommand {
                expected: expected_command,
                actual: response.id(),
            });
        }

        let mut reader = response.reader();
        let variable = reader.read_u8()?;
        if variable != self.variable {
            return Err(TraciError::UnexpectedVariable {
                expected: self.variable,
                actual: variable,
            });
        }
        let object_id = reader.read_string()?;
        if object_id != self.object_id {
            return Err(TraciError::UnexpectedObject {
                expected: self.object_id.clone(),
                actual: object_id,
            });
        }
        Ok(Value::read_expecting(&mut reader, self.value_type)?)
    }
}

impl Query for ReadQuery {
    fn requests(&self) -> Result<Vec<Command>> {
        let mut payload = WireWriter::new();
        payload.write_u8(self.variable);
        payload.write_string(&self.object_id)?;
        match self.parameter.lock().as_ref() {
            Some(parameter) => parameter.write(&mut payload)?,
            None if self.requires_parameter => {
                return Err(TraciError::MissingParameter {
                    object: self.object_id.clone(),
                    variable: self.variable,
                })
            }
            None => {}
        }
        Ok(vec![Command::new(self.command, payload.into_bytes())])
    }

    fn consume(&self, responses: &mut Responses<'_>) -> Result<()> {
        let container = responses.next_container()?;
        let response = container
            .response()
            .ok_or(TraciError::MissingResponse(self.command))?;
        let value = self.decode(response)?;
        *self.cache.lock() = Some(value);
        Ok(())
    }
}

impl Obsolete for ReadQuery {
    fn set_obsolete(&self) {
        ReadQuery::set_obsolete(self);
    }
}

impl StepListener for ReadQuery {
    fn next_step(&self, _time: f64) {
        self.set_obsolete();
    }
}

/// Conversion out of the decoded value sum type
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! from_value {
    ($target:ty, $variant:ident) => {
        impl FromValue for $target {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(inner) => Ok(inner),
                    other => Err(TraciError::ValueConversion {
                        expected: stringify!($target),
                        actual: other.value_type(),
                    }),
                }
            }
        }
    };
}

from_value!(u8, UByte);
from_value!(i8, Byte);
from_value!(i32, Int);
from_value!(String, String);
from_value!(Vec<String>, StringList);
from_value!(Vec<Value>, Compound);
from_value!(Position2D, Position2D);
from_value!(LonLatPosition, LonLat);
from_value!(RoadMapPosition, RoadMap);
from_value!(BoundingBox, BoundingBox);
from_value!(Color, Color);
from_value!(Polygon, Polygon);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Double(inner) => Ok(inner),
            Value::Float(inner) => Ok(f64::from(inner)),
            other => Err(TraciError::ValueConversion {
                expected: "f64",
                actual: other.value_type(),
            }),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

/// A typed view over a shared [`ReadQuery`]
pub struct TypedQuery<V> {
    query: Arc<ReadQuery>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for TypedQuery<V> {
    fn clone(&self) -> Self {
        Self {
            query: Arc::clone(&self.query),
            _value: PhantomData,
        }
    }
}

impl<V: FromValue> TypedQuery<V> {
    pub fn new(query: Arc<ReadQuery>) -> Self {
        Self {
            query,
            _value: PhantomData,
        }
    }

    pub fn query(&self) -> &Arc<ReadQuery> {
        &self.query
    }

    pub fn get<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<V> {
        V::from_value(self.query.get(dispatcher)?)
    }

    pub fn set_obsolete(&self) {
        self.query.set_obsolete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{value_reply, ScriptedLink};
    use assert_approx_eq::assert_approx_eq;
    use wire::constants::*;

    fn dispatcher_with(replies: Vec<Vec<wire::ResponseContainer>>) -> Dispatcher<ScriptedLink> {
        let link = ScriptedLink::new();
        for reply in replies {
            link.push_reply(reply);
        }
        Dispatcher::new(link)
    }

    #[test]
    fn test_get_fetches_once_until_obsolete() {
        let dispatcher = dispatcher_with(vec![
            vec![value_reply(CMD_GET_VEHICLE_VARIABLE, VAR_SPEED, "veh0", Value::Double(3.0))],
            vec![value_reply(CMD_GET_VEHICLE_VARIABLE, VAR_SPEED, "veh0", Value::Double(4.0))],
        ]);
        let query = ReadQuery::new(CMD_GET_VEHICLE_VARIABLE, "veh0", VAR_SPEED, ValueType::Double);

        assert_eq!(query.get(&dispatcher).unwrap(), Value::Double(3.0));
        assert_eq!(query.get(&dispatcher).unwrap(), Value::Double(3.0));
        assert_eq!(query.get(&dispatcher).unwrap(), Value::Double(3.0));
        assert_eq!(dispatcher.round_trips(), 1);

        query.set_obsolete();
        assert!(!query.is_cached());
        assert_eq!(query.get(&dispatcher).unwrap(), Value::Double(4.0));
        assert_eq!(dispatcher.round_trips(), 2);
    }

    #[test]
    fn test_request_layout() {
        let query = ReadQuery::new(
            CMD_GET_EDGE_VARIABLE,
            "e1",
            LAST_STEP_MEAN_SPEED,
            ValueType::Double,
        );
        let commands = query.requests().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].id(), CMD_GET_EDGE_VARIABLE);
        assert_eq!(
            commands[0].payload(),
            &[LAST_STEP_MEAN_SPEED, 0, 0, 0, 2, b'e', b'1']
        );
    }

    #[test]
    fn test_parameter_change_obsoletes() {
        let dispatcher = dispatcher_with(vec![
            vec![value_reply(
                CMD_GET_EDGE_VARIABLE,
                VAR_EDGE_TRAVELTIME,
                "e1",
                Value::Double(10.0),
            )],
            vec![value_reply(
                CMD_GET_EDGE_VARIABLE,
                VAR_EDGE_TRAVELTIME,
                "e1",
                Value::Double(12.5),
            )],
        ]);
        let query = ReadQuery::parameterized(
            CMD_GET_EDGE_VARIABLE,
            "e1",
            VAR_EDGE_TRAVELTIME,
            ValueType::Double,
        );

        assert!(matches!(
            query.requests(),
            Err(TraciError::MissingParameter { .. })
        ));

        query.set_parameter(Value::Double(100.0));
        assert_eq!(query.get(&dispatcher).unwrap(), Value::Double(10.0));

        query.set_parameter(Value::Double(100.0));
        assert!(query.is_cached());

        query.set_parameter(Value::Double(200.0));
        assert!(!query.is_cached());
        assert_eq!(query.get(&dispatcher).unwrap(), Value::Double(12.5));

        let sent = dispatcher.link().requests();
        let mut reader = sent[1].commands()[0].reader();
        reader.read_u8().unwrap();
        reader.read_string().unwrap();
        assert_eq!(Value::read(&mut reader).unwrap(), Value::Double(200.0));
    }

    #[test]
    fn test_mismatched_object_id() {
        let dispatcher = dispatcher_with(vec![vec![value_reply(
            CMD_GET_VEHICLE_VARIABLE,
            VAR_SPEED,
            "veh1",
            Value::Double(3.0),
        )]]);
        let query = ReadQuery::new(CMD_GET_VEHICLE_VARIABLE, "veh0", VAR_SPEED, ValueType::Double);

        match query.get(&dispatcher).unwrap_err() {
            TraciError::UnexpectedObject { expected, actual } => {
                assert_eq!(expected, "veh0");
                assert_eq!(actual, "veh1");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(!query.is_cached());
    }

    #[test]
    fn test_mismatched_variable_id() {
        let dispatcher = dispatcher_with(vec![vec![value_reply(
            CMD_GET_VEHICLE_VARIABLE,
            VAR_ANGLE,
            "veh0",
            Value::Double(90.0),
        )]]);
        let query = ReadQuery::new(CMD_GET_VEHICLE_VARIABLE, "veh0", VAR_SPEED, ValueType::Double);
        assert!(matches!(
            query.get(&dispatcher),
            Err(TraciError::UnexpectedVariable {
                expected: VAR_SPEED,
                actual: VAR_ANGLE
            })
        ));
    }

    #[test]
    fn test_mismatched_type_tag() {
        let dispatcher = dispatcher_with(vec![vec![value_reply(
            CMD_GET_VEHICLE_VARIABLE,
            VAR_SPEED,
            "veh0",
            Value::Int(3),
        )]]);
        let query = ReadQuery::new(CMD_GET_VEHICLE_VARIABLE, "veh0", VAR_SPEED, ValueType::Double);
        assert!(matches!(
            query.get(&dispatcher),
            Err(TraciError::Wire(wire::WireError::UnexpectedType { .. }))
        ));
    }

    #[test]
    fn test_typed_view() {
        let dispatcher = dispatcher_with(vec![vec![value_reply(
            CMD_GET_VEHICLE_VARIABLE,
            VAR_POSITION,
            "veh0",
            Value::Position2D(Position2D::new(12.0, -4.5)),
        )]]);
        let query = Arc::new(ReadQuery::new(
            CMD_GET_VEHICLE_VARIABLE,
            "veh0",
            VAR_POSITION,
            ValueType::Position2D,
        ));
        let typed: TypedQuery<Position2D> = TypedQuery::new(Arc::clone(&query));
        let position = typed.get(&dispatcher).unwrap();
        assert_approx_eq!(position.x, 12.0);
        assert_approx_eq!(position.y, -4.5);

        let wrong: TypedQuery<String> = TypedQuery::new(query);
        assert!(matches!(
            wrong.get(&dispatcher),
            Err(TraciError::ValueConversion {
                expected: "String",
                actual: ValueType::Position2D
            })
        ));
    }

    #[test]
    fn test_float_widens_to_f64() {
        assert_approx_eq!(f64::from_value(Value::Float(0.5)).unwrap(), 0.5);
        assert!(i32::from_value(Value::Double(1.0)).is_err());
    }
}
