//! Simulation objects as fixed sets of read queries.
//!
//! Each entity kind declares a closed enumeration of the variables it can
//! read. A [`TraciObject`] builds one [`ReadQuery`] per variable when it is
//! constructed and keeps them for its whole life; advancing the simulation
//! only marks the time-varying ones obsolete.

use crate::error::Result;
use crate::link::Link;
use crate::query::{Dispatcher, FromValue, ReadQuery, TypedQuery};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use wire::ValueType;

/// How a variable's value evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volatility {
    /// Fixed unless a change query says otherwise
    Static,
    /// Obsolete after every simulation step
    PerStep,
    /// Depends on a request parameter; obsolete when the parameter changes
    Parameterized,
}

/// A closed per-kind enumeration of readable variables
pub trait VariableKind: Copy + Eq + Debug + Send + Sync + 'static {
    /// The get command of this kind's domain
    const COMMAND: u8;
    /// Every variant, in index order
    const ALL: &'static [Self];

    fn variable(self) -> u8;
    fn value_type(self) -> ValueType;
    fn volatility(self) -> Volatility;
    fn index(self) -> usize;
}

/// Receives the step-advance broadcast
pub trait StepListener: Send + Sync {
    fn next_step(&self, time: f64);
}

/// Declares a [`VariableKind`] enumeration.
///
/// ```ignore
/// traci_variables! {
///     pub enum LaneVar for CMD_GET_LANE_VARIABLE {
///         Length => (VAR_LENGTH, Double, Static),
///     }
/// }
/// ```
macro_rules! traci_variables {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident for $command:path {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => ($var:expr, $value_type:ident, $volatility:ident)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant),*
        }

        impl $crate::object::VariableKind for $name {
            const COMMAND: u8 = $command;
            const ALL: &'static [Self] = &[$($name::$variant),*];

            fn variable(self) -> u8 {
                match self {
                    $($name::$variant => $var),*
                }
            }

            fn value_type(self) -> wire::ValueType {
                match self {
                    $($name::$variant => wire::ValueType::$value_type),*
                }
            }

            fn volatility(self) -> $crate::object::Volatility {
                match self {
                    $($name::$variant => $crate::object::Volatility::$volatility),*
                }
            }

            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

pub struct TraciObject<K: VariableKind> {
    id: String,
    queries: Vec<Arc<ReadQuery>>,
    _kind: PhantomData<K>,
}

impl<K: VariableKind> TraciObject<K> {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let queries = K::ALL
            .iter()
            .map(|kind| {
                let query = match kind.volatility() {
                    Volatility::Parameterized => ReadQuery::parameterized(
                        K::COMMAND,
                        id.as_str(),
                        kind.variable(),
                        kind.value_type(),
                    ),
                    _ => ReadQuery::new(
                        K::COMMAND,
                        id.as_str(),
                        kind.variable(),
                        kind.value_type(),
                    ),
                };
                Arc::new(query)
            })
            .collect();

        Self {
            id,
            queries,
            _kind: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query(&self, variable: K) -> &Arc<ReadQuery> {
        &self.queries[variable.index()]
    }

    pub fn typed<V: FromValue>(&self, variable: K) -> TypedQuery<V> {
        TypedQuery::new(Arc::clone(self.query(variable)))
    }

    pub fn read<V: FromValue, L: Link>(
        &self,
        variable: K,
        dispatcher: &Dispatcher<L>,
    ) -> Result<V> {
        V::from_value(self.query(variable).get(dispatcher)?)
    }

    /// Drops every cached value, static ones included
    pub fn set_all_obsolete(&self) {
        for query in &self.queries {
            query.set_obsolete();
        }
    }
}

impl<K: VariableKind> StepListener for TraciObject<K> {
    fn next_step(&self, _time: f64) {
        for kind in K::ALL {
            if kind.volatility() == Volatility::PerStep {
                self.query(*kind).set_obsolete();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{value_reply, ScriptedLink};
    use wire::constants::*;
    use wire::Value;

    traci_variables! {
        enum ProbeVar for CMD_GET_INDUCTIONLOOP_VARIABLE {
            VehicleCount => (LAST_STEP_VEHICLE_NUMBER, Int, PerStep),
            Name => (VAR_NAME, String, Static),
            Window => (VAR_EDGE_TRAVELTIME, Double, Parameterized),
        }
    }

    #[test]
    fn test_queries_follow_declaration() {
        let probe: TraciObject<ProbeVar> = TraciObject::new("loop0");
        assert_eq!(ProbeVar::ALL.len(), 3);
        for kind in ProbeVar::ALL {
            let query = probe.query(*kind);
            assert_eq!(query.command(), CMD_GET_INDUCTIONLOOP_VARIABLE);
            assert_eq!(query.object_id(), "loop0");
            assert_eq!(query.variable(), kind.variable());
            assert_eq!(query.value_type(), kind.value_type());
        }
    }

    #[test]
    fn test_step_obsoletes_only_time_varying() {
        let link = ScriptedLink::new();
        link.push_reply(vec![
            value_reply(
                CMD_GET_INDUCTIONLOOP_VARIABLE,
                LAST_STEP_VEHICLE_NUMBER,
                "loop0",
                Value::Int(4),
            ),
            value_reply(
                CMD_GET_INDUCTIONLOOP_VARIABLE,
                VAR_NAME,
                "loop0",
                Value::String("north".to_string()),
            ),
        ]);
        let dispatcher = Dispatcher::new(link);
        let probe: TraciObject<ProbeVar> = TraciObject::new("loop0");

        let count: &ReadQuery = probe.query(ProbeVar::VehicleCount);
        let name: &ReadQuery = probe.query(ProbeVar::Name);
        dispatcher.dispatch(&[count, name]).unwrap();
        let count: i32 = probe.read(ProbeVar::VehicleCount, &dispatcher).unwrap();
        assert_eq!(count, 4);

        probe.next_step(1.0);
        assert!(!probe.query(ProbeVar::VehicleCount).is_cached());
        assert!(probe.query(ProbeVar::Name).is_cached());

        probe.set_all_obsolete();
        assert!(!probe.query(ProbeVar::Name).is_cached());
    }

    #[test]
    fn test_parameterized_variable_needs_parameter() {
        let probe: TraciObject<ProbeVar> = TraciObject::new("loop0");
        let dispatcher = Dispatcher::new(ScriptedLink::new());
        assert!(probe.read::<f64, _>(ProbeVar::Window, &dispatcher).is_err());
        assert_eq!(dispatcher.round_trips(), 0);
    }
}
