use crate::error::Result;
use crate::link::Link;
use crate::object::{StepListener, TraciObject};
use crate::query::{ChangeStateQuery, Dispatcher};
use wire::constants::*;
use wire::Value;

traci_variables! {
    pub enum TrafficLightVar for CMD_GET_TL_VARIABLE {
        /// Signal string, one character per controlled link (e.g. "GrGr")
        State => (TL_RED_YELLOW_GREEN_STATE, String, PerStep),
        Phase => (TL_CURRENT_PHASE, Int, PerStep),
        Program => (TL_CURRENT_PROGRAM, String, PerStep),
        NextSwitch => (TL_NEXT_SWITCH, Double, PerStep),
        ControlledLanes => (TL_CONTROLLED_LANES, StringList, Static),
    }
}

pub struct TrafficLight {
    object: TraciObject<TrafficLightVar>,
    change_phase: ChangeStateQuery,
    change_program: ChangeStateQuery,
}

impl TrafficLight {
    pub fn new(id: impl Into<String>) -> Self {
        let object = TraciObject::new(id);
        let change_phase = ChangeStateQuery::new(CMD_SET_TL_VARIABLE, object.id(), TL_PHASE_INDEX)
            .invalidates(object.query(TrafficLightVar::Phase).clone())
            .invalidates(object.query(TrafficLightVar::State).clone())
            .invalidates(object.query(TrafficLightVar::NextSwitch).clone());
        let change_program = ChangeStateQuery::new(CMD_SET_TL_VARIABLE, object.id(), TL_PROGRAM)
            .invalidates(object.query(TrafficLightVar::Program).clone())
            .invalidates(object.query(TrafficLightVar::Phase).clone())
            .invalidates(object.query(TrafficLightVar::State).clone());
        Self {
            object,
            change_phase,
            change_program,
        }
    }

    pub fn id(&self) -> &str {
        self.object.id()
    }

    pub fn object(&self) -> &TraciObject<TrafficLightVar> {
        &self.object
    }

    pub fn state<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<String> {
        self.object.read(TrafficLightVar::State, dispatcher)
    }

    pub fn phase<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<i32> {
        self.object.read(TrafficLightVar::Phase, dispatcher)
    }

    pub fn program<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<String> {
        self.object.read(TrafficLightVar::Program, dispatcher)
    }

    /// Absolute simulation time of the next phase switch
    pub fn next_switch<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<f64> {
        self.object.read(TrafficLightVar::NextSwitch, dispatcher)
    }

    pub fn controlled_lanes<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Vec<String>> {
        self.object.read(TrafficLightVar::ControlledLanes, dispatcher)
    }

    pub fn set_phase<L: Link>(&self, phase: i32, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.change_phase.run_with(Value::Int(phase), dispatcher)
    }

    pub fn set_program<L: Link>(&self, program: &str, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.change_program
            .run_with(Value::String(program.to_string()), dispatcher)
    }
}

impl StepListener for TrafficLight {
    fn next_step(&self, time: f64) {
        self.object.next_step(time);
    }
}
