use crate::error::Result;
use crate::link::Link;
use crate::object::{StepListener, TraciObject};
use crate::query::{ChangeStateQuery, Dispatcher};
use wire::constants::*;
use wire::{Polygon, Value};

traci_variables! {
    pub enum LaneVar for CMD_GET_LANE_VARIABLE {
        Length => (VAR_LENGTH, Double, Static),
        MaxSpeed => (VAR_MAXSPEED, Double, Static),
        Shape => (VAR_SHAPE, Polygon, Static),
        EdgeId => (LANE_EDGE_ID, String, Static),
        LinkCount => (LANE_LINK_NUMBER, UByte, Static),
        MeanSpeed => (LAST_STEP_MEAN_SPEED, Double, PerStep),
        VehicleCount => (LAST_STEP_VEHICLE_NUMBER, Int, PerStep),
        VehicleIds => (LAST_STEP_VEHICLE_ID_LIST, StringList, PerStep),
        Occupancy => (LAST_STEP_OCCUPANCY, Double, PerStep),
    }
}

pub struct Lane {
    object: TraciObject<LaneVar>,
    change_max_speed: ChangeStateQuery,
}

impl Lane {
    pub fn new(id: impl Into<String>) -> Self {
        let object = TraciObject::new(id);
        let change_max_speed =
            ChangeStateQuery::new(CMD_SET_LANE_VARIABLE, object.id(), VAR_MAXSPEED)
                .invalidates(object.query(LaneVar::MaxSpeed).clone());
        Self {
            object,
            change_max_speed,
        }
    }

    pub fn id(&self) -> &str {
        self.object.id()
    }

    pub fn object(&self) -> &TraciObject<LaneVar> {
        &self.object
    }

    pub fn length<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<f64> {
        self.object.read(LaneVar::Length, dispatcher)
    }

    pub fn max_speed<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<f64> {
        self.object.read(LaneVar::MaxSpeed, dispatcher)
    }

    pub fn shape<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Polygon> {
        self.object.read(LaneVar::Shape, dispatcher)
    }

    pub fn edge_id<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<String> {
        self.object.read(LaneVar::EdgeId, dispatcher)
    }

    pub fn vehicle_count<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<i32> {
        self.object.read(LaneVar::VehicleCount, dispatcher)
    }

    pub fn set_max_speed<L: Link>(&self, speed: f64, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.change_max_speed
            .run_with(Value::Double(speed), dispatcher)
    }
}

impl StepListener for Lane {
    fn next_step(&self, time: f64) {
        self.object.next_step(time);
    }
}
