use crate::error::Result;
use crate::link::Link;
use crate::object::{StepListener, TraciObject};
use crate::query::{ChangeStateQuery, Dispatcher};
use wire::constants::*;
use wire::Value;

traci_variables! {
    pub enum EdgeVar for CMD_GET_EDGE_VARIABLE {
        /// Expected travel time at the requested point in time
        TravelTime => (VAR_EDGE_TRAVELTIME, Double, Parameterized),
        MeanSpeed => (LAST_STEP_MEAN_SPEED, Double, PerStep),
        VehicleCount => (LAST_STEP_VEHICLE_NUMBER, Int, PerStep),
        VehicleIds => (LAST_STEP_VEHICLE_ID_LIST, StringList, PerStep),
        Occupancy => (LAST_STEP_OCCUPANCY, Double, PerStep),
        Co2Emission => (VAR_CO2EMISSION, Double, PerStep),
        Name => (VAR_NAME, String, Static),
    }
}

pub struct Edge {
    object: TraciObject<EdgeVar>,
    change_travel_time: ChangeStateQuery,
}

impl Edge {
    pub fn new(id: impl Into<String>) -> Self {
        let object = TraciObject::new(id);
        let change_travel_time =
            ChangeStateQuery::new(CMD_SET_EDGE_VARIABLE, object.id(), VAR_EDGE_TRAVELTIME)
                .invalidates(object.query(EdgeVar::TravelTime).clone());
        Self {
            object,
            change_travel_time,
        }
    }

    pub fn id(&self) -> &str {
        self.object.id()
    }

    pub fn object(&self) -> &TraciObject<EdgeVar> {
        &self.object
    }

    /// Travel time estimate for entering the edge at `time`.
    ///
    /// Asking for a different time than last call refetches.
    pub fn travel_time<L: Link>(&self, time: f64, dispatcher: &Dispatcher<L>) -> Result<f64> {
        self.object
            .query(EdgeVar::TravelTime)
            .set_parameter(Value::Double(time));
        self.object.read(EdgeVar::TravelTime, dispatcher)
    }

    /// Overrides the travel time the router assumes for this edge
    pub fn set_travel_time<L: Link>(&self, seconds: f64, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.change_travel_time.run_with(
            Value::Compound(vec![Value::Double(seconds)]),
            dispatcher,
        )
    }

    pub fn mean_speed<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<f64> {
        self.object.read(EdgeVar::MeanSpeed, dispatcher)
    }

    pub fn vehicle_count<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<i32> {
        self.object.read(EdgeVar::VehicleCount, dispatcher)
    }

    pub fn vehicle_ids<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Vec<String>> {
        self.object.read(EdgeVar::VehicleIds, dispatcher)
    }
}

impl StepListener for Edge {
    fn next_step(&self, time: f64) {
        self.object.next_step(time);
    }
}
