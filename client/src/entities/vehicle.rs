use crate::error::{Result, TraciError};
use crate::link::Link;
use crate::object::{StepListener, TraciObject};
use crate::query::{ChangeStateQuery, Dispatcher, FromValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wire::constants::*;
use wire::{Color, Position2D, Value};

traci_variables! {
    /// Readable vehicle variables
    pub enum VehicleVar for CMD_GET_VEHICLE_VARIABLE {
        Speed => (VAR_SPEED, Double, PerStep),
        Position => (VAR_POSITION, Position2D, PerStep),
        Angle => (VAR_ANGLE, Double, PerStep),
        RoadId => (VAR_ROAD_ID, String, PerStep),
        LaneId => (VAR_LANE_ID, String, PerStep),
        LaneIndex => (VAR_LANE_INDEX, Int, PerStep),
        LanePosition => (VAR_LANEPOSITION, Double, PerStep),
        Distance => (VAR_DISTANCE, Double, PerStep),
        Co2Emission => (VAR_CO2EMISSION, Double, PerStep),
        RouteId => (VAR_ROUTE_ID, String, Static),
        Edges => (VAR_EDGES, StringList, Static),
        TypeId => (VAR_TYPE, String, Static),
        Color => (VAR_COLOR, Color, Static),
        MaxSpeed => (VAR_MAXSPEED, Double, Static),
        Length => (VAR_LENGTH, Double, Static),
    }
}

/// A vehicle currently known to the simulator.
///
/// Created by lifecycle diffing when the vehicle departs, never by the
/// vehicle repository, since the departure time is not derivable from the id.
/// Once the vehicle has arrived it is retired: its accessors fail without
/// touching the connection.
pub struct Vehicle {
    object: TraciObject<VehicleVar>,
    depart_time: f64,
    retired: AtomicBool,
    change_target: ChangeStateQuery,
    change_color: ChangeStateQuery,
    change_max_speed: ChangeStateQuery,
    remove: ChangeStateQuery,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, depart_time: f64) -> Self {
        let object = TraciObject::new(id);
        let id = object.id().to_string();

        let change_target =
            ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, id.as_str(), CMD_CHANGETARGET)
                .invalidates(object.query(VehicleVar::RouteId).clone())
                .invalidates(object.query(VehicleVar::Edges).clone());
        let change_color = ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, id.as_str(), VAR_COLOR)
            .invalidates(object.query(VehicleVar::Color).clone());
        let change_max_speed =
            ChangeStateQuery::new(CMD_SET_VEHICLE_VARIABLE, id.as_str(), VAR_MAXSPEED)
                .invalidates(object.query(VehicleVar::MaxSpeed).clone());
        let remove =
            ChangeStateQuery::remove(CMD_SET_VEHICLE_VARIABLE, id.as_str(), REMOVE_VAPORIZED);

        Self {
            object,
            depart_time,
            retired: AtomicBool::new(false),
            change_target,
            change_color,
            change_max_speed,
            remove,
        }
    }

    pub fn id(&self) -> &str {
        self.object.id()
    }

    /// Simulation time at which this client first saw the vehicle
    pub fn depart_time(&self) -> f64 {
        self.depart_time
    }

    pub fn object(&self) -> &TraciObject<VehicleVar> {
        &self.object
    }

    /// Marks the vehicle as gone and drops its cached values
    pub fn retire(&self) {
        self.retired.store(true, Ordering::Release);
        self.object.set_all_obsolete();
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    fn ensure_present(&self) -> Result<()> {
        if self.is_retired() {
            return Err(TraciError::Retired(self.id().to_string()));
        }
        Ok(())
    }

    fn read<V: FromValue, L: Link>(
        &self,
        variable: VehicleVar,
        dispatcher: &Dispatcher<L>,
    ) -> Result<V> {
        self.ensure_present()?;
        self.object.read(variable, dispatcher)
    }

    pub fn speed<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<f64> {
        self.read(VehicleVar::Speed, dispatcher)
    }

    pub fn position<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Position2D> {
        self.read(VehicleVar::Position, dispatcher)
    }

    pub fn road_id<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<String> {
        self.read(VehicleVar::RoadId, dispatcher)
    }

    pub fn route<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Vec<String>> {
        self.read(VehicleVar::Edges, dispatcher)
    }

    pub fn color<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<Color> {
        self.read(VehicleVar::Color, dispatcher)
    }

    /// Reroutes towards `edge_id`
    pub fn change_target<L: Link>(&self, edge_id: &str, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.ensure_present()?;
        self.change_target
            .run_with(Value::String(edge_id.to_string()), dispatcher)
    }

    pub fn set_color<L: Link>(&self, color: Color, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.ensure_present()?;
        self.change_color.run_with(Value::Color(color), dispatcher)
    }

    pub fn set_max_speed<L: Link>(&self, speed: f64, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.ensure_present()?;
        self.change_max_speed
            .run_with(Value::Double(speed), dispatcher)
    }

    /// Removes the vehicle; it is reported as arrived on the next step
    pub fn remove<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<()> {
        self.ensure_present()?;
        self.remove.run(dispatcher)
    }
}

impl StepListener for Vehicle {
    fn next_step(&self, time: f64) {
        self.object.next_step(time);
    }
}

/// Everything the simulator needs to insert a new vehicle.
///
/// Fields use SUMO's textual depart/arrival attribute syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDescriptor {
    pub route_id: String,
    pub type_id: String,
    pub depart: String,
    pub depart_lane: String,
    pub depart_pos: String,
    pub depart_speed: String,
    pub arrival_lane: String,
    pub arrival_pos: String,
    pub arrival_speed: String,
    pub from_taz: String,
    pub to_taz: String,
    pub line: String,
    pub person_capacity: i32,
    pub person_number: i32,
}

impl VehicleDescriptor {
    pub fn new(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            type_id: "DEFAULT_VEHTYPE".to_string(),
            depart: "now".to_string(),
            depart_lane: "first".to_string(),
            depart_pos: "base".to_string(),
            depart_speed: "0".to_string(),
            arrival_lane: "current".to_string(),
            arrival_pos: "max".to_string(),
            arrival_speed: "current".to_string(),
            from_taz: String::new(),
            to_taz: String::new(),
            line: String::new(),
            person_capacity: 0,
            person_number: 0,
        }
    }

    pub fn to_value(&self) -> Value {
        let text = [
            &self.route_id,
            &self.type_id,
            &self.depart,
            &self.depart_lane,
            &self.depart_pos,
            &self.depart_speed,
            &self.arrival_lane,
            &self.arrival_pos,
            &self.arrival_speed,
            &self.from_taz,
            &self.to_taz,
            &self.line,
        ];
        let mut items: Vec<Value> = text.iter().map(|s| Value::String(s.to_string())).collect();
        items.push(Value::Int(self.person_capacity));
        items.push(Value::Int(self.person_number));
        Value::Compound(items)
    }

    /// The administrative query inserting vehicle `id`
    pub fn add_query(&self, id: impl Into<String>) -> ChangeStateQuery {
        ChangeStateQuery::add(CMD_SET_VEHICLE_VARIABLE, ADD_FULL, id, self.to_value())
    }
}

/// Shared handle type used by repositories and observers
pub type VehicleRef = Arc<Vehicle>;
