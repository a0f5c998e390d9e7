//! The explicit context a caller threads through every interaction with one
//! simulator: the dispatcher, the repositories, lifecycle state and the
//! registered listeners and observers.

use crate::entities::{Edge, Lane, TrafficLight, Vehicle, VehicleDescriptor, VehicleRef};
use crate::error::{Result, TraciError};
use crate::lifecycle::{Lifecycle, LifecycleObserver, LiveVehicles, StepEvents};
use crate::link::Link;
use crate::object::StepListener;
use crate::query::{CloseQuery, Dispatcher, FromValue, ReadQuery, VersionQuery};
use crate::repository::Repository;
use log::{debug, info};
use parking_lot::RwLock;
use std::sync::Arc;
use wire::constants::*;
use wire::{BoundingBox, ValueType};

pub struct Simulation<L: Link> {
    dispatcher: Dispatcher<L>,
    lifecycle: Lifecycle,
    vehicles: Arc<Repository<Vehicle>>,
    edges: Arc<Repository<Edge>>,
    lanes: Arc<Repository<Lane>>,
    traffic_lights: Arc<Repository<TrafficLight>>,
    min_expected: Arc<ReadQuery>,
    net_boundary: ReadQuery,
    version: VersionQuery,
    step_length: f64,
    listeners: RwLock<Vec<Arc<dyn StepListener>>>,
    observers: RwLock<Vec<Arc<dyn LifecycleObserver>>>,
}

impl<L: Link> Simulation<L> {
    /// Wraps a connected dispatcher and registers the vehicles already present.
    ///
    /// Without an explicit `step_length` the simulator's own step length is used.
    pub fn new(dispatcher: Dispatcher<L>, step_length: Option<f64>) -> Result<Self> {
        let live: LiveVehicles = Arc::default();

        let vehicle_lookup = live.clone();
        let vehicles = Arc::new(
            Repository::new("vehicle", CMD_GET_VEHICLE_VARIABLE, move |id: &str| {
                vehicle_lookup.read().get(id).cloned().ok_or_else(|| {
                    TraciError::Invariant(format!(
                        "vehicle '{}' is listed by the simulator but never departed",
                        id
                    ))
                })
            })
            .with_changing_ids(),
        );
        let edges = Arc::new(
            Repository::new("edge", CMD_GET_EDGE_VARIABLE, |id: &str| -> Result<Arc<Edge>> {
                Ok(Arc::new(Edge::new(id)))
            })
            .forwarding_steps(),
        );
        let lanes = Arc::new(
            Repository::new("lane", CMD_GET_LANE_VARIABLE, |id: &str| -> Result<Arc<Lane>> {
                Ok(Arc::new(Lane::new(id)))
            })
            .forwarding_steps(),
        );
        let traffic_lights = Arc::new(
            Repository::new(
                "traffic light",
                CMD_GET_TL_VARIABLE,
                |id: &str| -> Result<Arc<TrafficLight>> { Ok(Arc::new(TrafficLight::new(id))) },
            )
            .forwarding_steps(),
        );
        let min_expected = Arc::new(ReadQuery::new(
            CMD_GET_SIM_VARIABLE,
            "",
            VAR_MIN_EXPECTED_VEHICLES,
            ValueType::Int,
        ));

        let listeners: Vec<Arc<dyn StepListener>> = vec![
            vehicles.clone(),
            edges.clone(),
            lanes.clone(),
            traffic_lights.clone(),
            min_expected.clone(),
        ];

        let step_length = match step_length {
            Some(length) => length,
            None => {
                let delta =
                    ReadQuery::new(CMD_GET_SIM_VARIABLE, "", VAR_DELTA_T, ValueType::Double);
                f64::from_value(delta.get(&dispatcher)?)?
            }
        };

        let simulation = Self {
            dispatcher,
            lifecycle: Lifecycle::new(live),
            vehicles,
            edges,
            lanes,
            traffic_lights,
            min_expected,
            net_boundary: ReadQuery::new(
                CMD_GET_SIM_VARIABLE,
                "",
                VAR_NET_BOUNDING_BOX,
                ValueType::BoundingBox,
            ),
            version: VersionQuery::new(),
            step_length,
            listeners: RwLock::new(listeners),
            observers: RwLock::new(Vec::new()),
        };
        simulation.lifecycle.bootstrap(&simulation.dispatcher)?;
        info!(
            "simulation ready at t={} (step length {}s)",
            simulation.current_time(),
            simulation.step_length
        );
        Ok(simulation)
    }

    pub fn dispatcher(&self) -> &Dispatcher<L> {
        &self.dispatcher
    }

    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    /// Simulation time as of the last completed step
    pub fn current_time(&self) -> f64 {
        self.lifecycle.time()
    }

    /// Advances by one step length
    pub fn step(&self) -> Result<StepEvents> {
        self.step_to(self.current_time() + self.step_length)
    }

    /// Advances to the absolute time `target`, in seconds
    pub fn step_to(&self, target: f64) -> Result<StepEvents> {
        let observers = self.observers.read().clone();
        let listeners = self.listeners.read().clone();
        let events = self
            .lifecycle
            .advance(target, &self.dispatcher, &observers, &listeners)?;
        debug!(
            "t={}: {} departed, {} arrived, {} active",
            events.time,
            events.departed.len(),
            events.arrived.len(),
            self.lifecycle.live().read().len()
        );
        Ok(events)
    }

    pub fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.write().push(observer);
    }

    /// Receives the step broadcast after the built-in repositories
    pub fn add_listener(&self, listener: Arc<dyn StepListener>) {
        self.listeners.write().push(listener);
    }

    /// A vehicle currently in the simulation, without any I/O
    pub fn vehicle(&self, id: &str) -> Option<VehicleRef> {
        self.lifecycle.live().read().get(id).cloned()
    }

    pub fn active_vehicle_count(&self) -> usize {
        self.lifecycle.live().read().len()
    }

    pub fn vehicles(&self) -> &Repository<Vehicle> {
        &self.vehicles
    }

    pub fn edges(&self) -> &Repository<Edge> {
        &self.edges
    }

    pub fn lanes(&self) -> &Repository<Lane> {
        &self.lanes
    }

    pub fn traffic_lights(&self) -> &Repository<TrafficLight> {
        &self.traffic_lights
    }

    /// Travel time of an edge entered now; `None` for an unknown edge
    pub fn edge_travel_time(&self, edge_id: &str) -> Result<Option<f64>> {
        match self.edges.get_by_id(edge_id, &self.dispatcher)? {
            Some(edge) => Ok(Some(edge.travel_time(self.current_time(), &self.dispatcher)?)),
            None => Ok(None),
        }
    }

    /// Inserts a vehicle; it is reported as departed once the simulator places it
    pub fn add_vehicle(&self, id: &str, descriptor: &VehicleDescriptor) -> Result<()> {
        descriptor.add_query(id).run(&self.dispatcher)
    }

    /// Vehicles loaded or still running; zero once the scenario is exhausted
    pub fn min_expected_vehicles(&self) -> Result<i32> {
        i32::from_value(self.min_expected.get(&self.dispatcher)?)
    }

    pub fn net_boundary(&self) -> Result<BoundingBox> {
        BoundingBox::from_value(self.net_boundary.get(&self.dispatcher)?)
    }

    /// API level and version string of the simulator
    pub fn version(&self) -> Result<(i32, String)> {
        if let Some(version) = self.version.cached() {
            return Ok(version);
        }
        self.dispatcher.dispatch(&[&self.version])?;
        self.version
            .cached()
            .ok_or(TraciError::MissingResponse(CMD_GETVERSION))
    }

    /// Asks the simulator to shut down and hands back the link
    pub fn close(self) -> Result<L> {
        self.dispatcher.dispatch(&[&CloseQuery])?;
        info!("simulation closed at t={}", self.current_time());
        Ok(self.dispatcher.into_link())
    }
}
