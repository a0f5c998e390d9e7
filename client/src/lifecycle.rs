//! Advancing simulated time and deriving vehicle lifecycle events.
//!
//! Every tick runs as a single batch: the step command, the active vehicle
//! listing, both teleport listings, the arrival listing and the simulation
//! time. Departures and arrivals are then derived by diffing the active id set
//! against the one seen on the previous tick, with teleporting vehicles
//! exempted. A vehicle that finishes its trip while teleporting never shows up
//! in that diff, so the simulator's arrival listing catches it instead.

use crate::entities::{Vehicle, VehicleRef};
use crate::error::{Result, TraciError};
use crate::link::Link;
use crate::object::StepListener;
use crate::query::{Dispatcher, FromValue, ReadQuery, StepQuery};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use wire::constants::*;
use wire::ValueType;

/// Vehicles currently inside the simulation, keyed by id
pub type LiveVehicles = Arc<RwLock<HashMap<String, VehicleRef>>>;

/// External party told about vehicles entering, leaving or teleporting
pub trait LifecycleObserver: Send + Sync {
    fn vehicle_departed(&self, _vehicle: &VehicleRef, _time: f64) {}
    fn vehicle_arrived(&self, _vehicle: &VehicleRef, _time: f64) {}
    fn teleport_started(&self, _id: &str, _time: f64) {}
    fn teleport_ended(&self, _id: &str, _time: f64) {}
}

/// What happened during one tick. Each id list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepEvents {
    pub time: f64,
    pub departed: Vec<String>,
    pub arrived: Vec<String>,
    pub teleport_started: Vec<String>,
    pub teleport_ended: Vec<String>,
}

impl StepEvents {
    pub fn is_quiet(&self) -> bool {
        self.departed.is_empty()
            && self.arrived.is_empty()
            && self.teleport_started.is_empty()
            && self.teleport_ended.is_empty()
    }
}

/// Returns `(departed, arrived)` between two consecutive active id sets.
///
/// Vehicles that just finished teleporting do not depart, and vehicles that
/// just started teleporting do not arrive.
pub fn diff(
    before: &BTreeSet<String>,
    after: &BTreeSet<String>,
    teleport_started: &BTreeSet<String>,
    teleport_ended: &BTreeSet<String>,
) -> (Vec<String>, Vec<String>) {
    let departed = after
        .difference(before)
        .filter(|id| !teleport_ended.contains(*id))
        .cloned()
        .collect();
    let arrived = before
        .difference(after)
        .filter(|id| !teleport_started.contains(*id))
        .cloned()
        .collect();
    (departed, arrived)
}

fn id_list_query(command: u8, variable: u8) -> ReadQuery {
    ReadQuery::new(command, "", variable, ValueType::StringList)
}

fn fetched<V: FromValue>(query: &ReadQuery) -> Result<V> {
    let value = query.cached().ok_or_else(|| {
        TraciError::Invariant(format!(
            "variable 0x{:02x} missing after its batch",
            query.variable()
        ))
    })?;
    V::from_value(value)
}

pub struct Lifecycle {
    step: StepQuery,
    time: ReadQuery,
    active: ReadQuery,
    teleport_starting: ReadQuery,
    teleport_ending: ReadQuery,
    arrived: ReadQuery,
    active_before: Mutex<BTreeSet<String>>,
    clock: Mutex<f64>,
    live: LiveVehicles,
}

impl Lifecycle {
    pub fn new(live: LiveVehicles) -> Self {
        Self {
            step: StepQuery::new(),
            time: ReadQuery::new(CMD_GET_SIM_VARIABLE, "", VAR_TIME, ValueType::Double),
            active: id_list_query(CMD_GET_VEHICLE_VARIABLE, ID_LIST),
            teleport_starting: id_list_query(
                CMD_GET_SIM_VARIABLE,
                VAR_TELEPORT_STARTING_VEHICLES_IDS,
            ),
            teleport_ending: id_list_query(CMD_GET_SIM_VARIABLE, VAR_TELEPORT_ENDING_VEHICLES_IDS),
            arrived: id_list_query(CMD_GET_SIM_VARIABLE, VAR_ARRIVED_VEHICLES_IDS),
            active_before: Mutex::new(BTreeSet::new()),
            clock: Mutex::new(0.0),
            live,
        }
    }

    /// Simulation time as of the last tick or bootstrap
    pub fn time(&self) -> f64 {
        *self.clock.lock()
    }

    pub fn live(&self) -> &LiveVehicles {
        &self.live
    }

    pub fn active_ids(&self) -> BTreeSet<String> {
        self.active_before.lock().clone()
    }

    /// Registers the vehicles already present without reporting them as departed
    pub fn bootstrap<L: Link>(&self, dispatcher: &Dispatcher<L>) -> Result<f64> {
        dispatcher.dispatch(&[&self.active, &self.time])?;
        let time: f64 = fetched(&self.time)?;
        let active: BTreeSet<String> = fetched::<Vec<String>>(&self.active)?.into_iter().collect();

        {
            let mut live = self.live.write();
            for id in &active {
                live.entry(id.clone())
                    .or_insert_with(|| Arc::new(Vehicle::new(id.as_str(), time)));
            }
        }
        info!("bootstrapped at t={} with {} active vehicles", time, active.len());

        *self.active_before.lock() = active;
        *self.clock.lock() = time;
        Ok(time)
    }

    /// Advances to the absolute time `target` and reports what changed.
    ///
    /// Arrivals are handled and observed before any departure. The step
    /// broadcast reaches live vehicles first, then `listeners` in order.
    pub fn advance<L: Link>(
        &self,
        target: f64,
        dispatcher: &Dispatcher<L>,
        observers: &[Arc<dyn LifecycleObserver>],
        listeners: &[Arc<dyn StepListener>],
    ) -> Result<StepEvents> {
        self.step.set_target(target);
        dispatcher.dispatch(&[
            &self.step,
            &self.active,
            &self.teleport_starting,
            &self.teleport_ending,
            &self.arrived,
            &self.time,
        ])?;

        let time: f64 = fetched(&self.time)?;
        let after: BTreeSet<String> = fetched::<Vec<String>>(&self.active)?.into_iter().collect();
        let teleport_started: BTreeSet<String> =
            fetched::<Vec<String>>(&self.teleport_starting)?.into_iter().collect();
        let teleport_ended: BTreeSet<String> =
            fetched::<Vec<String>>(&self.teleport_ending)?.into_iter().collect();
        let arrived_listing: Vec<String> = fetched(&self.arrived)?;

        let (departed, arrived) = {
            let before = self.active_before.lock();
            diff(&before, &after, &teleport_started, &teleport_ended)
        };

        // Arrivals exempted on an earlier tick because the vehicle was teleporting
        let arrived: Vec<String> = {
            let live = self.live.read();
            let mut arrived: BTreeSet<String> = arrived.into_iter().collect();
            arrived.extend(
                arrived_listing
                    .into_iter()
                    .filter(|id| live.contains_key(id) && !after.contains(id)),
            );
            arrived.into_iter().collect()
        };

        for id in &arrived {
            let vehicle = self.live.write().remove(id);
            match vehicle {
                Some(vehicle) => {
                    debug!("t={} vehicle '{}' arrived", time, id);
                    vehicle.retire();
                    for observer in observers {
                        observer.vehicle_arrived(&vehicle, time);
                    }
                }
                None => warn!("t={} arrival of unknown vehicle '{}'", time, id),
            }
        }

        for id in &departed {
            let vehicle: VehicleRef = Arc::new(Vehicle::new(id.as_str(), time));
            self.live.write().insert(id.clone(), vehicle.clone());
            debug!("t={} vehicle '{}' departed", time, id);
            for observer in observers {
                observer.vehicle_departed(&vehicle, time);
            }
        }

        // Teleporting since before bootstrap: known to the simulator, new to us
        for id in teleport_ended.iter().filter(|id| after.contains(*id)) {
            let mut live = self.live.write();
            if !live.contains_key(id) {
                debug!("t={} registering '{}' after its teleport", time, id);
                live.insert(id.clone(), Arc::new(Vehicle::new(id.as_str(), time)));
            }
        }

        for id in &teleport_started {
            for observer in observers {
                observer.teleport_started(id, time);
            }
        }
        for id in &teleport_ended {
            for observer in observers {
                observer.teleport_ended(id, time);
            }
        }

        *self.active_before.lock() = after;
        *self.clock.lock() = time;

        let vehicles: Vec<VehicleRef> = self.live.read().values().cloned().collect();
        for vehicle in vehicles {
            vehicle.next_step(time);
        }
        for listener in listeners {
            listener.next_step(time);
        }

        Ok(StepEvents {
            time,
            departed,
            arrived,
            teleport_started: teleport_started.into_iter().collect(),
            teleport_ended: teleport_ended.into_iter().collect(),
        })
    }
}

/// Logs every lifecycle event at `info`
pub struct LoggingObserver;

impl LifecycleObserver for LoggingObserver {
    fn vehicle_departed(&self, vehicle: &VehicleRef, time: f64) {
        info!("t={:.2} departed: {}", time, vehicle.id());
    }

    fn vehicle_arrived(&self, vehicle: &VehicleRef, time: f64) {
        info!(
            "t={:.2} arrived: {} (in simulation since t={:.2})",
            time,
            vehicle.id(),
            vehicle.depart_time()
        );
    }

    fn teleport_started(&self, id: &str, time: f64) {
        info!("t={:.2} teleport started: {}", time, id);
    }

    fn teleport_ended(&self, id: &str, time: f64) {
        info!("t={:.2} teleport ended: {}", time, id);
    }
}
