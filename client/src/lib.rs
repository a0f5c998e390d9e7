//! # TraCI Client Library
//!
//! This library drives an external SUMO traffic simulator over the TraCI
//! request/response protocol. It turns the simulator's flat, position-matched
//! response stream into typed, cached values on long-lived simulation objects
//! and derives vehicle lifecycle events from one step to the next.
//!
//! ## Architecture Overview
//!
//! ### Batching
//! Every interaction is a query. Queries contribute request commands to a
//! batch that travels as one physical message; the answers come back in the
//! same order and each query consumes exactly its own share of them. TraCI
//! responses carry no correlation id, so order is the only thing tying an
//! answer to its question.
//!
//! ### Lazy Caching
//! Read queries keep their last value until something declares it obsolete:
//! the step broadcast for time-varying variables, a successful change query
//! that lists the read in its invalidation hooks, or a new request parameter.
//! Reading a cached value costs no I/O at all.
//!
//! ### Lifecycle Diffing
//! Each tick advances time and fetches the active vehicle listing in the same
//! batch. Departures and arrivals are derived by comparing consecutive id sets,
//! with teleporting vehicles exempted.
//!
//! ## Module Organization
//!
//! ### Link Module (`link`)
//! The blocking write-then-read exchange over any `Read + Write` stream, with
//! a mutex-guarded and a single-threaded variant.
//!
//! ### Query Module (`query`)
//! - Read queries with a single-slot cache and typed views
//! - Change-state queries with on-success invalidation hooks
//! - Step, version and close commands
//! - The batch dispatcher
//!
//! ### Object and Entity Modules (`object`, `entities`)
//! Simulation objects as a fixed set of read queries, one per variable of a
//! closed per-kind enumeration, plus the vehicle, edge, lane and traffic light
//! kinds built on it.
//!
//! ### Repository Module (`repository`)
//! Per-kind id→object caches synchronized against the simulator's id listings.
//!
//! ### Lifecycle and Simulation Modules (`lifecycle`, `simulation`)
//! Step advancement, event derivation, observers and the context object that
//! ties everything to one connection.
//!
//! ### Connection and Configuration (`connect`, `config`)
//! Retrying connection establishment and the JSON-loadable client settings.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::connect::{connect, RetryPolicy};
//! use client::link::Locked;
//! use client::query::Dispatcher;
//! use client::simulation::Simulation;
//!
//! # fn main() -> Result<(), client::error::TraciError> {
//! let stream = connect("127.0.0.1:8813", None, &RetryPolicy::default())?;
//! let simulation = Simulation::new(Dispatcher::new(Locked::new(stream)), Some(1.0))?;
//!
//! for _ in 0..100 {
//!     let events = simulation.step()?;
//!     for id in &events.departed {
//!         if let Some(vehicle) = simulation.vehicle(id) {
//!             println!("{} departed at {}", id, vehicle.depart_time());
//!         }
//!     }
//! }
//! simulation.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connect;
pub mod error;
pub mod link;
#[macro_use]
pub mod object;
pub mod entities;
pub mod lifecycle;
pub mod query;
pub mod repository;
pub mod simulation;

#[cfg(test)]
mod testing;
