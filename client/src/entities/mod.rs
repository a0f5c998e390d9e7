//! The entity kinds this client models, each a [`TraciObject`](crate::object::TraciObject)
//! with a few typed getters and change queries.

pub mod edge;
pub mod lane;
pub mod traffic_light;
pub mod vehicle;

pub use edge::{Edge, EdgeVar};
pub use lane::{Lane, LaneVar};
pub use traffic_light::{TrafficLight, TrafficLightVar};
pub use vehicle::{Vehicle, VehicleDescriptor, VehicleRef, VehicleVar};
