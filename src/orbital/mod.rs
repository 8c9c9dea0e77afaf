pub mod body;
pub mod elements;
pub mod maneuvers;
pub mod mechanics;

pub use body::CelestialBody;
pub use elements::KeplerianElements;
pub use maneuvers::{hohmann_delta_v, HohmannTransfer};
pub use mechanics::{
    burn_duration, circular_speed, exhaust_velocity, ignition_time, rocket_delta_v, time_to_node,
    vis_viva_speed, G0,
};
