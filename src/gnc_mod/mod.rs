pub mod ascent;
pub mod controller;
pub mod delta_v;
pub mod executor;
pub mod guidance;
pub mod planner;

pub use ascent::{AscentStateMachine, OrbitTarget};
pub use controller::Controller;
pub use delta_v::DeltaVMeter;
pub use executor::ManeuverExecutor;
pub use planner::{plan_transfer, ManeuverNode, NodeVector};
