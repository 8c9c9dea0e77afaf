pub mod command;
pub mod snapshot;
pub mod stage;

pub use command::{ControlCommand, StageAction};
pub use snapshot::VehicleSnapshot;
pub use stage::{default_stages, FuelType, StageDescriptor, StageSequence};
