use crate::error::{FlightError, Phase};
use crate::vehicle::{ControlCommand, VehicleSnapshot};

/// Trait for flight programs driven by the control loop.
///
/// Implementations are pure decision makers: they see one snapshot per tick
/// and answer with one command. All I/O stays in the loop driver.
pub trait Controller {
    /// Decide the command for this tick.
    fn control(&mut self, snapshot: &VehicleSnapshot) -> Result<ControlCommand, FlightError>;

    /// Current phase, used to tag aborts.
    fn phase(&self) -> Phase;

    /// True once the program has reached its terminal phase.
    fn is_done(&self) -> bool;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}
