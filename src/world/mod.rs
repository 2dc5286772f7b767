pub mod body_set;
pub mod driver;
pub mod grid_manager;
pub mod manager;
pub mod simulation;

pub use body_set::{BodyHandle, BodySet, BodySnapshot};
pub use driver::Driver;
pub use grid_manager::GridPhysicsManager;
pub use manager::PhysicsManager;
pub use simulation::{Simulation, SimulationState};
