mod hazards;
mod production;
mod smelting;
mod upkeep;

pub use hazards::{food_factor, ActiveHazard, HazardKind, HazardSystem};
pub use production::ProductionSystem;
pub use smelting::SmeltingSystem;
pub use upkeep::UpkeepSystem;
