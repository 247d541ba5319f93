pub mod capacity;
pub mod consumption;

pub use capacity::CapacityRecord;
pub use consumption::{ConsumptionRecord, RawConsumption, UnknownVariable, Variable};
