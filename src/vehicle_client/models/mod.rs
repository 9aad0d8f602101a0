mod location;
mod snapshot;

pub use location::{DistanceUnit, Location};
pub use snapshot::VehicleSnapshot;
