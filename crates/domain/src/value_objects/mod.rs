pub mod address;
pub mod amount;

pub use address::Address;
pub use amount::{MinorUnits, UnitScale};
