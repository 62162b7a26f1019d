pub mod money;
pub mod pii;

pub use money::{to_minor_units, MINOR_UNITS_PER_MAJOR};
pub use pii::Masked;
