pub mod clock;
pub mod observability;
pub mod persistence;
pub mod workers;
