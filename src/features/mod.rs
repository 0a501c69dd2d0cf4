pub mod generation;
pub mod payments;
pub mod sessions;
pub mod uploads;
