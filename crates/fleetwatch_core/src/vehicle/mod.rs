pub mod heading;
pub mod meters;
pub mod position;
pub mod record;
pub mod route;
pub mod schedule;
pub mod snapshot;
pub mod status;
