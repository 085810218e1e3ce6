pub mod client;
pub mod frame;
pub mod session;
pub mod snapshot;
