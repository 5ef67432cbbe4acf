//! Port traits at the boundary between the engine and the outside world.

pub mod config_port;
pub mod order_port;
pub mod report_port;
