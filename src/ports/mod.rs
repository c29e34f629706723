//! Port traits at the I/O seams.

pub mod config_port;
pub mod regime_sink;
pub mod series_port;
