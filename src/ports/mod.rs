//! Port traits for everything the decision core treats as external.

pub mod config_port;
pub mod data_port;
pub mod exchange_port;
pub mod indicator_port;
pub mod report_port;
