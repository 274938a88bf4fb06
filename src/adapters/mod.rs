//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod indicator_feed;
pub mod paper_gateway;
pub mod text_report;
pub mod trade_csv;
