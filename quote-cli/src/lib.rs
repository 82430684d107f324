pub mod app;
pub mod config;
pub mod csv_loader;
pub mod logging;
pub mod records;
pub mod utils;
