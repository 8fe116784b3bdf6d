pub mod analysis;
pub mod analysis_error;
pub mod api;
pub mod app;
pub mod config;
pub mod series;
pub mod services;
pub mod utils;
