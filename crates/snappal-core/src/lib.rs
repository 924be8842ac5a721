//! Core snappal library (analysis client, history, state machine, exporters).

pub mod analysis;
pub mod config;
pub mod controller;
pub mod export;
pub mod history;
pub mod images;
pub mod logging;
pub mod providers;
pub mod state;
