//! oven: a control panel for baking, watching and tearing down a remote
//! compute cluster through a small HTTP backend.

pub mod analytics;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod run;
pub mod session;
pub mod ui;
pub mod utils;
pub mod web;
