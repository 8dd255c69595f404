pub mod autopilot;
pub mod constants;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod ghost;
pub mod logging;
pub mod maze;
pub mod motion;
pub mod rng;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
