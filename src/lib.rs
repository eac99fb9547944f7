#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod player;
pub mod registry;
pub mod room;
pub mod round;
pub mod routes;
pub mod snapshot;
pub mod startup;
pub mod websocket;
