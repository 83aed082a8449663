pub mod client;
pub mod coercion;
pub mod memory;
pub mod poll;
pub mod service;
