//! Marionette — conductor for a kinetic ball sculpture.
//!
//! Drives an array of 31 motor-driver units (4 motors each) over an RS-485
//! Modbus RTU link: per-frame position register writes paced for the
//! half-duplex bus, followed by a broadcast sync register that makes every
//! unit move at once. On top of the bus layer sit an animation engine, a
//! fixed-rate frame runtime, a JSON control server, a terminal UI and an
//! in-memory simulator for development without hardware.

pub mod animation;
pub mod bus;
#[doc(hidden)]
pub mod cli;
pub mod config;
pub mod runtime;
#[doc(hidden)]
pub mod server;
pub mod sim;
#[doc(hidden)]
pub mod tui;
