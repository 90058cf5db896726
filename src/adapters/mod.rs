//! Adapters: infrastructure implementations of the ports.

pub mod demo;
pub mod http;
pub mod ui;
