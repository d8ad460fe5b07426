//! Builders to construct admission controllers from configuration.

pub mod controller_builder;

pub use controller_builder::build_controller;
