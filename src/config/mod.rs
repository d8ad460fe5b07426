//! Configuration models for stores, recording, and resource seeding.

pub mod admission;

pub use admission::{
    AdmissionConfig, RecorderBackendConfig, ResourceConfig, StoreBackendConfig, CONFIG_ENV_VAR,
};
