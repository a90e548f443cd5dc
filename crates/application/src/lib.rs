//! Application layer - Homie device runtime

pub mod device;
pub mod stats;

pub use device::{DeviceHandle, DevicePublisher, HomieDevice};
