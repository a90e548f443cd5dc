mod homie_device;
mod publisher;
mod state_machine;

pub use homie_device::{DeviceHandle, HomieDevice};
pub use publisher::{DevicePublisher, SharedTransport};
pub(crate) use state_machine::DeviceStateMachine;
