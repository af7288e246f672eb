pub mod commands;
pub mod controller;
pub mod state;

pub use controller::{CaptureUpdate, FlowController};
pub use state::{FlowState, MeterType, Operator, Screen};
