mod direct;
mod gate;

pub use direct::{FrameInput, poll_frame_input};
pub use gate::InputGate;
