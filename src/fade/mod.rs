mod coordinator;
mod cross;

pub use coordinator::{FadeCoordinator, FadeTicket};
pub use cross::CrossFade;
