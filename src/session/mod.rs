pub mod clock;
pub mod controller;
pub mod poller;
pub mod state;

pub use clock::format_elapsed;
pub use controller::SessionController;
pub use state::{SessionMode, SessionState};
