//! Navigation state machine module
//!
//! Tracks where the walker is and what they should do next:
//! - Session: explicit state struct and its read-only snapshot
//! - Machine: pure scan/destination transitions and the `Navigator` owner

mod machine;
mod session;

pub use machine::{handle_scan, set_destination, Navigator, STEPS_PER_EDGE};
pub use session::{Heading, Phase, ScanOutcome, Session, SessionSnapshot, START_MESSAGE};
