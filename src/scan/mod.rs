//! Scan input module
//!
//! Receives decoded QR payloads from the camera/decoder collaborator, one
//! per line, and forwards them to the session controller.

mod lockout;
mod reader;

pub use lockout::Lockout;
pub use reader::ScanReader;
