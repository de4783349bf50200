//! qr-wayfinder: indoor wayfinding by QR marker scans with spoken guidance
//!
//! The walker scans QR markers placed at graph nodes. Each scan moves the
//! navigation session forward and triggers a voice cue:
//! - Marker graph and breadth-first pathfinder
//! - Explicit navigation state machine (pure transitions over a session struct)
//! - Single-voice cue scheduler with replace-latest queueing and unlock recovery
//! - Session controller wiring scans to guidance and speech
//! - IPC for scanner bridges and UIs, line-based scan input on stdin
//! - Printable QR markers for every node
//!
//! Out of scope: camera capture, QR decoding, UI rendering.

pub mod config;
pub mod controller;
pub mod events;
pub mod graph;
pub mod ipc;
pub mod lifecycle;
pub mod markers;
pub mod navigation;
pub mod scan;
pub mod voice;
