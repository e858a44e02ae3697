//! Core processing building blocks: QR location and redaction, canvas fitting,
//! resize/padding, splitting, and save helpers. These are internal primitives
//! consumed by the high-level `api` module.
pub mod params;
pub mod processing;
