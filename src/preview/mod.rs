//! Live preview: a cooperative per-frame driver over a media clock.

/// The preview state machine and its collaborator traits.
pub mod driver;
