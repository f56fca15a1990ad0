//! Immutable render-configuration snapshot: fonts, themes, resolution, art.

/// Configuration snapshot and its closed option enums.
pub mod config;
/// Named color themes.
pub mod theme;
