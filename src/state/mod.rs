//! The shared, time-indexed visual state both rendering paths consume.

/// Pure computation of one instant's visual state.
pub mod visual;
