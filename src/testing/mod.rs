//! Testing utilities for the camera preview
//!
//! Provides a scriptable camera stack and a host surface double so the
//! lifecycle can be exercised offline, without camera hardware.

pub mod simulated;

pub use simulated::{
    BackendEvent, OpenBehavior, SessionBehavior, SimulatedBackend, SimulatedCamera,
    SimulatedSurface,
};
