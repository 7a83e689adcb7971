//! Recording session control
//!
//! This module provides the `RecorderController` abstraction that manages:
//! - Exclusive ownership of the capture device handle
//! - Chunk accumulation in emission order
//! - The one-second elapsed tick
//! - Artifact assembly and exactly-once delivery on stop
//! - Device release on every exit path, including teardown

mod controller;

pub use controller::{RecorderController, RecorderError, RecorderState};
