//! Release and multi-release lifecycle
//!
//! Binds confirmed commits and targeting strategies into publishable units,
//! drives publish and rollback signalling over the signal bus, and forwards
//! reload instructions to the delivery-channel controller serving each app.

pub mod channel;
pub mod error;
pub mod service;
pub mod signal;

pub use channel::{
    ChannelError, RecordingController, ReleaseRef, ReloadController, ReloadInstruction,
    ReloadRouter,
};
pub use error::{ReleaseError, Result};
pub use service::{
    CreateMultiReleaseRequest, CreateReleaseRequest, ReleaseService, ReloadTarget,
};
pub use signal::{InMemorySignalBus, SignalBus, SignalError};
