pub mod commands;
pub mod controller;
pub mod state;

pub use commands::ShellCommand;
pub use controller::{
    FinishSummary, LifecycleEvent, TrackerController, TrackerDeps, TrackerSnapshot,
};
pub use state::{SessionState, SessionStatus, TaskSelection, TrackerCore};
