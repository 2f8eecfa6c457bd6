pub mod capture;
pub mod schedule;

pub use capture::{CaptureUpload, Capturer, CommandCapturer, DisabledCapturer};
pub use schedule::{evaluate, plan_block_offsets, Evaluation};
