pub mod probe;
pub mod sampler;

pub use probe::{IdleProbe, SystemIdleProbe};
pub use sampler::{IdleCounters, IdleSampler, IdleWarning};
