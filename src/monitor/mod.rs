//! System sampling: the host boundary, tool output parsers, samplers and
//! bounded history.

pub mod history;
pub mod host;
pub mod parsers;
pub mod sampler;

pub use history::MetricHistory;
pub use host::{CommandError, Host, SystemHost};
pub use sampler::Sampler;
