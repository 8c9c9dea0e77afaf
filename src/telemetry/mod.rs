pub mod sampler;

pub use sampler::{RetryPolicy, TelemetrySampler};
