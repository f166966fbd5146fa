//! Queue-based generation service: job model, HTTP client and bounded fan-out.

pub mod client;
pub mod job;
pub mod pool;

#[cfg(test)]
#[path = "../tests/unit/remote/fake.rs"]
pub(crate) mod fake;
