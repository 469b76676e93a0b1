#![doc = include_str!("../README.md")]

// -------------------------------------------------------------------------------------------------

mod client;
mod error;
mod publisher;

// -------------------------------------------------------------------------------------------------

// re-export publisher and error as public interface
pub use error::Error;
pub use publisher::{options::Options, publish_site};
