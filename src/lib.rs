//! tagflow - streaming tag-protocol engine
//!
//! Turns an unstructured, incrementally-streamed model response into a
//! sequence of discrete, executable filesystem operations. Fragments from a
//! two-channel producer (answer vs. reasoning) are multiplexed into one
//! linear tagged document; a continuation protocol recovers output truncated
//! mid-write; extraction then yields typed operation records which the
//! applier executes against a project root.

pub mod apply;
pub mod error;
pub mod paths;
pub mod stream;
pub mod tags;
pub mod turn;

pub use error::{Result, TagflowError};
