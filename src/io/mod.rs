//! Input reading and output writing.

pub mod reader;
pub mod writer;

pub use reader::{InputReader, ReadStatistics};
pub use writer::{OutputWriter, WriteStatistics};
