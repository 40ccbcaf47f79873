//! Library side of the `partmap` command-line tool.

pub mod input;
pub mod logging;
pub mod pipeline;
pub mod settings;
pub mod types;
