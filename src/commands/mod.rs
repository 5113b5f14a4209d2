//! Chat command surface.
//!
//! This module provides:
//! - Parsing of `>`-prefixed chat commands
//! - The command router over a capability bundle

pub mod parser;
pub mod router;

pub use parser::{Command, COMMAND_PREFIX};
pub use router::{dispatch, Capabilities, RequestContext, SELECTION_TIMEOUT};
