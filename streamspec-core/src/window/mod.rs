//! Window descriptor bridge.
//!
//! Users describe windows with descriptors such as [`SessionWindow`] and
//! [`TumblingWindow`]. At registration the builder asks the descriptor for its
//! [`WindowFn`], stores that on the window spec and drops the descriptor.
//! Triggering and window state belong to the runtime.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::types::{MessageEnvelope, StreamData};

mod descriptors;
mod function;

pub use descriptors::*;
pub use function::*;

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
