//! Testing utilities for tandem.
//!
//! # Modules
//!
//! - [`fixtures`]: lock snapshots and project descriptors
//! - [`mock_server`]: wiremock-backed PyPI, GitHub and mapping servers
//! - [`proptest_strategies`]: strategies for versions and snapshots

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod fixtures;
pub mod mock_server;
pub mod proptest_strategies;

/// Re-export commonly used testing utilities.
pub mod prelude {
    pub use crate::fixtures::Fixtures;
    pub use crate::mock_server::{MockGitHub, MockMapping, MockPyPi};
    pub use crate::proptest_strategies::*;

    pub use pretty_assertions::{assert_eq, assert_ne};
    pub use proptest::prelude::*;
}
