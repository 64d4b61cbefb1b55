//! Common test utilities and fixtures.

pub mod admin;
pub mod fixtures;

#[allow(unused_imports)]
pub use admin::*;
#[allow(unused_imports)]
pub use fixtures::*;
