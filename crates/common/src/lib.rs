//! Process-level helpers shared by the `dbjson` binaries: logging bootstrap
//! and filesystem preparation.

pub mod utils;
pub mod env;
