//! Intercore CLI library: the command implementations behind the
//! `intercore` binary, exposed for integration tests.

pub mod commands;
