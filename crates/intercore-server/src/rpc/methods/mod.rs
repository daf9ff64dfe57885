//! JSON-RPC method implementations.
//!
//! Each sub-module exposes typed param/result structs and async functions
//! taking `AppState` plus params.

pub mod devices;
