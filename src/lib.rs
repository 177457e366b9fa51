//! Presagio - next-syscall prediction over HTTP
//!
//! This library provides the core functionality for training a Random
//! Forest on synthetic syscall sequences and serving next-call predictions
//! over a small JSON HTTP API, with disk persistence of the trained model.

pub mod cli;
pub mod encoder;
pub mod forest;
pub mod generator;
pub mod model_persistence;
pub mod model_store;
pub mod server;
pub mod syscalls;
