//! Scriptlet Core: the configuration layer shared by the execution engine and
//! the command-line host.

pub mod config;
