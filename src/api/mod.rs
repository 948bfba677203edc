//! API module
//!
//! HTTP handlers: HTML pages, JSON editor actions and health probes.

pub mod health;
pub mod newsletters;
pub mod pages;
pub mod utils;
