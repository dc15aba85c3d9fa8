//! HTTP surface for the flavor catalog's authentication service.

pub mod api;
pub mod config;
pub mod logging;
