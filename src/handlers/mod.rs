//! HTTP handlers for the generic entity API and the app endpoints.

pub mod app;
pub mod generic;
