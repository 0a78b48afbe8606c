//! HTTP API module - routes and handlers

pub mod handlers;
pub mod payload;
pub mod routes;
