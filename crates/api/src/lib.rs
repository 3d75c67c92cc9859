//! HTTP API: the role catalog endpoints over axum.

pub mod app;
