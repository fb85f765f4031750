//! HTTP gateway to the REANA REST API

pub mod client;
pub mod models;
