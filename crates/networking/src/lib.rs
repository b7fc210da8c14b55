//! Flowva Networking - HTTP client for the hosted rewards backend

pub mod http;

pub use http::FlowvaClient;
