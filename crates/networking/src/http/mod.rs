//! HTTP client for the hosted PostgREST and auth endpoints

mod client;

pub use client::FlowvaClient;
