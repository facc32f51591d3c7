//! Thin wrapper around the reqwest client.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
