//! HTTP client module
//!
//! The request adapter every node calls through.
//!
//! # Features
//!
//! - **Request descriptors**: `ApiRequest` carries method, path, query, headers and body
//! - **Base URL joining**: relative paths joined with exactly one `/`, absolute URLs kept
//! - **Authentication**: integration with the auth module
//! - **Response modes**: parsed JSON or raw bytes for file downloads

mod client;

pub use client::{
    join_url, ApiRequest, ApiResponse, HttpClient, HttpClientConfig, HttpClientConfigBuilder,
    ResponseMode,
};
