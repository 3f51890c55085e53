// Adapters layer: concrete implementations of the domain ports (HTTP client, wire DTOs).

pub mod dto;
pub mod http;

pub use http::HttpConflictClient;
