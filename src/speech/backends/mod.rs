//! Concrete transport and audio backends

// HTTP transport using reqwest's blocking client
pub mod http;

// Audio output using rodio
pub mod audio;

pub use audio::RodioOutput;
pub use http::HttpTransport;
