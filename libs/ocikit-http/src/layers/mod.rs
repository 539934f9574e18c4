//! Tower layers composed by [`crate::HttpClientBuilder`].

mod default_headers;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
