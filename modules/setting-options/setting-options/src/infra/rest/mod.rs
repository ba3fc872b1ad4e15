//! REST transport for the settings API.

mod hyper_fetch;

pub use hyper_fetch::HyperFetch;
