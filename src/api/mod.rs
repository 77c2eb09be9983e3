pub mod client;
pub mod error;

pub use client::{ReqwestTransport, Transport};
pub use error::FetchFailed;
