pub mod request;

pub use request::{request, RequestError, RequestOptions, Response};
