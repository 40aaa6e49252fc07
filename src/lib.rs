//! Fetch HTML fragments and append them to an in-memory document.

mod config;
pub mod dom;
mod error;
mod loader;
pub mod net;

pub use crate::config::LoaderConfig;
pub use crate::error::LoadError;
pub use crate::loader::{Callback, FragmentLoader, LoadResult};
