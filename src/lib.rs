pub mod config;
pub mod context;
pub mod database;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod projector;
pub mod sampler;
pub mod util;

pub use context::AppContext;
pub use error::{ProjectorError, Result};
