pub mod config;
pub mod emitter;
pub mod error;
pub mod session;
pub mod source;
pub mod stats;

pub use config::*;
pub use emitter::*;
pub use error::*;
pub use session::*;
pub use source::*;
pub use stats::*;
