pub mod error;
pub mod fourcc;
pub mod sample_type;
pub mod time_window;

pub use error::*;
pub use fourcc::*;
pub use sample_type::*;
pub use time_window::*;
