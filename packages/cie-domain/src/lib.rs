pub mod hierarchy;
pub mod level;
pub mod normalize;

mod error;

pub use error::{Error, Result};
