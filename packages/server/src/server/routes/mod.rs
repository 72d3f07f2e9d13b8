// HTTP routes
pub mod articles;
pub mod health;

pub use articles::*;
pub use health::*;
