pub mod deps;
pub mod groq;
pub mod topic_feed;
pub mod traits;

pub use deps::ServerDeps;
