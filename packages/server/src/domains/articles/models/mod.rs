pub mod article;
pub mod interaction;

pub use article::{Article, ArticleDraft, ExternalLink, KeyConcept, RewritePatch};
pub use interaction::{RewriteRecord, UserInteraction};
