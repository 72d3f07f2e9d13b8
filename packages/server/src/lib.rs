// Daily Psycho - article generation coordinator
//
// This crate decides, for a rolling stream of research topics, whether a
// fresh AI-generated article is due, guards against duplicate and concurrent
// generation, falls back to synthesized content when the backend is down or
// rate-limited, and persists results under rules that keep already-finalized
// articles immutable.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
