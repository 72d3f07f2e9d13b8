pub mod error;
pub mod fallback;
pub mod gate;
pub mod generator;
pub mod models;
pub mod selection;
pub mod service;
