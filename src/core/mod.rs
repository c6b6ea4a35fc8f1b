//! Segmentation, reading sessions and the reader facade.
pub mod classifier;
pub mod config;
pub mod reader;
pub mod rules;
pub mod session;
pub mod store;
pub mod vocabulary;
