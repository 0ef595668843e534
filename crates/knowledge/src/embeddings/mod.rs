//! Embedding providers for the semantic index.
//!
//! The same provider must embed both the indexed questions and incoming
//! topics; the index records which one built each collection.

pub mod provider;
pub mod providers;

pub use ccna_core::config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
