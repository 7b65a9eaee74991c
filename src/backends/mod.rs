//! Search backend implementations.
//!
//! Each module provides a struct implementing
//! [`crate::backend::SearchBackend`] for one provider.

pub mod brave;
pub mod duckduckgo;
pub mod perplexica;

pub use brave::BraveBackend;
pub use duckduckgo::DuckDuckGoBackend;
pub use perplexica::PerplexicaBackend;
