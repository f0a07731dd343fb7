//! Offline ingestion pipeline: fetch documents from an index page, extract
//! their text, chunk it, embed the chunks, and write the four artifacts
//! `unirag-core` reads at runtime.
//!
//! Each stage is a free function/module rather than a single orchestrating
//! object, so `unirag-ingest` can be driven either from the `unirag-ingest`
//! binary (the whole pipeline end to end) or from tests that want to
//! exercise a single stage.

pub mod catalog_builder;
pub mod chunker;
pub mod config;
pub mod embed_driver;
pub mod embedder_client;
pub mod error;
pub mod extractor;
pub mod fetcher;
