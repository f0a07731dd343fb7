//! Entry point for the offline fetch → extract → chunk → embed → catalog
//! pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use chrono::Utc;
use tracing::{info, warn};

use unirag_core::artifacts::{ChunksFile, DocumentsManifest};
use unirag_ingest::catalog_builder::build_categories;
use unirag_ingest::chunker::{Chunker, SentenceChunker};
use unirag_ingest::config::{Cli, IngestConfig};
use unirag_ingest::embed_driver::{build_embeddings_file, embed_all};
use unirag_ingest::embedder_client::HttpEmbedder;
use unirag_ingest::extractor::extract_text;
use unirag_ingest::fetcher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = IngestConfig::resolve(cli).context("failed to resolve ingest configuration")?;

    std::fs::create_dir_all(&config.output_dir)?;
    let generated_at = Utc::now().to_rfc3339();

    info!(index_url = %config.index_url, output_dir = ?config.output_dir, "starting ingestion run");

    let client = reqwest::Client::new();
    let documents = fetcher::fetch_all(&client, &config.index_url, &config.output_dir, config.request_delay_ms)
        .await
        .context("document discovery/download failed")?;

    let downloaded_count = documents.iter().filter(|d| d.downloaded).count();
    info!(total = documents.len(), downloaded = downloaded_count, "fetch phase complete");

    let categories_file = build_categories(&documents, &generated_at);
    let manifest = DocumentsManifest {
        version: "1".to_string(),
        generated_at: generated_at.clone(),
        source_url: config.index_url.clone(),
        total_documents: documents.len(),
        downloaded_count,
        categories: categories_file
            .categories
            .iter()
            .map(|c| unirag_core::artifacts::CategoryCount { id: c.id, count: c.document_count })
            .collect(),
        documents: documents.clone(),
    };
    write_json(&config.output_dir.join("documents.json"), &manifest)?;

    let chunker = SentenceChunker::new(config.target_tokens, config.overlap_tokens, config.min_chunk_tokens);
    let mut chunks = Vec::new();
    for document in documents.iter().filter(|d| d.downloaded) {
        let path = config.output_dir.join(document.category.as_str()).join(&document.filename);
        match extract_and_chunk(&chunker, document, &path) {
            Ok(mut doc_chunks) => chunks.append(&mut doc_chunks),
            Err(e) => warn!(document_id = %document.id, error = %e, "extraction/chunking failed, skipping document"),
        }
    }
    info!(total_chunks = chunks.len(), "chunking phase complete");

    let chunk_config = config.chunk_config();
    let chunks_file = ChunksFile {
        version: "1".to_string(),
        generated_at: generated_at.clone(),
        config: chunk_config,
        total_chunks: chunks.len(),
        chunks: chunks.clone(),
    };
    write_json(&config.output_dir.join("chunks.json"), &chunks_file)?;

    let embedder: Arc<dyn unirag_core::embedder::Embedder> = Arc::new(HttpEmbedder::new(
        config.embedder_base_url.clone(),
        config.embedder_api_key.clone(),
        config.embedder_model.clone(),
    ));
    let embedded = embed_all(embedder, chunks, config.batch_size, config.batch_pause_ms)
        .await
        .context("embedding phase failed")?;
    info!(embedded = embedded.len(), "embedding phase complete");

    let embeddings_file = build_embeddings_file(embedded, &config.embedder_model, chunk_config, &generated_at);
    let embeddings_json = serde_json::to_vec_pretty(&embeddings_file)?;
    std::fs::write(config.output_dir.join("embeddings.json"), &embeddings_json)?;
    write_gzip(&config.output_dir.join("embeddings.json.gz"), &embeddings_json)?;

    write_json(&config.output_dir.join("categories.json"), &categories_file)?;

    info!("ingestion run complete");
    Ok(())
}

fn extract_and_chunk(
    chunker: &SentenceChunker,
    document: &unirag_core::document::Document,
    path: &Path,
) -> unirag_ingest::error::Result<Vec<unirag_core::document::Chunk>> {
    let text = extract_text(path, document.doc_type)?;
    Ok(chunker.chunk(document, &text))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn write_gzip(path: &Path, bytes: &[u8]) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let file = std::fs::File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()?;
    Ok(())
}
