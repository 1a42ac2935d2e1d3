use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::chunker::{chunk_text, group_chunks, MAX_CHUNK_SIZE, TARGET_GROUP_COUNT};
use crate::config::Config;
use crate::extractor::{extract, ExtractError};
use crate::io::save_digest;
use crate::llm::GroqClient;
use crate::models::NewsItem;
use crate::summarizer::NewsletterSummarizer;

#[derive(Debug, Error)]
pub enum DistillError {
    #[error("no text-generation API key configured")]
    MissingApiKey,
    #[error("failed to initialize HTTP client: {0}")]
    Client(String),
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error("summarization failed: all {groups} group requests failed")]
    SummarizationFailed { groups: usize },
}

impl DistillError {
    /// Short classification code for the caller's error envelope; `Display`
    /// carries the human-readable detail.
    pub fn code(&self) -> &'static str {
        match self {
            DistillError::MissingApiKey => "missing_api_key",
            DistillError::Client(_) => "client_init",
            DistillError::Extraction(ExtractError::EmptyInput) => "empty_input",
            DistillError::Extraction(ExtractError::ParseFailure(_)) => "parse_failure",
            DistillError::SummarizationFailed { .. } => "summarization_failed",
        }
    }
}

/// How the final list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    /// The consolidation pass ran and its output was used.
    Refined,
    /// The consolidation pass failed; group summaries were passed through.
    PassThrough,
    /// Nothing survived extraction, so no external calls were made.
    Skipped,
}

/// Outcome of one distillation request. `groups_failed > 0` marks a partial
/// success: some batches were dropped but the rest made it through.
#[derive(Debug)]
pub struct Distilled {
    pub items: Vec<NewsItem>,
    pub groups_total: usize,
    pub groups_failed: usize,
    pub refinement: Refinement,
}

impl Distilled {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            groups_total: 0,
            groups_failed: 0,
            refinement: Refinement::Skipped,
        }
    }
}

/// The whole pipeline, end to end: extraction, chunking, batching, per-group
/// summarization, refinement, and the optional digest audit write.
///
/// Build one `Distiller` per process and reuse it: the rate-pacing state
/// lives inside and only spans calls made through the same instance.
pub struct Distiller {
    summarizer: NewsletterSummarizer,
    digest_dir: Option<PathBuf>,
}

impl Distiller {
    /// The credential is checked here, before any extraction work: without
    /// it, summarization cannot proceed at all.
    pub fn new(config: Config) -> Result<Self, DistillError> {
        if config.groq_api_key.trim().is_empty() {
            return Err(DistillError::MissingApiKey);
        }

        let llm = GroqClient::new(config.groq_api_key, config.model)
            .map_err(|e| DistillError::Client(e.to_string()))?;

        Ok(Self {
            summarizer: NewsletterSummarizer::new(llm),
            digest_dir: config.digest_dir,
        })
    }

    pub async fn distill(&self, html: &str) -> Result<Distilled, DistillError> {
        let plain_text = extract(html)?;
        if plain_text.is_empty() {
            info!("no readable content survived extraction");
            return Ok(Distilled::empty());
        }

        let chunks = chunk_text(&plain_text, MAX_CHUNK_SIZE);
        if chunks.is_empty() {
            info!("no text chunks after processing");
            return Ok(Distilled::empty());
        }

        let batches = group_chunks(&chunks, TARGET_GROUP_COUNT);
        let groups_total = batches.len();

        let mut drafts = Vec::new();
        for (i, batch) in batches.iter().enumerate() {
            info!("generating summary for group {}/{}", i + 1, groups_total);
            match self.summarizer.summarize_group(batch).await {
                Some(item) => drafts.push(item),
                None => warn!("dropped group {}/{}", i + 1, groups_total),
            }
        }

        let groups_failed = groups_total - drafts.len();
        if drafts.is_empty() {
            return Err(DistillError::SummarizationFailed {
                groups: groups_total,
            });
        }

        info!("refining {} group summaries", drafts.len());
        let (items, passthrough) = self.summarizer.refine(&drafts).await;
        let refinement = if passthrough {
            Refinement::PassThrough
        } else {
            Refinement::Refined
        };

        // Best-effort audit trail: a failed write is logged and nothing more.
        if let Some(dir) = &self.digest_dir {
            match save_digest(&items, dir) {
                Ok(path) => info!("digest saved to {}", path.display()),
                Err(e) => warn!("failed to write digest: {e:#}"),
            }
        }

        Ok(Distilled {
            items,
            groups_total,
            groups_failed,
            refinement,
        })
    }
}
