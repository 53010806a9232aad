//! The three sequential stages: fetch, relevance classification, translation.
//!
//! Every stage reads from and writes to an explicit [`PipelineRun`]. Scans
//! process items strictly in source order; each item's append, progress
//! report and pacing finish before the next item starts.

pub mod classify;
pub mod progress;
pub mod translate;

pub use classify::RelevanceCondition;
pub use progress::{ProgressSink, ScanProgress, Stage, TerminalProgress};
pub use translate::TRANSLATION_FAILED;

use tracing::{debug, error, info, warn};

use crate::arxiv::{FetchError, Paper, PaperSource, SearchQuery};
use crate::gemini::{GeminiError, ModelProvider};
use crate::rate_limit::RateLimiter;
use translate::DEFAULT_TARGET_LANGUAGE;

/// Per-item failure inside a scan. Never aborts the scan.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("{0}")]
    Model(#[from] GeminiError),

    #[error("empty reply from the model")]
    EmptyReply,
}

/// Stage-level aborts.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("could not start a Gemini session: {0}")]
    ModelInit(#[source] GeminiError),
}

/// Everything one operator session accumulates across stages.
#[derive(Debug, Default)]
pub struct PipelineRun {
    pub fetched: Vec<Paper>,
    pub relevant: Vec<Paper>,
    pub translated: Vec<Paper>,
    pub total_discovered: Option<u64>,
    pub warnings: Vec<String>,
    pub last_error: Option<String>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub processed: usize,
    pub kept: usize,
    pub failures: usize,
}

/// Replaces `run.fetched` with the result of `query`. On failure the fetched
/// list is left empty and the error is recorded on the run.
pub async fn fetch_stage(
    run: &mut PipelineRun,
    source: &impl PaperSource,
    query: &SearchQuery,
) -> Result<usize, PipelineError> {
    match source.fetch(query).await {
        Ok(outcome) => {
            run.fetched = outcome.papers;
            run.total_discovered = outcome.total_discovered;
            run.last_error = None;
            info!(
                fetched = run.fetched.len(),
                total = ?run.total_discovered,
                "fetch complete"
            );
            Ok(run.fetched.len())
        }
        Err(e) => {
            error!(error = %e, "fetch failed");
            run.fetched.clear();
            run.last_error = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// Drives the model-backed scans, pacing every model call through one limiter.
pub struct Pipeline<P> {
    models: P,
    limiter: RateLimiter,
    target_language: String,
}

impl<P: ModelProvider> Pipeline<P> {
    pub fn new(models: P, limiter: RateLimiter) -> Self {
        debug!(interval = ?limiter.interval(), "model calls paced");
        Self {
            models,
            limiter,
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }

    pub fn with_target_language(mut self, target_language: &str) -> Self {
        self.target_language = target_language.to_string();
        self
    }

    async fn open_session(&self, run: &mut PipelineRun) -> Result<P::Session, PipelineError> {
        match self.models.open_session().await {
            Ok(session) => {
                run.last_error = None;
                Ok(session)
            }
            Err(e) => {
                error!(error = %e, "model session failed");
                run.last_error = Some(e.to_string());
                Err(PipelineError::ModelInit(e))
            }
        }
    }

    /// Rebuilds `run.relevant` from `run.fetched`.
    ///
    /// Papers without a summary are never sent to the model. A failed call
    /// counts as not relevant and is recorded as a warning. The limiter is
    /// consulted once per item, skipped or not.
    pub async fn classify_scan(
        &mut self,
        run: &mut PipelineRun,
        condition: &RelevanceCondition,
        sink: &mut impl ProgressSink,
    ) -> Result<ScanSummary, PipelineError> {
        run.relevant.clear();
        let mut session = self.open_session(run).await?;

        let total = run.fetched.len();
        let mut summary = ScanSummary::default();
        info!(total, condition = condition.as_str(), "classification started");

        for paper in &run.fetched {
            self.limiter.wait().await;

            if !paper.summary.is_empty() {
                match classify::classify(&mut session, condition, paper).await {
                    Ok(true) => run.relevant.push(paper.clone()),
                    Ok(false) => {}
                    Err(e) => {
                        warn!(title = %paper.title, error = %e, "classification failed, treating as not relevant");
                        summary.failures += 1;
                        let message = format!("could not classify '{}': {e}", paper.title);
                        sink.warning(&message);
                        run.warnings.push(message);
                    }
                }
            }

            summary.processed += 1;
            sink.report(ScanProgress {
                stage: Stage::Classification,
                processed: summary.processed,
                total,
                snapshot: &run.relevant,
            });
        }

        summary.kept = run.relevant.len();
        info!(
            processed = summary.processed,
            relevant = summary.kept,
            failures = summary.failures,
            "classification complete"
        );
        Ok(summary)
    }

    /// Rebuilds `run.translated` from `run.relevant`.
    ///
    /// Papers with both a title and a summary get two paced model calls and
    /// are always appended; a failed field holds [`TRANSLATION_FAILED`].
    /// Papers missing either field are skipped without any call.
    pub async fn translate_scan(
        &mut self,
        run: &mut PipelineRun,
        sink: &mut impl ProgressSink,
    ) -> Result<ScanSummary, PipelineError> {
        run.translated.clear();
        let mut session = self.open_session(run).await?;

        let total = run.relevant.len();
        let mut summary = ScanSummary::default();
        let mut failed_fields = Vec::new();
        info!(total, target = %self.target_language, "translation started");

        for paper in run.relevant.iter_mut() {
            if !paper.title.is_empty() && !paper.summary.is_empty() {
                self.limiter.wait().await;
                let title = translate::translate(&mut session, &self.target_language, &paper.title).await;
                self.limiter.wait().await;
                let abstract_text =
                    translate::translate(&mut session, &self.target_language, &paper.summary).await;

                let title = fail_soft(title, "title", paper, &mut failed_fields);
                let abstract_text = fail_soft(abstract_text, "summary", paper, &mut failed_fields);
                if !failed_fields.is_empty() {
                    summary.failures += 1;
                }

                paper.translated_title = Some(title);
                paper.translated_summary = Some(abstract_text);
                run.translated.push(paper.clone());
            }

            for message in failed_fields.drain(..) {
                sink.warning(&message);
                run.warnings.push(message);
            }

            summary.processed += 1;
            sink.report(ScanProgress {
                stage: Stage::Translation,
                processed: summary.processed,
                total,
                snapshot: &run.translated,
            });
        }

        summary.kept = run.translated.len();
        info!(
            processed = summary.processed,
            translated = summary.kept,
            failures = summary.failures,
            "translation complete"
        );
        Ok(summary)
    }
}

fn fail_soft(
    result: Result<String, ItemError>,
    field: &str,
    paper: &Paper,
    failures: &mut Vec<String>,
) -> String {
    result.unwrap_or_else(|e| {
        warn!(title = %paper.title, field, error = %e, "translation failed");
        failures.push(format!("could not translate {field} of '{}': {e}", paper.title));
        TRANSLATION_FAILED.to_string()
    })
}
