use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::arxiv::{ArxivClient, PaperSource, QueryError, SearchQuery};
use crate::cli::{Command, RunArgs, SearchArgs};
use crate::export::{self, ExportError};
use crate::gemini::{GeminiProvider, ModelProvider};
use crate::pipeline::{
    Pipeline, PipelineError, PipelineRun, RelevanceCondition, TerminalProgress, fetch_stage,
};
use crate::rate_limit::RateLimiter;
use crate::render;

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

const FETCHED_EXPORT: &str = "arxiv_papers.xml";
const RELEVANT_EXPORT: &str = "relevant_papers.xml";
const TRANSLATED_EXPORT: &str = "translated_papers.xml";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid search: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub async fn run(command: Command) -> Result<(), AppError> {
    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;

    match command {
        Command::Search(args) => search(http, &args).await,
        Command::Run(args) => run_all(http, &args).await,
    }
}

fn build_query(args: &SearchArgs) -> Result<SearchQuery, QueryError> {
    let end = args
        .to
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    SearchQuery::new(&args.terms, args.from, end, args.max_results)
}

async fn fetch_and_export(
    source: &impl PaperSource,
    args: &SearchArgs,
    run: &mut PipelineRun,
) -> Result<(), AppError> {
    let query = build_query(args)?;

    let result = fetch_stage(run, source, &query).await;
    if let Some(total) = run.total_discovered {
        println!("Papers in the repository matching the search: {total}");
    }
    result?;

    println!("{} papers found", run.fetched.len());
    if run.fetched.is_empty() {
        println!("No papers loaded.");
    } else {
        println!("{}", render::paper_list(&run.fetched));
    }
    export::write_xml(&args.output_dir.join(FETCHED_EXPORT), &run.fetched)?;
    Ok(())
}

async fn search(http: Client, args: &SearchArgs) -> Result<(), AppError> {
    let mut run = PipelineRun::new();
    fetch_and_export(&ArxivClient::new(http), args, &mut run).await
}

async fn run_all(http: Client, args: &RunArgs) -> Result<(), AppError> {
    let arxiv = ArxivClient::new(http.clone());
    let models = GeminiProvider::new(http, args.session);
    let mut run = PipelineRun::new();
    run_stages(&arxiv, models, args, &mut run).await
}

/// Fetch, classify and translate, exporting after each stage. The model
/// configuration is only read when the classification scan starts, so the
/// fetch export is written even when the model cannot be reached.
async fn run_stages(
    source: &impl PaperSource,
    models: impl ModelProvider,
    args: &RunArgs,
    run: &mut PipelineRun,
) -> Result<(), AppError> {
    fetch_and_export(source, &args.search, run).await?;

    let mut pipeline = Pipeline::new(models, RateLimiter::per_minute(args.rpm))
        .with_target_language(&args.target_language);
    let out_dir: &Path = &args.search.output_dir;

    let condition = RelevanceCondition::new(&args.condition);
    let summary = pipeline
        .classify_scan(run, &condition, &mut TerminalProgress::new())
        .await?;
    println!(
        "{} of {} papers relevant to \"{}\"",
        summary.kept,
        summary.processed,
        condition.as_str()
    );
    if run.relevant.is_empty() {
        println!("No relevant papers found.");
    }
    export::write_xml(&out_dir.join(RELEVANT_EXPORT), &run.relevant)?;

    if args.skip_translation {
        info!("translation skipped");
        return Ok(());
    }

    let summary = pipeline
        .translate_scan(run, &mut TerminalProgress::new())
        .await?;
    println!("{} papers translated", summary.kept);
    export::write_xml(&out_dir.join(TRANSLATED_EXPORT), &run.translated)?;

    if !run.warnings.is_empty() {
        warn!(count = run.warnings.len(), "run finished with per-item failures");
    }
    Ok(())
}
