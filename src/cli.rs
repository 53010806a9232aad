use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::gemini::SessionMode;
use crate::pipeline::translate::DEFAULT_TARGET_LANGUAGE;

#[derive(Parser, Debug)]
#[command(name = "arxiv-triage")]
#[command(about = "Search arXiv, keep the relevant papers with Gemini, and translate them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch matching papers and export them
    Search(SearchArgs),
    /// Fetch, classify for relevance, translate, exporting after each stage
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search terms. Boolean operators (AND, OR, ANDNOT) and parentheses are passed through
    pub terms: String,

    /// First submission date, inclusive (YYYY-MM-DD)
    #[arg(long, default_value = "2020-01-01")]
    pub from: NaiveDate,

    /// Last submission date, inclusive (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Number of papers to fetch (1-2000)
    #[arg(short = 'n', long, default_value_t = 10)]
    pub max_results: usize,

    /// Directory the XML exports are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Topic a paper must concern to be kept (e.g. "new methodology")
    #[arg(short, long)]
    pub condition: String,

    /// Gemini requests per minute; every model call is paced to this rate
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    pub rpm: u32,

    /// Whether prompts share one conversation or are sent independently
    #[arg(long, value_enum, default_value_t = SessionMode::Stateless)]
    pub session: SessionMode,

    /// Language titles and abstracts are translated into
    #[arg(long, default_value = DEFAULT_TARGET_LANGUAGE)]
    pub target_language: String,

    /// Stop after the relevance stage
    #[arg(long)]
    pub skip_translation: bool,
}
