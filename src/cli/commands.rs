//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Downloads repository analytics data from a GraphQL API
#[derive(Parser, Debug)]
#[command(name = "gql-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Organization or user owning the repository (e.g. apache)
    #[arg(long = "orga")]
    pub organization: String,

    /// Repository name (e.g. flink)
    #[arg(long = "proj")]
    pub project: String,

    /// Branch walked by the commit export (main, master, trunk, ...)
    #[arg(long, default_value = "master")]
    pub branch: String,

    /// Stop after this many records (0 = everything)
    #[arg(short, long, default_value_t = 0)]
    pub limit: usize,

    /// Records requested per page
    #[arg(long, default_value_t = 100)]
    pub step: usize,

    /// Resume from the last persisted cursor and append to the output file
    #[arg(short, long)]
    pub resume: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Settings file (YAML)
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands, one per exported dataset
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Download commits (fast, from most recent)
    Commits,

    /// Download PRs with only brief information per PR (fast, from oldest)
    PrsBrief,

    /// Download PRs with extensive information on comments, reviews, etc.
    /// (slow, from oldest)
    PrsLong,

    /// Download only review metadata for each PR (slow, from most recent)
    PrReviews,

    /// Download only review thread metadata for each PR (slow, from most
    /// recent)
    PrReviewThreads,
}

impl Commands {
    /// Short name used in output file names
    pub fn slug(self) -> &'static str {
        match self {
            Commands::Commits => "commits",
            Commands::PrsBrief => "prs_brief",
            Commands::PrsLong => "prs_long",
            Commands::PrReviews => "pr_reviews",
            Commands::PrReviewThreads => "pr_review_threads",
        }
    }

    /// Query document this subcommand sends
    pub fn query_file(self) -> &'static str {
        match self {
            Commands::Commits => "commits.graphql",
            Commands::PrsBrief => "pull_requests_brief.graphql",
            Commands::PrsLong => "pull_requests_long.graphql",
            Commands::PrReviews => "pull_request_reviews.graphql",
            Commands::PrReviewThreads => "pull_request_review_threads.graphql",
        }
    }
}
