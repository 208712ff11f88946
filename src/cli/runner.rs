//! Runner wiring subcommands into collectors
//!
//! Each subcommand pairs a query document with the access paths and cursor
//! tree matching that document's response shape. The record list and every
//! page-info location are fixed in advance; nothing is discovered from the
//! response at runtime.

use super::commands::{Cli, Commands};
use crate::client::{GraphqlClient, GraphqlClientConfig, ThrottleConfig};
use crate::collector::{Collector, RunStats};
use crate::config::{self, Settings};
use crate::cursor::{Connection, CursorGenerator, CursorTree};
use crate::error::Result;
use crate::path::{AccessPath, PathBuilder};
use crate::sink::JsonlWriter;
use crate::state::CursorStore;
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Response field names of the target schema
mod keys {
    pub const REPOSITORY: &str = "repository";
    pub const REF: &str = "ref";
    pub const TARGET: &str = "target";
    pub const HISTORY: &str = "history";
    pub const PAGE_INFO: &str = "pageInfo";
    pub const NODES: &str = "nodes";
    pub const NODE: &str = "node";
    pub const EDGES: &str = "edges";
    pub const PULL_REQUESTS: &str = "pullRequests";
    pub const REVIEWS: &str = "reviews";
    pub const REVIEW_THREADS: &str = "reviewThreads";
    pub const COMMENTS: &str = "comments";
}

/// Executes a parsed CLI invocation
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for the parsed arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Wire up and run the collection
    pub async fn run(&self) -> Result<()> {
        let settings = Settings::load(self.cli.settings.as_deref())?;
        let client = self.build_client(&settings)?;
        let query = config::load_query(&settings.queries_dir, self.cli.command.query_file())?;

        let output_path = self.output_path(&settings);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = if self.cli.resume {
            JsonlWriter::append(&output_path)?
        } else {
            JsonlWriter::create(&output_path)?
        };

        let (records, generator) = self.wiring()?;

        let mut collector = Collector::builder()
            .client(Box::new(client))
            .query(query)
            .cursor_generator(generator)
            .records_path(records)
            .sink(Box::new(writer))
            .store(CursorStore::new(&settings.store_file))
            .limit(self.cli.limit)
            .step(self.cli.step)
            .resume(self.cli.resume)
            .build()?;

        let RunStats {
            records_collected,
            requests_sent,
        } = collector.run().await?;
        info!(
            records = records_collected,
            requests = requests_sent,
            output = %output_path.display(),
            "export finished"
        );
        Ok(())
    }

    fn build_client(&self, settings: &Settings) -> Result<GraphqlClient> {
        let token = config::load_secret(&settings.token_file)?;
        let config = GraphqlClientConfig::new(token)
            .with_endpoint(&settings.endpoint)
            .with_timeout(Duration::from_secs(settings.timeout_secs))
            .with_max_retries(settings.max_retries)
            .with_throttle(Some(ThrottleConfig::new(
                settings.requests_per_second,
                settings.requests_per_second,
            )))
            .with_default_variable("owner", self.cli.organization.as_str())
            .with_default_variable("repository", self.cli.project.as_str())
            .with_default_variable("branch", self.cli.branch.as_str());
        GraphqlClient::new(config)
    }

    /// `raw_<timestamp>_<orga>_<proj>_<branch>_<command>[_limit<N>].jsonl`
    fn output_path(&self, settings: &Settings) -> PathBuf {
        let date = Local::now().format("%Y%m%d-%Hh%Mm%Ss");
        let mut name = format!(
            "raw_{date}_{}_{}_{}_{}",
            self.cli.organization,
            self.cli.project,
            self.cli.branch,
            self.cli.command.slug()
        );
        if self.cli.limit > 0 {
            name = format!("{name}_limit{}", self.cli.limit);
        }
        settings.output_dir.join(format!("{name}.jsonl"))
    }

    /// The record path and cursor tree for the chosen subcommand
    fn wiring(&self) -> Result<(AccessPath, CursorGenerator)> {
        match self.cli.command {
            Commands::Commits => {
                let base = PathBuilder::new()
                    .add(keys::REPOSITORY)
                    .add(keys::REF)
                    .add(keys::TARGET)
                    .add(keys::HISTORY);
                let records = base.copy().add(keys::NODES).build();
                let tree = CursorTree::single(Connection::new(
                    base.copy().add(keys::PAGE_INFO).build(),
                ));
                Ok((records, CursorGenerator::new(tree)))
            }

            Commands::PrsBrief | Commands::PrsLong => {
                let base = PathBuilder::new()
                    .add(keys::REPOSITORY)
                    .add(keys::PULL_REQUESTS);
                let records = base.copy().add(keys::EDGES).build();
                let tree = CursorTree::single(Connection::new(
                    base.copy().add(keys::PAGE_INFO).build(),
                ));
                Ok((records, CursorGenerator::new(tree)))
            }

            Commands::PrReviews => {
                let base = PathBuilder::new()
                    .add(keys::REPOSITORY)
                    .add(keys::PULL_REQUESTS);
                let records = base.copy().add(keys::EDGES).build();
                let review_page_info = base
                    .copy()
                    .add(keys::EDGES)
                    .add(0)
                    .add(keys::NODE)
                    .add(keys::REVIEWS)
                    .add(keys::PAGE_INFO)
                    .build();

                // the PR list pages backward, one PR per page, so the
                // nested review connection of that single PR is addressable
                let mut builder = CursorTree::builder();
                let root = builder.root(
                    Connection::new(base.copy().add(keys::PAGE_INFO).build())
                        .backward()
                        .variable("cursorTop"),
                );
                builder.child(root, Connection::new(review_page_info).variable("cursorReviews"));
                Ok((records, CursorGenerator::new(builder.build()?)))
            }

            Commands::PrReviewThreads => {
                let base = PathBuilder::new()
                    .add(keys::REPOSITORY)
                    .add(keys::PULL_REQUESTS);
                let records = base.copy().add(keys::EDGES).build();
                let thread_base = base
                    .copy()
                    .add(keys::EDGES)
                    .add(0)
                    .add(keys::NODE)
                    .add(keys::REVIEW_THREADS);

                let mut builder = CursorTree::builder();
                let root = builder.root(
                    Connection::new(base.copy().add(keys::PAGE_INFO).build())
                        .backward()
                        .variable("cursorTop"),
                );
                let threads = builder.child(
                    root,
                    Connection::new(thread_base.copy().add(keys::PAGE_INFO).build())
                        .variable("cursorReviewThreads"),
                );
                builder.child(
                    threads,
                    Connection::new(
                        thread_base
                            .copy()
                            .add(keys::NODES)
                            .add(0)
                            .add(keys::COMMENTS)
                            .add(keys::PAGE_INFO)
                            .build(),
                    )
                    .variable("cursorReviewThreadComments"),
                );
                Ok((records, CursorGenerator::new(builder.build()?)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["gql-harvest", "--orga", "apache", "--proj", "flink"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn test_output_path_shape() {
        let runner = Runner::new(cli(&["--limit", "10", "commits"]));
        let path = runner.output_path(&Settings::default());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with("raw_"));
        assert!(name.contains("_apache_flink_master_commits"));
        assert!(name.ends_with("_limit10.jsonl"));
        assert_eq!(path.parent().unwrap(), Settings::default().output_dir);
    }

    #[test]
    fn test_output_path_without_limit() {
        let runner = Runner::new(cli(&["prs-brief"]));
        let path = runner.output_path(&Settings::default());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(!name.contains("limit"));
        assert!(name.contains("prs_brief"));
    }

    #[test]
    fn test_wiring_builds_for_every_command() {
        for command in ["commits", "prs-brief", "prs-long", "pr-reviews", "pr-review-threads"] {
            let runner = Runner::new(cli(&[command]));
            let (records, generator) = runner.wiring().unwrap();
            assert!(!records.to_string().is_empty());
            assert!(generator.tree().len() >= 1);
        }
    }

    #[test]
    fn test_three_level_wiring() {
        let runner = Runner::new(cli(&["pr-review-threads"]));
        let (records, generator) = runner.wiring().unwrap();
        assert_eq!(records.to_string(), "repository/pullRequests/edges");
        assert_eq!(generator.tree().len(), 3);
    }
}
