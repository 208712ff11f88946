//! Collection driver
//!
//! The run loop tying everything together: send the composite query,
//! extract the current page's records, forward them to the sink, ask the
//! cursor generator for the next round's variables, and repeat until
//! pagination is exhausted or the record ceiling is reached.
//!
//! One page is fully buffered before it is handed to the sink, bounding
//! memory to the page size for arbitrarily long exports. Requests are
//! strictly sequential: one outstanding request at a time.
//!
//! On a fatal error the driver persists its last known cursor mapping to
//! the [`CursorStore`] before propagating the failure, so a later run with
//! the resume flag picks up where this one stopped.

use crate::client::QueryClient;
use crate::cursor::{CursorGenerator, NextCursors};
use crate::error::{Error, Result};
use crate::path::AccessPath;
use crate::sink::RecordSink;
use crate::state::CursorStore;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Default page size
pub const DEFAULT_STEP: usize = 100;

/// Default request-variable name for the page size
pub const STEP_VARIABLE: &str = "step";

/// Lifecycle of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Not started
    #[default]
    Idle,
    /// Loop in progress
    Running,
    /// Pagination exhausted or limit reached
    Done,
    /// Aborted by a fatal error; cursor position persisted
    Failed,
}

/// Statistics of one collection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Records extracted, including any the sink declined
    pub records_collected: usize,
    /// Requests sent
    pub requests_sent: usize,
}

/// Drives paginated collection of one query's records
pub struct Collector {
    client: Box<dyn QueryClient>,
    query: String,
    generator: CursorGenerator,
    records: AccessPath,
    sink: Box<dyn RecordSink>,
    store: CursorStore,
    limit: usize,
    step: usize,
    step_variable: String,
    resume: bool,
    state: RunState,
    stats: RunStats,
}

impl Collector {
    /// Start assembling a collector
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::new()
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Statistics so far
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run the collection loop to completion.
    ///
    /// Returns the run statistics on success. On failure the last known
    /// cursor mapping has been persisted and the error is propagated
    /// unchanged; there is no retry at this layer.
    pub async fn run(&mut self) -> Result<RunStats> {
        if self.state != RunState::Idle {
            return Err(Error::collector("collector has already run"));
        }
        self.state = RunState::Running;
        info!("data collection start");

        let mut cursors: HashMap<String, String> = HashMap::new();
        if self.resume {
            match self.store.load().await {
                Ok(Some(loaded)) => {
                    info!(?loaded, "resuming from persisted cursor position");
                    cursors = loaded;
                }
                Ok(None) => {}
                Err(err) => {
                    self.state = RunState::Failed;
                    return Err(err);
                }
            }
        }

        match self.collect(&mut cursors).await {
            Ok(()) => {
                self.state = RunState::Done;
                info!(
                    records = self.stats.records_collected,
                    requests = self.stats.requests_sent,
                    "data collection done"
                );
                Ok(self.stats)
            }
            Err(err) => {
                self.state = RunState::Failed;
                error!(
                    ?cursors,
                    records = self.stats.records_collected,
                    "collection failed; run again with resume to continue from this position"
                );
                if !cursors.is_empty() {
                    if let Err(save_err) = self.store.save(&cursors).await {
                        error!(%save_err, "could not persist cursor position");
                    }
                }
                Err(err)
            }
        }
    }

    async fn collect(&mut self, cursors: &mut HashMap<String, String>) -> Result<()> {
        let mut has_next = true;

        while has_next && (self.limit == 0 || self.stats.records_collected < self.limit) {
            let variables = self.compile_variables(cursors);
            debug!(?variables, "request variables");

            let snapshot = self.client.send(&self.query, variables).await?;
            self.stats.requests_sent += 1;

            let records = self.extract_records(&snapshot)?;
            for record in &records {
                if !self.sink.accept(record)? {
                    info!("sink declined record, stopping page forwarding");
                    break;
                }
            }

            match self.generator.next_cursors(&snapshot)? {
                NextCursors::Continue(next) => *cursors = next,
                NextCursors::Complete => has_next = false,
            }

            // the whole extracted page counts, declined records included
            self.stats.records_collected += records.len();
            info!(collected = self.stats.records_collected, "collected records");
        }

        Ok(())
    }

    /// Page-size variable plus the current cursor mapping.
    ///
    /// With a limit set, the page size is clamped so the last page does not
    /// overshoot the ceiling.
    fn compile_variables(&self, cursors: &HashMap<String, String>) -> Map<String, Value> {
        let step = if self.limit > 0 {
            self.limit
                .saturating_sub(self.stats.records_collected)
                .min(self.step)
        } else {
            self.step
        };

        let mut variables = Map::new();
        variables.insert(self.step_variable.clone(), Value::from(step));
        for (name, value) in cursors {
            variables.insert(name.clone(), Value::from(value.clone()));
        }
        variables
    }

    /// Buffer the page's record list out of the snapshot
    fn extract_records(&self, snapshot: &Value) -> Result<Vec<Value>> {
        let list = self.records.run(snapshot)?;
        let records = list.as_array().ok_or_else(|| {
            Error::extraction(self.records.to_string(), "record list is not an array")
        })?;
        Ok(records.clone())
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("records", &self.records.to_string())
            .field("limit", &self.limit)
            .field("step", &self.step)
            .field("resume", &self.resume)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Collector`].
///
/// `build` rejects construction while any required collaborator is missing.
pub struct CollectorBuilder {
    client: Option<Box<dyn QueryClient>>,
    query: Option<String>,
    generator: Option<CursorGenerator>,
    records: Option<AccessPath>,
    sink: Option<Box<dyn RecordSink>>,
    store: CursorStore,
    limit: usize,
    step: usize,
    step_variable: String,
    resume: bool,
}

impl CollectorBuilder {
    /// Create a builder with default step size and store
    pub fn new() -> Self {
        Self {
            client: None,
            query: None,
            generator: None,
            records: None,
            sink: None,
            store: CursorStore::default(),
            limit: 0,
            step: DEFAULT_STEP,
            step_variable: STEP_VARIABLE.to_string(),
            resume: false,
        }
    }

    /// Set the query client
    #[must_use]
    pub fn client(mut self, client: Box<dyn QueryClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the query text
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the cursor generator
    #[must_use]
    pub fn cursor_generator(mut self, generator: CursorGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the path to the current page's record list
    #[must_use]
    pub fn records_path(mut self, records: AccessPath) -> Self {
        self.records = Some(records);
        self
    }

    /// Set the per-record sink
    #[must_use]
    pub fn sink(mut self, sink: Box<dyn RecordSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the cursor store used for resume and failure persistence
    #[must_use]
    pub fn store(mut self, store: CursorStore) -> Self {
        self.store = store;
        self
    }

    /// Set the record ceiling (0 = unbounded)
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page size
    #[must_use]
    pub fn step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Override the page-size variable name
    #[must_use]
    pub fn step_variable(mut self, name: impl Into<String>) -> Self {
        self.step_variable = name.into();
        self
    }

    /// Start from the persisted cursor position instead of the first page
    #[must_use]
    pub fn resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Assemble the collector
    pub fn build(self) -> Result<Collector> {
        Ok(Collector {
            client: self
                .client
                .ok_or_else(|| Error::collector("'client' not set"))?,
            query: self.query.ok_or_else(|| Error::collector("'query' not set"))?,
            generator: self
                .generator
                .ok_or_else(|| Error::collector("'cursor_generator' not set"))?,
            records: self
                .records
                .ok_or_else(|| Error::collector("'records_path' not set"))?,
            sink: self.sink.ok_or_else(|| Error::collector("'sink' not set"))?,
            store: self.store,
            limit: self.limit,
            step: self.step,
            step_variable: self.step_variable,
            resume: self.resume,
            state: RunState::Idle,
            stats: RunStats::default(),
        })
    }
}

impl Default for CollectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
