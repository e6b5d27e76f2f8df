//! Splitting an SFF container by adaptor
//!
//! A run reads the input in fixed-size buffers. Each buffer is matched in parallel,
//! then dispatched sequentially and in input order to one [`ContainerWriter`] per
//! adaptor name. Writers are opened lazily on the first record they receive, and their
//! common header is patched with the final record count once the input is exhausted.

use std::io::{BufRead, Seek, Write};

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::adaptors::AdaptorTable;
use crate::config::SplitConfig;
use crate::error::{CountError, Result, WriteError};
use crate::matcher::{AdaptorMatcher, UNMATCHED};
use crate::parallel::ordered_map;
use crate::reader::{ContainerReader, RecordSet};
use crate::writer::ContainerWriter;
use crate::CommonHeader;

/// Opens one output sink per adaptor name
pub trait SinkFactory {
    type Sink: Write + Seek;

    /// Creates the sink receiving every record classified as `name`
    fn create(&mut self, name: &str) -> Result<Self::Sink>;
}

impl<W, F> SinkFactory for F
where
    W: Write + Seek,
    F: FnMut(&str) -> Result<W>,
{
    type Sink = W;

    fn create(&mut self, name: &str) -> Result<W> {
        self(name)
    }
}

/// Stages of a split run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitState {
    #[default]
    Init,
    Reading,
    MatchingDispatching,
    Finalizing,
    Done,
    Failed,
}

/// A finalized output container
#[derive(Debug)]
pub struct SplitOutput<W> {
    /// Adaptor name (or [`UNMATCHED`])
    pub name: String,

    /// Number of records written, as patched into its common header
    pub records: usize,

    /// The flushed sink
    pub sink: W,
}

/// Summary of a completed run
#[derive(Debug)]
pub struct SplitReport<W> {
    /// Number of records read from the input
    pub total_records: usize,

    /// Number of records that matched no adaptor
    pub unmatched: usize,

    /// Outputs in the order they were first opened
    pub outputs: Vec<SplitOutput<W>>,
}
impl<W> SplitReport<W> {
    #[must_use]
    pub fn matched(&self) -> usize {
        self.total_records - self.unmatched
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&SplitOutput<W>> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

/// Writers opened so far along with the running counts
struct Dispatch<W: Write + Seek> {
    writers: IndexMap<String, ContainerWriter<W>>,
    total: usize,
    unmatched: usize,
}

/// Splits SFF containers into one container per adaptor
pub struct Splitter<F: SinkFactory> {
    table: AdaptorTable,
    config: SplitConfig,
    factory: F,
    state: SplitState,
}
impl<F: SinkFactory> Splitter<F> {
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::ConfigError) if the configuration is invalid.
    pub fn new(table: AdaptorTable, config: SplitConfig, factory: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table,
            config,
            factory,
            state: SplitState::Init,
        })
    }

    /// Stage the last run reached
    #[must_use]
    pub fn state(&self) -> SplitState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Splits one input container
    ///
    /// Any error aborts the run. Outputs already opened at that point still have
    /// their common header patched with the number of records they received.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The common header or a record cannot be decoded
    /// * An output cannot be opened or written
    /// * The input holds more or fewer records than its header declares
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<SplitReport<F::Sink>> {
        transition(&mut self.state, SplitState::Init);
        let mut reader = ContainerReader::new(input);
        let common = match reader.read_common_header() {
            Ok(common) => common,
            Err(err) => {
                transition(&mut self.state, SplitState::Failed);
                return Err(err);
            }
        };
        info!(
            "Common header: {} records, {} flows, key {}",
            common.nreads,
            common.flow_len,
            String::from_utf8_lossy(&common.key)
        );

        let mut dispatch = Dispatch {
            writers: IndexMap::new(),
            total: 0,
            unmatched: 0,
        };
        let result = self
            .process(&mut reader, &common, &mut dispatch)
            .and_then(|()| self.finalize(&common, dispatch.writers.drain(..)));

        match result {
            Ok(outputs) => {
                transition(&mut self.state, SplitState::Done);
                let report = SplitReport {
                    total_records: dispatch.total,
                    unmatched: dispatch.unmatched,
                    outputs,
                };
                log_report(&report);
                Ok(report)
            }
            Err(err) => {
                if !dispatch.writers.is_empty() {
                    warn!(
                        "Split aborted after {} records, finalizing {} open outputs",
                        dispatch.total,
                        dispatch.writers.len()
                    );
                    // each failing output is logged by patch_headers; `err` is still returned
                    if let Err(patch_err) = patch_headers(&common, dispatch.writers.iter_mut()) {
                        debug!("Abort finalization incomplete: {patch_err}");
                    }
                }
                transition(&mut self.state, SplitState::Failed);
                Err(err)
            }
        }
    }

    fn process<R: BufRead>(
        &mut self,
        reader: &mut ContainerReader<R>,
        common: &CommonHeader,
        dispatch: &mut Dispatch<F::Sink>,
    ) -> Result<()> {
        let expected = common.nreads as usize;
        let matcher = AdaptorMatcher::new(&self.table, self.config.max_mismatch)?;
        let mut buffer = RecordSet::with_capacity(self.config.buffer_capacity);

        loop {
            transition(&mut self.state, SplitState::Reading);
            let n_records = buffer.fill(reader, common)?;
            if n_records == 0 {
                break;
            }
            debug!("Buffered {n_records} records");

            transition(&mut self.state, SplitState::MatchingDispatching);
            let outcomes = ordered_map(buffer.records(), self.config.worker_count, |record| {
                matcher.classify(record)
            });

            for (record, outcome) in buffer.records().iter().zip(outcomes) {
                if dispatch.total >= expected {
                    return Err(CountError::TooManyRecords {
                        expected,
                        observed: dispatch.total + 1,
                    }
                    .into());
                }
                dispatch.total += 1;
                if !outcome.is_matched() {
                    dispatch.unmatched += 1;
                }

                let idx = match dispatch.writers.get_index_of(outcome.name()) {
                    Some(idx) => idx,
                    None => {
                        let writer = open_writer(&mut self.factory, outcome.name(), common)?;
                        dispatch
                            .writers
                            .insert_full(outcome.name().to_string(), writer)
                            .0
                    }
                };
                dispatch.writers[idx].write_record(record)?;
            }
        }

        if dispatch.total < expected {
            return Err(CountError::TooFewRecords {
                expected,
                observed: dispatch.total,
            }
            .into());
        }
        Ok(())
    }

    fn finalize(
        &mut self,
        common: &CommonHeader,
        writers: impl Iterator<Item = (String, ContainerWriter<F::Sink>)>,
    ) -> Result<Vec<SplitOutput<F::Sink>>> {
        transition(&mut self.state, SplitState::Finalizing);
        let mut writers: Vec<_> = writers.collect();
        patch_headers(common, writers.iter_mut().map(|(name, writer)| (&*name, writer)))?;

        writers
            .into_iter()
            .map(|(name, writer)| {
                let records = writer.written_count();
                Ok(SplitOutput {
                    name,
                    records,
                    sink: writer.finish()?,
                })
            })
            .collect()
    }
}

fn transition(state: &mut SplitState, next: SplitState) {
    debug!("Split state: {state:?} -> {next:?}");
    *state = next;
}

/// Creates the sink for `name` and writes the provisional common header
fn open_writer<F: SinkFactory>(
    factory: &mut F,
    name: &str,
    common: &CommonHeader,
) -> Result<ContainerWriter<F::Sink>> {
    debug!("Opening output for {name}");
    let sink = factory
        .create(name)
        .map_err(|source| WriteError::SinkUnavailable {
            name: name.to_string(),
            source: Box::new(source),
        })?;
    let mut writer = ContainerWriter::new(sink);
    writer.write_common_header(common)?;
    Ok(writer)
}

/// Rewrites each writer's common header with its own record count
///
/// Every writer is attempted even if an earlier one fails; the first failure is returned.
fn patch_headers<'a, W: Write + Seek + 'a>(
    common: &CommonHeader,
    writers: impl Iterator<Item = (&'a String, &'a mut ContainerWriter<W>)>,
) -> Result<()> {
    let mut first_error = None;
    for (name, writer) in writers {
        let patched = common.with_nreads(writer.written_count() as u32);
        if let Err(err) = writer
            .write_common_header(&patched)
            .and_then(|()| writer.flush())
        {
            warn!("Unable to finalize output {name}: {err}");
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn log_report<W>(report: &SplitReport<W>) {
    info!("Total reads: {}", report.total_records);
    info!("Unmatched: {}", report.unmatched);
    info!("Matched: {}", report.matched());
    for output in report.outputs.iter().filter(|o| o.name != UNMATCHED) {
        info!("  {}: {}", output.name, output.records);
    }
}
