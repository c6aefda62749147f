//! Batch submodule
//!
//! Runs independent per-item work (export, parse, validate) on blocking tasks,
//! bounded by a semaphore.  Results are always reported in input order.
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::select;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::transcode::importer::{ImportPlan, missing_unit};
use crate::{
    ApicizeError, ExportOptions, ExportedProject, ImportOptions, ImportReport, ParsedUnit,
    ParserOptions, ProjectSources, SourceParser, Workbook, export_workbook,
};

fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}

/// Batch execution settings
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    /// Maximum number of items processed at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Stops dispatch of items not yet started
    #[serde(skip)]
    pub cancellation: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            cancellation: CancellationToken::new(),
        }
    }
}

/// Outcome of one batch item
#[derive(Serialize, Debug)]
#[serde(tag = "status", content = "result", rename_all = "camelCase")]
pub enum BatchOutcome<T> {
    Completed(T),
    Failed(ApicizeError),
    /// Not started because the batch was cancelled
    Cancelled,
}

impl<T> BatchOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, BatchOutcome::Completed(_))
    }
}

/// Named batch item outcome
#[derive(Serialize, Debug)]
pub struct BatchItem<T> {
    pub name: String,
    pub outcome: BatchOutcome<T>,
}

/// Outcomes for every item, in input order
#[derive(Serialize, Debug)]
pub struct BatchReport<T> {
    pub items: Vec<BatchItem<T>>,
    /// True if every item completed
    pub success: bool,
}

/// Run `work` over named inputs
pub async fn run_batch<I, T, F>(
    inputs: Vec<(String, I)>,
    options: &BatchOptions,
    work: F,
) -> BatchReport<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Result<T, ApicizeError> + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));
    let mut names = Vec::with_capacity(inputs.len());
    let mut tasks: JoinSet<(usize, BatchOutcome<T>)> = JoinSet::new();
    let mut dispatched = 0;

    info!(items = inputs.len(), max_concurrency = options.max_concurrency, "Starting batch");

    let mut inputs = inputs.into_iter();
    for (index, (name, input)) in inputs.by_ref().enumerate() {
        let permit = select! {
            biased;
            _ = options.cancellation.cancelled() => None,
            permit = semaphore.clone().acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            names.push(name);
            break;
        };

        debug!(item = name.as_str(), "Dispatching batch item");
        names.push(name);
        dispatched += 1;

        let item_work = work.clone();
        tasks.spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                item_work(input)
            })
            .await;
            let outcome = match joined {
                Ok(Ok(result)) => BatchOutcome::Completed(result),
                Ok(Err(err)) => BatchOutcome::Failed(err),
                Err(err) => BatchOutcome::Failed(ApicizeError::Error {
                    description: format!("batch worker failed: {err}"),
                }),
            };
            (index, outcome)
        });
    }
    names.extend(inputs.map(|(name, _)| name));

    let mut outcomes = names.iter().map(|_| None).collect::<Vec<Option<BatchOutcome<T>>>>();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(err) => warn!("Batch task did not complete: {}", err),
        }
    }

    let items = names
        .into_iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (name, outcome))| {
            let outcome = match outcome {
                Some(outcome) => outcome,
                None if index < dispatched => BatchOutcome::Failed(ApicizeError::Error {
                    description: "batch worker did not report a result".to_string(),
                }),
                None => BatchOutcome::Cancelled,
            };
            BatchItem { name, outcome }
        })
        .collect::<Vec<BatchItem<T>>>();

    let success = items.iter().all(|item| item.outcome.is_completed());
    info!(items = items.len(), dispatched, success, "Completed batch");
    BatchReport { items, success }
}

/// Export several workbooks
pub async fn export_batch(
    workbooks: Vec<(String, Workbook)>,
    export: &ExportOptions,
    options: &BatchOptions,
) -> BatchReport<ExportedProject> {
    let export = export.clone();
    run_batch(workbooks, options, move |workbook| {
        export_workbook(&workbook, &export)
    })
    .await
}

/// Parse several units, given as (file name, text)
pub async fn parse_batch(
    units: Vec<(String, String)>,
    parser: &ParserOptions,
    options: &BatchOptions,
) -> BatchReport<ParsedUnit> {
    let parser = SourceParser::new(parser.clone());
    let inputs = units
        .into_iter()
        .map(|(name, text)| (name.clone(), (name, text)))
        .collect();
    run_batch(inputs, options, move |(name, text): (String, String)| {
        parser.parse_unit(&name, &text).map_err(ApicizeError::from)
    })
    .await
}

/// Validate and load several workbook documents, given as (file name, JSON text)
pub async fn validate_batch(
    documents: Vec<(String, String)>,
    options: &BatchOptions,
) -> BatchReport<Workbook> {
    let inputs = documents
        .into_iter()
        .map(|(name, text)| (name.clone(), (name, text)))
        .collect();
    run_batch(inputs, options, |(name, text): (String, String)| {
        Workbook::from_json(&name, &text)
    })
    .await
}

/// Import a project, parsing its units in parallel
pub async fn import_project_batch(
    sources: &ProjectSources,
    import: &ImportOptions,
    options: &BatchOptions,
) -> ImportReport {
    let parser = SourceParser::new(import.parser.clone());
    let plan = ImportPlan::new(&parser, sources);
    let inputs = plan
        .units
        .iter()
        .map(|unit| {
            let text = sources.get(&unit.path).map(String::from);
            (unit.path.clone(), (unit.path.clone(), text))
        })
        .collect();

    let report = run_batch(
        inputs,
        options,
        move |(path, text): (String, Option<String>)| match text {
            Some(text) => parser.parse_unit(&path, &text).map_err(ApicizeError::from),
            None => Err(missing_unit(&path)),
        },
    )
    .await;

    let parsed = report
        .items
        .into_iter()
        .map(|item| match item.outcome {
            BatchOutcome::Completed(unit) => Ok(unit),
            BatchOutcome::Failed(err) => Err(err),
            BatchOutcome::Cancelled => Err(ApicizeError::Cancelled),
        })
        .collect();
    plan.assemble(parsed)
}
