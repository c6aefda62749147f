mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use apicize_transcode::{
    ApicizeError, BatchOptions, BatchOutcome, ExportOptions, ImportOptions, ParserOptions,
    export_batch, export_workbook, import_project, import_project_batch, parse_batch, run_batch,
    validate_batch,
};
use pretty_assertions::assert_eq;

fn options(max_concurrency: usize) -> BatchOptions {
    BatchOptions {
        max_concurrency,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_results_follow_input_order() {
    let inputs = (0..8u64)
        .map(|n| (format!("item-{n}"), n))
        .collect::<Vec<(String, u64)>>();
    let report = run_batch(inputs, &options(4), |n| {
        // Later items finish first
        std::thread::sleep(Duration::from_millis(40 - n * 5));
        Ok(n * 10)
    })
    .await;

    assert!(report.success);
    let names = report
        .items
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(
        names,
        (0..8).map(|n| format!("item-{n}")).collect::<Vec<String>>()
    );
    for (n, item) in report.items.iter().enumerate() {
        match &item.outcome {
            BatchOutcome::Completed(value) => assert_eq!(*value, n as u64 * 10),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let inputs = (0..12)
        .map(|n| (n.to_string(), ()))
        .collect::<Vec<(String, ())>>();

    let (work_active, work_peak) = (active.clone(), peak.clone());
    let report = run_batch(inputs, &options(2), move |_| {
        let now = work_active.fetch_add(1, Ordering::SeqCst) + 1;
        work_peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(10));
        work_active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    })
    .await;

    assert!(report.success);
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_failures_do_not_stop_other_items() {
    let inputs = vec![
        ("ok".to_string(), true),
        ("bad".to_string(), false),
        ("also ok".to_string(), true),
    ];
    let report = run_batch(inputs, &options(2), |ok| {
        if ok {
            Ok("done")
        } else {
            Err(ApicizeError::Error {
                description: "failed on purpose".to_string(),
            })
        }
    })
    .await;

    assert!(!report.success);
    assert!(report.items[0].outcome.is_completed());
    assert!(matches!(report.items[1].outcome, BatchOutcome::Failed(_)));
    assert!(report.items[2].outcome.is_completed());
}

#[tokio::test]
async fn test_cancellation_before_start() {
    let options = options(2);
    options.cancellation.cancel();
    let inputs = vec![("a".to_string(), 1), ("b".to_string(), 2)];
    let report = run_batch(inputs, &options, Ok).await;
    assert!(!report.success);
    assert_eq!(report.items.len(), 2);
    assert!(
        report
            .items
            .iter()
            .all(|i| matches!(i.outcome, BatchOutcome::Cancelled))
    );
}

#[tokio::test]
async fn test_cancellation_stops_undispatched_items() {
    let options = options(1);
    let token = options.cancellation.clone();
    let inputs = (0..5)
        .map(|n| (n.to_string(), n))
        .collect::<Vec<(String, usize)>>();
    let report = run_batch(inputs, &options, move |n| {
        if n == 0 {
            token.cancel();
            std::thread::sleep(Duration::from_millis(20));
        }
        Ok(n)
    })
    .await;

    assert!(report.items[0].outcome.is_completed());
    assert!(matches!(report.items[4].outcome, BatchOutcome::Cancelled));
    assert_eq!(report.items.len(), 5);
    assert!(!report.success);
}

#[tokio::test]
async fn test_empty_batch() {
    let report = run_batch(Vec::<(String, ())>::new(), &options(2), Ok).await;
    assert!(report.success);
    assert!(report.items.is_empty());
}

#[tokio::test]
async fn test_export_batch_matches_sequential_export() {
    let workbook = common::sample_workbook();
    let export = ExportOptions::default();
    let report = export_batch(
        vec![
            ("one".to_string(), workbook.clone()),
            ("two".to_string(), workbook.clone()),
        ],
        &export,
        &options(2),
    )
    .await;
    let expected = export_workbook(&workbook, &export).unwrap();
    assert!(report.success);
    for item in report.items {
        match item.outcome {
            BatchOutcome::Completed(project) => assert_eq!(project, expected),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_parse_batch_reports_each_unit() {
    let report = parse_batch(
        vec![
            ("good.spec.ts".to_string(), "describe('a', () => {});".to_string()),
            ("bad.spec.ts".to_string(), "describe('a', () => {".to_string()),
        ],
        &ParserOptions::default(),
        &options(2),
    )
    .await;
    assert!(!report.success);
    match &report.items[0].outcome {
        BatchOutcome::Completed(unit) => assert_eq!(unit.top_level.len(), 1),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(
        report.items[1].outcome,
        BatchOutcome::Failed(ApicizeError::Parse(_))
    ));
}

#[tokio::test]
async fn test_validate_batch() {
    let good = serde_json::to_string(&common::sample_workbook()).unwrap();
    let report = validate_batch(
        vec![
            ("good.json".to_string(), good),
            ("bad.json".to_string(), "{\"version\": 1.0}".to_string()),
        ],
        &options(2),
    )
    .await;
    match &report.items[0].outcome {
        BatchOutcome::Completed(workbook) => assert_eq!(*workbook, common::sample_workbook()),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(
        report.items[1].outcome,
        BatchOutcome::Failed(ApicizeError::Structural(_))
    ));
}

#[tokio::test]
async fn test_import_batch_matches_sequential_import() {
    let workbook = common::sample_workbook();
    let sources = export_workbook(&workbook, &ExportOptions::default())
        .unwrap()
        .to_sources();
    let sequential = import_project(&sources, &ImportOptions::default());
    let batched = import_project_batch(&sources, &ImportOptions::default(), &options(4)).await;
    assert!(batched.success);
    assert_eq!(batched.workbook, sequential.workbook);
    assert_eq!(batched.workbook, workbook);
}
