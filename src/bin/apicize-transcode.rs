use std::path::PathBuf;
use std::process::ExitCode;

use apicize_transcode::{
    ApicizeError, BatchOutcome, SerializationOperation, TranscoderSettings, Workbook,
    compare_workbooks, export_workbook, import_project_batch, open_data_text, read_project,
    validate_batch, write_project,
};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("apicize-transcode")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert Apicize workbooks to and from editable TypeScript test projects")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Transcoder settings JSON file"),
        )
        .subcommand(
            Command::new("export")
                .about("Generate a test project from a workbook")
                .arg(
                    Arg::new("workbook")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Workbook to export"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Project directory to write"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Rebuild a workbook from a test project")
                .arg(
                    Arg::new("project")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Project directory to read"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Workbook file to write"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check workbook structure")
                .arg(
                    Arg::new("workbooks")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Workbooks to validate"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare a candidate workbook against a reference")
                .arg(
                    Arg::new("reference")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("candidate")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
}

fn path_arg(args: &ArgMatches, name: &str) -> Result<PathBuf, ApicizeError> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| ApicizeError::Error {
            description: format!("{name} is required"),
        })
}

fn export(args: &ArgMatches, settings: &TranscoderSettings) -> Result<bool, ApicizeError> {
    let workbook_file = path_arg(args, "workbook")?;
    let output = path_arg(args, "output")?;
    let workbook = Workbook::open(&workbook_file)?;
    let project = export_workbook(&workbook, &settings.export)?;
    let saved = write_project(&output, &project)?;
    let changed = saved
        .iter()
        .filter(|s| s.operation != SerializationOperation::Unchanged)
        .count();
    println!(
        "Exported {} file(s) to {} ({} changed)",
        saved.len(),
        output.to_string_lossy(),
        changed
    );
    Ok(true)
}

async fn import(args: &ArgMatches, settings: &TranscoderSettings) -> Result<bool, ApicizeError> {
    let project = path_arg(args, "project")?;
    let output = path_arg(args, "output")?;
    let sources = read_project(&project)?;
    let report = import_project_batch(&sources, &settings.import_options(), &settings.batch).await;

    for unit in &report.units {
        for warning in &unit.warnings {
            match warning.position {
                Some(position) => println!("warning: {}:{}: {}", unit.file_name, position, warning.message),
                None => println!("warning: {}: {}", unit.file_name, warning.message),
            }
        }
        for err in &unit.errors {
            println!("error: {}: {}", unit.file_name, err);
        }
    }

    report.workbook.save(&output)?;
    let (groups, requests) = report.workbook.count_entries();
    println!(
        "Imported {} group(s) and {} request(s) into {}",
        groups,
        requests,
        output.to_string_lossy()
    );
    Ok(report.success)
}

async fn validate(args: &ArgMatches, settings: &TranscoderSettings) -> Result<bool, ApicizeError> {
    let mut documents = Vec::new();
    let mut success = true;
    for file_name in args.get_many::<PathBuf>("workbooks").into_iter().flatten() {
        match open_data_text(file_name) {
            Ok(opened) => documents.push((opened.file_name, opened.data)),
            Err(err) => {
                success = false;
                println!("{}", ApicizeError::from(err));
            }
        }
    }

    let report = validate_batch(documents, &settings.batch).await;
    for item in &report.items {
        match &item.outcome {
            BatchOutcome::Completed(_) => println!("{}: valid", item.name),
            BatchOutcome::Failed(ApicizeError::Structural(structural)) => {
                println!("{}: {} violation(s)", item.name, structural.violations.len());
                for violation in &structural.violations {
                    println!("  {violation}");
                }
            }
            BatchOutcome::Failed(err) => println!("{}: {}", item.name, err),
            BatchOutcome::Cancelled => println!("{}: cancelled", item.name),
        }
    }
    Ok(success && report.success)
}

fn diff(args: &ArgMatches) -> Result<bool, ApicizeError> {
    let reference = Workbook::open(&path_arg(args, "reference")?)?;
    let candidate = Workbook::open(&path_arg(args, "candidate")?)?;
    let report = compare_workbooks(&reference, &candidate)?;

    if args.get_flag("json") {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|err| ApicizeError::from_serde(err, "diff report"))?;
        println!("{text}");
    } else {
        for difference in &report.differences {
            println!("{:?} {}", difference.kind, difference.path);
        }
        println!(
            "Accuracy: {:.2}% ({} of {} fields match)",
            report.accuracy, report.matching_leaves, report.total_leaves
        );
    }
    Ok(report.is_identical())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let settings = match matches.get_one::<PathBuf>("config") {
        Some(file_name) => TranscoderSettings::open(file_name, false),
        None => Ok(TranscoderSettings::default()),
    };

    let result = match settings {
        Ok(settings) => match matches.subcommand() {
            Some(("export", args)) => export(args, &settings),
            Some(("import", args)) => import(args, &settings).await,
            Some(("validate", args)) => validate(args, &settings).await,
            Some(("diff", args)) => diff(args),
            _ => Err(ApicizeError::Error {
                description: "unknown command".to_string(),
            }),
        },
        Err(err) => Err(err),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
