use crate::infra::build_service;
use clap::Args;
use eligibility::config::AppConfig;
use eligibility::engine::{Passed, ResultInfo, VisitStatus};
use eligibility::error::AppError;
use eligibility::sources::SourceId;
use eligibility::{EligibilityReport, EligibilityRequest, EventCatalog};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct CheckArgs {
    /// Username to check
    #[arg(long)]
    pub(crate) user: String,
    /// Event id from the catalog (see `events`)
    #[arg(long)]
    pub(crate) event: String,
    /// Only look at this source
    #[arg(long)]
    pub(crate) source: Option<String>,
    /// Account data snapshot; defaults to ELIGIBILITY_DATA_PATH
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct EventsArgs {
    /// Only list events from this year
    #[arg(long)]
    pub(crate) year: Option<i32>,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with a `username` column
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Event id from the catalog
    #[arg(long)]
    pub(crate) event: String,
    /// Account data snapshot; defaults to ELIGIBILITY_DATA_PATH
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Write results here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config.evaluation, args.data.as_deref())?;

    let mut request = EligibilityRequest::new(args.user, args.event);
    if let Some(source) = args.source {
        request = request.on_source(SourceId::new(source));
    }
    let report = service.check(&request)?;

    if args.json {
        serde_json::to_writer_pretty(io::stdout().lock(), &report).map_err(io::Error::from)?;
        println!();
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) fn run_events(args: EventsArgs) -> Result<(), AppError> {
    let catalog = EventCatalog::builtin()?;

    for event in catalog
        .events()
        .iter()
        .filter(|event| args.year.map_or(true, |year| event.year == year))
    {
        let summary = event.summary();
        println!("{} ({})", summary.name, summary.id);
        println!("  {}", summary.url);
        if let Some(source) = &summary.required_source {
            println!("  Checked on {source} only");
        }
        for requirement in &summary.requirements {
            println!("  - {requirement}");
        }
        for extra in &summary.extra_requirements {
            println!("  - {extra} (checked by hand)");
        }
        println!();
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let service = build_service(&config.evaluation, args.data.as_deref())?;
    let input = BufReader::new(File::open(&args.input)?);

    let summary = match &args.output {
        Some(path) => {
            let output = BufWriter::new(File::create(path)?);
            service.check_batch(&args.event, input, output)?
        }
        None => service.check_batch(&args.event, input, io::stdout().lock())?,
    };

    eprintln!(
        "Checked {} account(s): {} eligible, {} not eligible, {} need review, {} inconclusive, {} invalid",
        summary.checked,
        summary.eligible,
        summary.not_eligible,
        summary.needs_review,
        summary.inconclusive,
        summary.invalid
    );
    Ok(())
}

fn passed_label(result: &ResultInfo) -> &'static str {
    match result.passed() {
        Passed::Pass => "pass",
        Passed::SoftPass => "review",
        Passed::Fail => "fail",
    }
}

fn status_label(status: &VisitStatus) -> String {
    match status {
        VisitStatus::Evaluated => "evaluated".to_string(),
        VisitStatus::SkippedClosed => "skipped (closed)".to_string(),
        VisitStatus::NoLocalAccount => "skipped (no local account)".to_string(),
        VisitStatus::Unreachable { error } => format!("skipped ({error})"),
    }
}

fn render_report(report: &EligibilityReport) {
    let evaluation = &report.evaluation;
    println!("{} ({})", report.event.name, report.event.id);
    println!("Account: {}", evaluation.subject);
    println!("Result: {}", report.summary);

    if !evaluation.trace.is_empty() {
        println!("\nSources");
        for visit in &evaluation.trace {
            println!("- {}: {}", visit.domain, status_label(&visit.status));
            for result in &visit.results {
                println!("    [{}] {}", passed_label(result), result.message());
            }
        }
    }

    if !evaluation.conclusion.is_empty() {
        println!("\nAfter all sources");
        for result in &evaluation.conclusion {
            println!("    [{}] {}", passed_label(result), result.message());
        }
    }

    if !evaluation.standings.is_empty() {
        println!("\nRequirements");
        for standing in &evaluation.standings {
            match &standing.result {
                Some(result) => println!(
                    "- [{}] {}: {}",
                    passed_label(result),
                    standing.requirement,
                    result.message()
                ),
                None => println!("- [open] {}: not evaluated", standing.requirement),
            }
        }
    }

    if !report.event.extra_requirements.is_empty() {
        println!("\nAlso required (checked by hand)");
        for extra in &report.event.extra_requirements {
            println!("- {extra}");
        }
    }
}
