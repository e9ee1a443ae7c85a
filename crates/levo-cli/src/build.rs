//! Build command implementation for levo CLI.
//!
//! Runs the full pipeline and reports progress on stderr.

use std::path::Path;
use std::time::{Duration, Instant};

use levo_core::{
    BuildReport, Error, InterfaceDescription, Pipeline, PipelineConfig, PipelineObserver,
    ProcessInvoker, Stage,
};

use crate::colors;

/// Prints one line per stage as the pipeline advances.
struct TerminalProgress;

impl PipelineObserver for TerminalProgress {
    fn on_stage_started(&self, stage: Stage) {
        eprint!("{}  ◆ {:<10}{} ... ", colors::BLUE, stage, colors::RESET);
        colors::flush_stderr();
    }

    fn on_stage_completed(&self, _stage: Stage, artifact: &Path, elapsed: Duration) {
        eprintln!(
            "{}✓{} {}{} ({:.2}s){}",
            colors::GREEN,
            colors::RESET,
            colors::DIM,
            artifact.display(),
            elapsed.as_secs_f64(),
            colors::RESET
        );
    }

    fn on_stage_failed(&self, _stage: Stage, _error: &Error) {
        eprintln!("{}✗{}", colors::RED, colors::RESET);
    }

    fn on_interface(&self, description: &InterfaceDescription) {
        for line in description.to_string().lines() {
            eprintln!("      {}{}{}", colors::DIM, line, colors::RESET);
        }
    }
}

/// Build and publish the guest component.
pub fn execute(config: PipelineConfig, json: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    eprintln!(
        "\n{}levo{} - Building {}{}{} ({}, {})\n",
        colors::BOLD,
        colors::RESET,
        colors::CYAN,
        config.package,
        colors::RESET,
        config.target_triple,
        config.profile
    );

    let mut pipeline =
        Pipeline::new(config, ProcessInvoker::new()).with_observer(Box::new(TerminalProgress));
    let report = pipeline.run()?;

    print_summary(&report, start.elapsed());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn print_summary(report: &BuildReport, elapsed: Duration) {
    let published = &report.published;
    eprintln!();
    eprintln!(
        "{}Published:{} {}",
        colors::GREEN,
        colors::RESET,
        published.path.display()
    );
    eprintln!(
        "{}Size:{} {} bytes ({:.0}% of {} byte component)",
        colors::DIM,
        colors::RESET,
        published.compressed_bytes,
        published.ratio() * 100.0,
        published.component_bytes
    );
    eprintln!(
        "{}Time:{} {:.2}s",
        colors::DIM,
        colors::RESET,
        elapsed.as_secs_f64()
    );
}
