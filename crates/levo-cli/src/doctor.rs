//! Doctor command: check tools and inputs without building.

use levo_core::{PipelineConfig, ProcessInvoker, ToolchainCheck};

use crate::colors;

pub fn execute(config: &PipelineConfig) -> anyhow::Result<()> {
    let invoker = ProcessInvoker::new();
    let report = ToolchainCheck::new(config, &invoker).run();

    for item in &report.items {
        let (color, mark) = if item.ok {
            (colors::GREEN, "✓")
        } else {
            (colors::RED, "✗")
        };
        eprintln!(
            "  {}{}{} {:<20} {}{}{}",
            color,
            mark,
            colors::RESET,
            item.name,
            colors::DIM,
            item.detail,
            colors::RESET
        );
    }

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{} check(s) failed", failed);
    }

    eprintln!("\n{}Ready to build.{}", colors::GREEN, colors::RESET);
    Ok(())
}
