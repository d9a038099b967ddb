use anyhow::{Context as _, Result};
use colored::Colorize;
use preflight::{BatchCheckResponse, BatchOrchestrator, CheckRegistry, build_report};

use crate::Context;
use crate::app::App;
use crate::cli::VerifyArgs;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, args: VerifyArgs) -> Result<()> {
    let app = App::new(ctx)?;
    let topology = app.load_topology()?;
    let registry = app.registry();

    let requested: Vec<String> = if args.checks.is_empty() {
        registry.ids().into_iter().map(String::from).collect()
    } else {
        args.checks
    };
    log::debug!("requested checks: {}", requested.join(", "));

    let run_ctx = app.run_context(topology);
    let pb = (!args.json && !ctx.quiet).then(|| progress::spinner("Running checks..."));
    let results = BatchOrchestrator::new(&registry).run_batch(&requested, &run_ctx);
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }

    let response = build_report(results, &run_ctx.topology);

    if args.json {
        let json = serde_json::to_string_pretty(&response).context("Failed to serialize report")?;
        println!("{json}");
        return Ok(());
    }

    print_report(&response, &check_legend(&registry, &requested));
    Ok(())
}

/// Description of each requested check that is registered, in request order
fn check_legend(registry: &CheckRegistry, requested: &[String]) -> Vec<(String, &'static str)> {
    let mut legend: Vec<(String, &'static str)> = Vec::new();
    for id in requested {
        if legend.iter().any(|(seen, _)| seen == id) {
            continue;
        }
        if let Some(check) = registry.resolve(id) {
            legend.push((id.clone(), check.description()));
        }
    }
    legend
}

fn print_report(response: &BatchCheckResponse, legend: &[(String, &'static str)]) {
    ui::header("Preflight Checks");

    for (id, description) in legend {
        ui::kv(id, description);
    }

    if response.result.is_empty() {
        ui::warn("No results: none of the requested checks is available");
        return;
    }

    for node in &response.result {
        let kind = if node.node_type.is_empty() {
            String::new()
        } else {
            format!(" [{}]", node.node_type)
        };
        ui::section(&format!("{}{}", node.ip, kind.dimmed()));
        for test in &node.tests {
            println!("  {}  {:<26} {}", ui::status_label(test.status), test.check, test.message);
        }
    }

    let summary = response.summary();
    println!();
    let line = format!(
        "{} passed, {} failed, {} skipped",
        summary.passed, summary.failed, summary.skipped
    );
    if summary.is_success() {
        ui::success(&line);
    } else {
        ui::error(&line);
    }
}
