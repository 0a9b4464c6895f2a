use std::process;

use clap::Parser;

use spoiltracker::{
    batch,
    cli::{
        output::{self, OutputPreferences},
        Cli,
    },
    config::{ConfigManager, TrackerConfig},
    errors::TrackerError,
    init,
    tracker::{RunReport, TrackerOrchestrator},
};

fn main() {
    init();
    let cli = Cli::parse();
    output::set_preferences(OutputPreferences {
        quiet_mode: cli.quiet,
        plain_mode: cli.plain,
    });

    if let Err(err) = run(&cli) {
        output::error(err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), TrackerError> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_config_file(path.clone()),
        None => ConfigManager::new()?,
    };
    let config = load_config(cli, &manager)?;
    if cli.save_config {
        manager.save(&config)?;
        output::success(format!("Configuration saved to {}", manager.path().display()));
    }

    let mut options = cli.run_options(config.default_days);
    options.report_dest = options
        .report_dest
        .map(|dest| manager.resolve_path(&dest));
    let tracker = TrackerOrchestrator::with_system_clock(config);

    let runs = match &cli.batch_dir {
        Some(dir) => {
            let plan = batch::discover(dir)?;
            for skipped in &plan.skipped {
                output::warning(format!(
                    "Skipping '{}': file name is not a YYYY-MM-DD date.",
                    skipped.display()
                ));
            }
            tracker.run_batch(&plan, &options)
        }
        None => vec![tracker.run(&options)],
    };

    for run in &runs {
        present(run);
    }
    Ok(())
}

/// Loads the config file and applies path and threshold overrides from flags.
fn load_config(cli: &Cli, manager: &ConfigManager) -> Result<TrackerConfig, TrackerError> {
    let mut config = manager.load()?;
    if let Some(history) = &cli.history_file {
        config.history_file = manager.resolve_path(history);
    }
    if let Some(shelf_life) = &cli.shelf_life_file {
        config.shelf_life_file = manager.resolve_path(shelf_life);
    }
    if let Some(days) = cli.days {
        config.default_days = days;
    }
    Ok(config)
}

fn present(run: &RunReport) {
    for diagnostic in &run.diagnostics {
        output::error(diagnostic);
    }
    if !run.ingested.is_empty() {
        output::info(format!(
            "Recorded {} expiration date(s) in the history ledger.",
            run.ingested.len()
        ));
    }
    if let Some(rendered) = &run.rendered {
        output::info(&rendered.text);
        if let Some(path) = &rendered.path {
            output::info(format!("Report table written to {}", path.display()));
        }
    }
    for confirmation in &run.confirmations {
        output::success(confirmation);
    }
}
