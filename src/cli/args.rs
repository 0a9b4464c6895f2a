use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::{ledger::parse_date, tracker::RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "spoiltracker",
    version,
    about = "Track perishable product expiration dates"
)]
pub struct Cli {
    #[arg(help = "CSV file containing SKUs")]
    pub csv_file: Option<PathBuf>,
    #[arg(value_parser = parse_production_date, help = "Production date (YYYY-MM-DD)")]
    pub production_date: Option<NaiveDate>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Threshold for number of days until expiration [default: 3]"
    )]
    pub days: Option<i64>,
    #[arg(
        long,
        help = "Remove reported entries from the history file and clear the expiry report"
    )]
    pub remove_expired: bool,
    #[arg(long, help = "Clear the history file")]
    pub clear_history: bool,
    #[arg(long, help = "Regenerate the report and display it as a table")]
    pub display: bool,
    #[arg(long, help = "Directory of YYYY-MM-DD.csv source files to process in date order")]
    pub batch_dir: Option<PathBuf>,
    #[arg(
        long,
        help = "Destination file for the expiry report, relative to the config directory"
    )]
    pub expiry_report_dest: Option<PathBuf>,
    #[arg(long, help = "History ledger file, relative to the config directory")]
    pub history_file: Option<PathBuf>,
    #[arg(long, help = "Shelf-life table file, relative to the config directory")]
    pub shelf_life_file: Option<PathBuf>,
    #[arg(
        long,
        help = "Configuration file [default: $SPOILTRACKER_HOME/spoiltracker.json, else ./spoiltracker.json]"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        help = "Write the effective file locations and --days back to the configuration file"
    )]
    pub save_config: bool,
    #[arg(long, help = "Only print diagnostics")]
    pub quiet: bool,
    #[arg(long, help = "Disable colored output")]
    pub plain: bool,
}

impl Cli {
    pub fn run_options(&self, default_days: i64) -> RunOptions {
        let mut options = RunOptions::new(self.days.unwrap_or(default_days));
        options.source = self.csv_file.clone();
        options.production_date = self.production_date;
        options.remove_expired = self.remove_expired;
        options.clear_history = self.clear_history;
        options.display = self.display;
        options.report_dest = self.expiry_report_dest.clone();
        options
    }
}

fn parse_production_date(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|err| err.to_string())
}
