//! Savings Calculator CLI
//!
//! Validates inputs exactly as the HTTP API does and prints the projection

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use savings_calculator::{validate, Limits, ProjectionEngine, RawInput};

#[derive(Parser, Debug)]
#[command(name = "savings-calc", about = "Project compound growth of regular savings.")]
struct Args {
    /// Starting balance
    #[arg(long)]
    initial_savings: String,

    /// Amount deposited at the start of every month
    #[arg(long)]
    monthly_deposit: String,

    /// Annual interest rate in percent (5 = 5%)
    #[arg(long)]
    interest_rate: String,

    /// Whole number of years to project
    #[arg(long)]
    years: String,

    /// Print the full response as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Also write the monthly breakdown to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let input = RawInput::from_values(
        args.initial_savings.as_str(),
        args.monthly_deposit.as_str(),
        args.interest_rate.as_str(),
        args.years.as_str(),
    );

    let engine = ProjectionEngine::new(Limits::default());
    let params = match validate(&input, engine.limits()) {
        Ok(params) => params,
        Err(err) => {
            let body = err.to_body();
            eprintln!("{}", serde_json::to_string_pretty(&body)?);
            std::process::exit(1);
        }
    };
    let response = engine.project(&params)?;

    if let Some(path) = &args.csv {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        for row in &response.monthly_results {
            writer.serialize(row)?;
        }
        writer.flush()?;
        log::info!("Wrote {} monthly rows to {}", response.monthly_results.len(), path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let summary = &response.summary;
    println!("Savings Projection ({} years)", summary.years);
    println!("==========================\n");
    println!("  Initial investment:    ${:>14.2}", summary.initial_investment);
    println!("  Total deposited:       ${:>14.2}", summary.total_deposited);
    println!("  Total interest earned: ${:>14.2}", summary.total_interest_earned);
    println!("  Final balance:         ${:>14.2}", summary.final_balance);
    println!();

    println!("{:>5} {:>16} {:>16} {:>14} {:>9}", "Year", "Start", "End", "Growth", "Growth%");
    println!("{}", "-".repeat(64));
    for year in &response.yearly_results {
        let pct = year
            .growth_percentage
            .map(|p| format!("{:.2}", p))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:>5} {:>16.2} {:>16.2} {:>14.2} {:>9}",
            year.year, year.start_balance, year.end_balance, year.growth, pct
        );
    }

    if let Some(path) = &args.csv {
        println!("\nMonthly breakdown written to: {}", path.display());
    }

    Ok(())
}
