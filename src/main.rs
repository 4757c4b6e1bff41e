//! BTR Model CLI
//!
//! - `btr-model project` - project the base case and print annual cash flows
//! - `btr-model sweep --cap-rates 0.05,0.055,0.06` - exit cap rate sensitivity
//! - `btr-model report` - printable report data as JSON

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use btr_model::assumptions::{load_assumptions, DEFAULT_ASSUMPTIONS_PATH};
use btr_model::report::write_cashflows_csv;
use btr_model::{Assumptions, ExitStrategy, ProjectionResult, ReportData, ScenarioRunner};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(name = "btr-model")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Assumptions file (.json or field,value .csv)
    #[arg(short, long, global = true)]
    assumptions: Option<PathBuf>,

    /// Override the hold period in years
    #[arg(long, global = true)]
    hold_years: Option<u32>,

    /// Override the exit strategy (portfolio, individual)
    #[arg(long, global = true)]
    exit_strategy: Option<ExitStrategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project annual cash flows, exit and returns
    Project {
        /// Write annual records to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Portfolio exit sensitivity to the exit cap rate
    Sweep {
        #[arg(long, value_delimiter = ',', default_value = "0.045,0.05,0.055,0.06,0.065")]
        cap_rates: Vec<f64>,
    },

    /// Build printable report data for both exit strategies
    Report {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let assumptions = resolve_assumptions(&cli)?;
    let runner = ScenarioRunner::new(assumptions);

    match cli.command {
        Commands::Project { csv, json } => run_project(&runner, csv.as_deref(), json),
        Commands::Sweep { cap_rates } => run_sweep(&runner, &cap_rates),
        Commands::Report { output } => run_report(&runner, output.as_deref()),
    }
}

/// Explicit file, then the default file if present, then built-in defaults;
/// command-line overrides are applied last
fn resolve_assumptions(cli: &Cli) -> Result<Assumptions> {
    let mut assumptions = match &cli.assumptions {
        Some(path) => load_assumptions(path).with_context(|| format!("loading {}", path.display()))?,
        None if Path::new(DEFAULT_ASSUMPTIONS_PATH).exists() => load_assumptions(DEFAULT_ASSUMPTIONS_PATH)
            .with_context(|| format!("loading {}", DEFAULT_ASSUMPTIONS_PATH))?,
        None => {
            info!("no assumptions file, using built-in base case");
            Assumptions::default()
        }
    };

    if let Some(years) = cli.hold_years {
        assumptions = assumptions.with_hold_period(years);
    }
    if let Some(strategy) = cli.exit_strategy {
        assumptions = assumptions.with_exit_strategy(strategy);
    }
    Ok(assumptions)
}

fn run_project(runner: &ScenarioRunner, csv: Option<&Path>, json: bool) -> Result<()> {
    let result = runner.run()?;

    if json {
        serde_json::to_writer_pretty(io::stdout().lock(), &result)?;
        println!();
    } else {
        print_projection(runner.assumptions(), &result);
    }

    if let Some(path) = csv {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_cashflows_csv(file, &result.cash_flows)?;
        println!("\nAnnual cash flows written to: {}", path.display());
    }
    Ok(())
}

fn print_projection(assumptions: &Assumptions, result: &ProjectionResult) {
    let acq = &result.acquisition_summary;

    println!("BTR Model v{}", env!("CARGO_PKG_VERSION"));
    println!("==============\n");
    println!("Portfolio: {} homes", acq.total_homes);
    println!("  Acquisition Cost: ${:.2}", acq.total_acquisition_cost);
    println!("  Loan Amount: ${:.2} ({:.0}% LTV)", acq.loan_amount, acq.loan_to_value * 100.0);
    println!("  Equity Required: ${:.2}", acq.equity_required);
    println!("  Annual Debt Service: ${:.2}", acq.annual_interest_only_payment);
    println!();

    println!("Annual Cash Flows ({} years):", result.cash_flows.len());
    println!(
        "{:>4} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>14} {:>6} {:>7}",
        "Year", "Income", "OpEx", "NOI", "Debt Svc", "Pref Paid", "LP", "GP", "DSCR", "Yield%"
    );
    println!("{}", "-".repeat(124));

    for row in &result.cash_flows {
        let dscr = row.dscr.map(|d| format!("{:.2}", d)).unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:>4} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>14.2} {:>6} {:>7.2}",
            row.year,
            row.rental_income,
            row.operating_expenses,
            row.noi,
            row.debt_service,
            row.preferred_return_paid,
            row.lp_distribution,
            row.gp_distribution,
            dscr,
            row.cash_yield,
        );
    }

    let exit = &result.exit_summary;
    println!("\nExit ({}):", exit.exit_strategy);
    if assumptions.exit.exit_strategy == ExitStrategy::Portfolio {
        println!("  Exit Cap Rate: {:.2}%", assumptions.exit.portfolio_exit_cap_rate * 100.0);
    }
    println!("  Gross Sale Proceeds: ${:.2}", exit.gross_sale_proceeds);
    println!("  Selling Costs: ${:.2}", exit.selling_costs);
    println!("  Loan Repayment: ${:.2}", exit.remaining_loan_balance);
    println!("  Net Proceeds After Debt: ${:.2}", exit.net_proceeds_after_debt);
    println!("  LP Profit: ${:.2}", exit.lp_profit);
    println!("  GP Profit: ${:.2}", exit.gp_profit);

    let summary = result.summary();
    println!("\nReturns:");
    println!("  LP IRR: {:.2}% ({:?})", result.returns.irr * 100.0, result.returns.irr_status);
    println!("  Equity Multiple: {:.2}x", result.returns.equity_multiple);
    println!("  Total Cash to LPs: ${:.2}", result.returns.total_cash_to_lps);
    println!("  Average Cash Yield: {:.2}%", result.returns.average_annual_cash_yield);
    println!("  Total GP Distributions: ${:.2}", summary.total_gp_distributions);
    if let Some(min_dscr) = summary.min_dscr {
        println!("  Minimum DSCR: {:.2}", min_dscr);
    }
}

fn run_sweep(runner: &ScenarioRunner, cap_rates: &[f64]) -> Result<()> {
    info!("sweeping {} exit cap rates", cap_rates.len());
    let points = runner.sweep_exit_cap_rates(cap_rates)?;

    println!("{:>8} {:>18} {:>8} {:>8}", "Cap Rate", "Gross Proceeds", "IRR%", "EM");
    println!("{}", "-".repeat(45));
    for point in &points {
        println!(
            "{:>7.2}% {:>18.2} {:>8.2} {:>7.2}x",
            point.cap_rate * 100.0,
            point.gross_sale_proceeds,
            point.irr * 100.0,
            point.equity_multiple
        );
    }
    Ok(())
}

fn run_report(runner: &ScenarioRunner, output: Option<&Path>) -> Result<()> {
    let comparison = runner.compare_exit_strategies()?;
    let today = chrono::Local::now().date_naive();
    let report = ReportData::build(runner.assumptions(), &comparison, today);

    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            serde_json::to_writer_pretty(file, &report)?;
            println!("Report data written to: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
    }

    info!(
        "preferred exit: {} ({:.2}% vs {:.2}%)",
        comparison.preferred(),
        comparison.get(comparison.preferred()).returns.irr * 100.0,
        comparison.get(comparison.preferred().alternative()).returns.irr * 100.0
    );
    Ok(())
}
