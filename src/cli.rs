//! CLI definition and dispatch.

use std::cell::RefCell;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::event_journal::EventJournal;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::brokerage::fees::FeeStructure;
use crate::domain::config_validation::{get_decimal, parse_date, validate_simulation_config};
use crate::domain::equity::{EquityClass, EquityIdentity};
use crate::domain::error::PapertraderError;
use crate::domain::indicator::CalculationContext;
use crate::domain::management_fee::{ChargeAgainst, ManagementFeePolicy, ManagementFeeRate};
use crate::domain::order::{CashBound, EntrySizePolicy};
use crate::domain::simulation::{
    DepositConfiguration, Simulation, SimulationDates, SimulationSetup,
};
use crate::domain::strategy::Strategy;
use crate::domain::strategy_parser;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PricePort;

#[derive(Parser, Debug)]
#[command(name = "papertrader", about = "Deterministic trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of TICKER.csv price files
        #[arg(short, long)]
        data: PathBuf,
        /// Write the event journal as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        ticker: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a simulation configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers available in a data directory
    ListTickers {
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Show the data range for a ticker
    Info {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        ticker: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            data,
            output,
            ticker,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_simulate(&config, &data, output.as_ref(), ticker.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { data } => run_list_tickers(&data),
        Command::Info { data, ticker } => run_info(&data, &ticker),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PapertraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Assemble a validated setup from config. `ticker_override` replaces the
/// configured ticker when given.
pub fn build_simulation_setup(
    config: &dyn ConfigPort,
    ticker_override: Option<&str>,
) -> Result<SimulationSetup, PapertraderError> {
    let ticker = match ticker_override {
        Some(t) => t.to_uppercase(),
        None => config
            .get_string("simulation", "ticker")
            .ok_or_else(|| PapertraderError::ConfigMissing {
                section: "simulation".into(),
                key: "ticker".into(),
            })?
            .trim()
            .to_uppercase(),
    };
    let scale = config.get_int("simulation", "scale", 0) as u32;

    let start = parse_date(config, "simulation", "start_date")?;
    let end = parse_date(config, "simulation", "end_date")?;
    let dates = SimulationDates::new(start, end)?;

    let opening_funds = get_decimal(config, "simulation", "opening_funds")?
        .unwrap_or(Decimal::ZERO);

    let class_name = config
        .get_string("simulation", "equity_class")
        .unwrap_or_else(|| "stock".to_string());
    let equity_class =
        EquityClass::from_name(&class_name).ok_or_else(|| PapertraderError::ConfigInvalid {
            section: "simulation".into(),
            key: "equity_class".into(),
            reason: format!("unknown equity class '{}'", class_name),
        })?;

    let structure_name = config
        .get_string("brokerage", "fee_structure")
        .ok_or_else(|| PapertraderError::ConfigMissing {
            section: "brokerage".into(),
            key: "fee_structure".into(),
        })?;
    let fee_structure =
        FeeStructure::from_name(&structure_name).ok_or_else(|| PapertraderError::ConfigInvalid {
            section: "brokerage".into(),
            key: "fee_structure".into(),
            reason: format!("unknown fee structure '{}'", structure_name),
        })?;

    let deposit = match get_decimal(config, "deposit", "amount")? {
        Some(amount) if amount > Decimal::ZERO => DepositConfiguration::Periodic {
            amount,
            frequency_days: config.get_int("deposit", "frequency_days", 7) as u64,
        },
        _ => DepositConfiguration::None,
    };

    let entry_policy = EntrySizePolicy::new(
        build_bound(config, "minimum", Decimal::ZERO)?,
        build_bound(config, "maximum", Decimal::ONE)?,
    );

    let management_fee = match get_decimal(config, "management_fee", "annual_rate")? {
        None => ManagementFeePolicy::None,
        Some(rate) => {
            let charge_name = config
                .get_string("management_fee", "charge")
                .unwrap_or_else(|| "cash".to_string());
            let charge = match charge_name.to_lowercase().as_str() {
                "cash" => ChargeAgainst::Cash,
                "equity" => ChargeAgainst::Equity,
                other => {
                    return Err(PapertraderError::ConfigInvalid {
                        section: "management_fee".into(),
                        key: "charge".into(),
                        reason: format!("charge must be 'cash' or 'equity', not '{}'", other),
                    });
                }
            };
            ManagementFeePolicy::Periodic {
                rate: ManagementFeeRate::new(rate),
                period_days: config.get_int("management_fee", "period_days", 365) as u64,
                charge,
            }
        }
    };

    let strategy = build_strategy(config)?;

    let ctx = CalculationContext {
        scale: config.get_int("simulation", "precision", 10) as u32,
        max_data_points: config.get_int("simulation", "max_data_points", 10_000) as usize,
        ..Default::default()
    };

    Ok(SimulationSetup {
        identity: EquityIdentity::new(ticker, scale),
        equity_class,
        dates,
        opening_funds,
        deposit,
        entry_policy,
        fee_structure,
        management_fee,
        strategy,
        ctx,
    })
}

fn build_bound(
    config: &dyn ConfigPort,
    side: &str,
    default_fraction: Decimal,
) -> Result<CashBound, PapertraderError> {
    if let Some(fixed) = get_decimal(config, "entry", side)? {
        return Ok(CashBound::Fixed(fixed));
    }
    if let Some(fraction) = get_decimal(config, "entry", &format!("{}_fraction", side))? {
        return Ok(CashBound::Fraction(fraction));
    }
    Ok(CashBound::Fraction(default_fraction))
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, PapertraderError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| "Unnamed".to_string());

    let read = |key: &str| {
        config
            .get_string("strategy", key)
            .ok_or_else(|| PapertraderError::ConfigMissing {
                section: "strategy".into(),
                key: key.into(),
            })
    };
    let entry = strategy_parser::parse(&read("entry")?)?;
    let exit = strategy_parser::parse(&read("exit")?)?;

    Ok(Strategy { name, entry, exit })
}

fn run_simulate(
    config_path: &PathBuf,
    data_path: &PathBuf,
    output_path: Option<&PathBuf>,
    ticker_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let setup = match build_simulation_setup(&adapter, ticker_override) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let ticker = setup.identity.ticker.clone();
    let dates = setup.dates;
    eprintln!(
        "Running simulation: {} from {} to {}",
        ticker,
        dates.start(),
        dates.end(),
    );

    let price_port = CsvPriceAdapter::new(data_path.clone());
    let prices = match price_port.fetch_prices(&ticker, dates.start(), dates.end()) {
        Ok(prices) => prices,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("  Processing: {} trading days", prices.len());

    let mut simulation = match Simulation::new(setup) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let journal = Rc::new(RefCell::new(EventJournal::new()));
    simulation.register_recorder(journal.clone());

    let report = match simulation.run(&prices) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Simulation Results ===");
    eprintln!("Deposits:         {}", report.deposits);
    eprintln!("Entry orders:     {}", report.entries);
    eprintln!("Exit orders:      {}", report.exits);
    eprintln!("Brokerage fees:   {}", report.brokerage_fees);
    eprintln!("Management fees:  {}", report.management_fees);
    eprintln!("Cash balance:     {}", report.cash_balance);
    eprintln!(
        "Equity balance:   {} (close {})",
        report.equity_balance, report.final_close,
    );
    eprintln!("Net worth:        {}", report.net_worth);
    eprintln!("Events recorded:  {}", journal.borrow().len());

    if let Some(output) = output_path {
        let file = match File::create(output) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: failed to create {}: {}", output.display(), e);
                return ExitCode::from(1);
            }
        };
        if let Err(e) = journal.borrow().write_csv(file) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("\nEvent journal written to: {}", output.display());
    }

    ExitCode::SUCCESS
}

pub fn run_dry_run(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");

    let setup = match build_simulation_setup(&adapter, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nStrategy: {}", setup.strategy.name);
    eprintln!("  entry: {}", setup.strategy.entry);
    eprintln!("  exit:  {}", setup.strategy.exit);
    eprintln!("\nSimulation:");
    eprintln!("  ticker:  {}", setup.identity.ticker);
    eprintln!(
        "  window:  {} to {}",
        setup.dates.start(),
        setup.dates.end()
    );
    eprintln!("  funds:   {}", setup.opening_funds);
    eprintln!("  fees:    {}", setup.fee_structure);

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        if let PapertraderError::StrategyParse(parse_error) = &e {
            for key in ["entry", "exit"] {
                if let Some(raw) = adapter.get_string("strategy", key) {
                    if strategy_parser::parse(&raw).is_err() {
                        eprintln!(
                            "error in strategy {}:\n{}",
                            key,
                            parse_error.display_with_context(&raw)
                        );
                        return (&e).into();
                    }
                }
            }
        }
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn run_list_tickers(data_path: &PathBuf) -> ExitCode {
    let adapter = CsvPriceAdapter::new(data_path.clone());
    match adapter.list_tickers() {
        Ok(tickers) if tickers.is_empty() => {
            eprintln!("No tickers found in {}", data_path.display());
            ExitCode::SUCCESS
        }
        Ok(tickers) => {
            let count = tickers.len();
            for ticker in tickers {
                println!("{}", ticker);
            }
            eprintln!("{} tickers found", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(data_path: &PathBuf, ticker: &str) -> ExitCode {
    let adapter = CsvPriceAdapter::new(data_path.clone());
    match adapter.data_range(&ticker.to_uppercase()) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} days, {} to {}", ticker, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", ticker);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}
