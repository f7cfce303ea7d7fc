use clap::{Parser, Subcommand, ValueEnum};
use gamma_span::bounds::LowerBoundTable;
use gamma_span::coordinator::{CoordinatorMode, SearchConfig};
use gamma_span::driver::{SpanRecord, Solver};
use gamma_span::error::SearchError;
use gamma_span::sequence::{format_sequence, parse_sequence};
use gamma_span::validate::{validate_sequence, BUNDLED_EXAMPLE};
use std::process::ExitCode;
use tracing::Level;

const GAMMA: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "gamma-span", version, about = "Minimal spans of sequences with at most 3 repeats per difference")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Worker threads (default: logical cores)
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Deterministic seed for the randomized greedy upper bound
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Randomized greedy attempts used to tighten the upper bound
    #[arg(long, global = true, default_value_t = 64)]
    greedy_trials: usize,

    /// How partitions combine their results
    #[arg(long, global = true, value_enum, default_value_t = Mode::FailFast)]
    mode: Mode,

    /// Start from the literal gamma=3 lower bounds instead of learning them
    #[arg(long, global = true)]
    seed_table: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print G-(3, k) for a range of k
    Table {
        /// First size to report
        #[arg(long, default_value_t = 1)]
        from: usize,
        /// Last size to report
        #[arg(long, default_value_t = 15)]
        to: usize,
    },
    /// Compute G-(3, k) for a single k
    Solve {
        /// Target size
        k: usize,
    },
    /// Check a sequence (default: the bundled 18-element example)
    Validate {
        /// Elements, e.g. "0,4,5,6,8"
        sequence: Option<String>,
        /// Multiplicity bound to check against
        #[arg(long, default_value_t = GAMMA)]
        gamma: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    FailFast,
    Minimize,
}

impl From<Mode> for CoordinatorMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::FailFast => CoordinatorMode::FailFast,
            Mode::Minimize => CoordinatorMode::Minimize,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, SearchError> {
    match &cli.command {
        Command::Validate { sequence, gamma } => {
            let seq = match sequence {
                Some(text) => parse_sequence(text)?,
                None => BUNDLED_EXAMPLE.to_vec(),
            };
            let report = validate_sequence(&seq, *gamma);
            println!("{report}");
            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Table { from, to } => {
            let mut solver = build_solver(cli)?;
            print_header();
            solver.solve_range((*from).max(1), *to, |r| println!("{r}"))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Solve { k } => {
            let mut solver = build_solver(cli)?;
            // Learn the table for every smaller size unless seeds already cover it.
            let record = if cli.seed_table && *k <= solver.table().max_known() + 1 {
                solver.solve(*k)?
            } else {
                let mut records = solver.solve_range(*k, *k, |_| {})?;
                records.pop().ok_or(SearchError::InvalidSize { k: *k })?
            };
            print_record(&record);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_solver(cli: &Cli) -> Result<Solver<GAMMA>, SearchError> {
    let defaults = SearchConfig::default();
    let config = SearchConfig {
        workers: cli.workers.unwrap_or(defaults.workers),
        mode: cli.mode.into(),
        greedy_trials: cli.greedy_trials,
        seed: cli.seed,
        ..defaults
    };
    if cli.seed_table {
        Solver::with_table(config, LowerBoundTable::gamma3_seeded())
    } else {
        Solver::new(config)
    }
}

fn print_header() {
    println!("Computing G-(gamma={GAMMA}, k)");
    println!("-------------------------");
    println!("| k  | G-(3,k) | Witness");
    println!("|----|---------|--------");
}

fn print_record(record: &SpanRecord) {
    for attempt in &record.attempts {
        if !attempt.feasible {
            println!(
                "alpha = {} failed ({:.2}s)",
                attempt.span,
                attempt.elapsed.as_secs_f64()
            );
        }
    }
    println!(
        "FOUND! G-({GAMMA}, {}) = {} | Set: {} ({:.2}s)",
        record.k,
        record.span,
        format_sequence(&record.witness),
        record.elapsed.as_secs_f64()
    );
}
