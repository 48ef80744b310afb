use bb84_simulator::bb84::run_comparison_seeded;
use bb84_simulator::config::SimulationConfig;
use bb84_simulator::oracle::{BB84StateOracle, StateVectorOracle};
use bb84_simulator::report::Comparison;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Complex amplitude simulation with X/H gates
    StateVector,
    /// Table of the four BB84 states
    States,
}

#[derive(Parser, Debug)]
#[command(
    name = "bb84",
    version,
    about = "Simulate BB84 key distribution with and without an eavesdropper"
)]
struct Cli {
    #[arg(long, help = "TOML file with simulation parameters")]
    config: Option<PathBuf>,
    #[arg(short = 'n', long, help = "Qubits to transmit")]
    qubits: Option<usize>,
    #[arg(long, help = "QBER at or above which the exchange is aborted")]
    threshold: Option<f64>,
    #[arg(long, help = "Probability Eve intercepts each qubit")]
    eve_prob: Option<f64>,
    #[arg(long, help = "Channel bit-flip probability")]
    noise: Option<f64>,
    #[arg(long, help = "Privacy amplification security parameter epsilon")]
    epsilon: Option<f64>,
    #[arg(long, help = "Qubits per oracle batch")]
    batch_size: Option<usize>,
    #[arg(long, help = "Window size for the rolling error rate")]
    window: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = Backend::StateVector)]
    backend: Backend,
    #[arg(long, help = "Print the full report as JSON")]
    json: bool,
    #[arg(
        long,
        default_value_t = 0,
        help = "Print the first N timeline rows of each scenario"
    )]
    show_timeline: usize,
}

impl Cli {
    fn simulation_config(&self) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_toml_file(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(n) = self.qubits {
            config.num_qubits = n;
        }
        if let Some(t) = self.threshold {
            config.qber_threshold = t;
        }
        if let Some(p) = self.eve_prob {
            config.eve_intercept_prob = p;
        }
        if let Some(p) = self.noise {
            config.noise_prob = p;
        }
        if let Some(e) = self.epsilon {
            config.security_param = e;
        }
        if let Some(b) = self.batch_size {
            config.batch_size = b;
        }
        if let Some(w) = self.window {
            config.window_size = w;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn print_timeline(session: &Comparison, rows: usize) {
    for (name, run) in [("No Eve", &session.no_eve), ("With Eve", &session.with_eve)] {
        println!("\n{} timeline", name);
        println!(
            "{:>5}  {:<8} {:>4} {:>4}  {:>4} {:>4}  {:>4} {:>4}  used  error",
            "idx", "state", "A", "Ab", "E", "Eb", "B", "Bb"
        );
        for row in run.timeline_rows().iter().take(rows) {
            println!(
                "{:>5}  {:<8} {:>4} {:>4}  {:>4} {:>4}  {:>4} {:>4}  {:<5} {}",
                row.index,
                row.alice_state,
                row.alice_bit,
                row.alice_basis,
                row.eve_bit.map_or("-".to_string(), |b| b.to_string()),
                row.eve_basis.unwrap_or('-'),
                row.bob_bit,
                row.bob_basis,
                row.used,
                row.error
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.simulation_config()?;

    let session = match cli.backend {
        Backend::StateVector => run_comparison_seeded(&config, &StateVectorOracle)?,
        Backend::States => run_comparison_seeded(&config, &BB84StateOracle)?,
    };

    if cli.json {
        println!("{}", session.to_json()?);
        return Ok(());
    }

    print!("{}", session);
    if cli.show_timeline > 0 {
        print_timeline(&session, cli.show_timeline);
    }
    Ok(())
}
