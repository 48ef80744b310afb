use bb84_simulator::bb84::{simulate_scenario, ProtocolInputs};
use bb84_simulator::config::SimulationConfig;
use bb84_simulator::oracle::StateVectorOracle;
use bb84_simulator::security::expected_qber;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn simulate_noise_effect() -> Result<(), Box<dyn std::error::Error>> {
    println!("BB84 Protocol with Noise Simulation");

    let mut rng = StdRng::seed_from_u64(2024);
    let inputs = ProtocolInputs::generate(1000, &mut rng)?;

    println!(
        "{:>6}  {:>8}  {:>8}  {:<24} {:>9}",
        "noise", "expected", "QBER", "status", "key bits"
    );
    for step in 0..=8 {
        let noise_prob = step as f64 * 0.02;
        let config = SimulationConfig {
            num_qubits: inputs.len(),
            noise_prob,
            ..SimulationConfig::default()
        };
        let run = simulate_scenario(&config, &StateVectorOracle, &inputs, None, &mut rng)?;
        println!(
            "{:>6.2}  {:>8.4}  {:>8.4}  {:<24} {:>9}",
            noise_prob,
            expected_qber(0.0, noise_prob),
            run.qber(),
            run.status().to_string(),
            run.final_key_bits()
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simulate_noise_effect()
}
