use bb84_simulator::bb84::transmit;
use bb84_simulator::bb84_states::{random_bit, BB84State, MeasurementBasis};
use bb84_simulator::oracle::StateVectorOracle;
use rand::thread_rng;

fn simulate_eavesdropping() -> Result<(), Box<dyn std::error::Error>> {
    println!("BB84 Eavesdropping Simulation");
    let mut rng = thread_rng();

    // Alice prepares a qubit, Bob picks his basis independently
    let alice_bit = random_bit(&mut rng);
    let alice_basis = MeasurementBasis::random(&mut rng);
    let bob_basis = MeasurementBasis::random(&mut rng);
    println!(
        "Alice sends {} (bit {})",
        BB84State::prepare(alice_bit, alice_basis),
        alice_bit as u8
    );

    // Eve intercepts in a basis of her own choosing and resends what she saw
    let eve_basis = MeasurementBasis::random(&mut rng);
    let t = transmit(
        &StateVectorOracle,
        alice_bit,
        alice_basis,
        bob_basis,
        Some(eve_basis),
        0.0,
        &mut rng,
    )?;
    if let Some(seen) = t.interception {
        println!(
            "Eve measures in {} and resends {}",
            seen.basis,
            BB84State::prepare(seen.bit, seen.basis)
        );
    }
    println!("Bob measures in {} and reads {}", bob_basis, t.bob_bit as u8);

    if alice_basis != bob_basis {
        println!("Bases differ: the qubit is discarded during sifting.");
    } else if alice_bit != t.bob_bit {
        println!("Bases match but bits differ: eavesdropping detected.");
    } else {
        println!("Bases match and bits agree: this qubit revealed nothing.");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simulate_eavesdropping()
}
