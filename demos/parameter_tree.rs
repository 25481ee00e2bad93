//! Example demonstrating a parameter tree driven by a simple optimizer
//!
//! This example declares a small cooling-loop description, hands its flat
//! vector to a random-search optimizer, writes the best point back and prints
//! the resulting configuration and its differences from the defaults.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use simparams_rs::parameters::{
    Distribution, Entry, MappingStyle, OptSpec, ParameterTree, Parameters, ParametersVector,
    Switch, SwitchOption,
};
use simparams_rs::Result;

fn build() -> Result<ParameterTree> {
    let pipe = Parameters::new("pipe")
        .with(
            "diameter",
            Entry::new::<f64>("m", "Inner diameter")
                .with_default(0.05)?
                .with_opt(OptSpec::range(0.02, 0.1)?)?,
        )?
        .with(
            "material",
            Switch::new(
                [
                    ("steel", SwitchOption::new("Steel", "Stainless 316L")),
                    ("copper", SwitchOption::new("Copper", "CuCrZr alloy")),
                ],
                "-",
                "Pipe material",
            )?
            .with_default("steel")?
            .with_opt(OptSpec::choice(["steel", "copper"])?)?,
        )?;

    let root = Parameters::new("cooling_loop")
        .with(
            "inlet_temperature",
            Entry::new::<f64>("K", "Coolant inlet temperature")
                .with_default(300.0)?
                .with_opt(OptSpec::range(250.0, 350.0)?.with_label("T_in"))?,
        )?
        .with(
            "heat_load",
            Entry::new::<f64>("MW", "Heat load on the loop")
                .with_default(50.0)?
                .with_opt(OptSpec::distribution(Distribution::Normal {
                    mean: 50.0,
                    std: 5.0,
                })?)?,
        )?
        .with("pipes", ParametersVector::with_len(pipe, 2))?
        .with(
            "flow_area",
            Entry::new::<f64>("m^2", "Total flow area")
                .with_opt(OptSpec::function(
                    "0.785 * (pipes[0].diameter^2 + pipes[1].diameter^2)",
                )?)?,
        )?;

    ParameterTree::new(root)
}

/// A made-up figure of merit: prefer cold coolant and a flow area near 5e-3 m^2
fn cost(tree: &ParameterTree) -> Result<f64> {
    let t_in = tree.get::<f64>("inlet_temperature")?;
    let area = tree.get::<f64>("flow_area")?;
    Ok((t_in - 250.0) / 100.0 + ((area - 5e-3) / 5e-3).powi(2))
}

fn main() -> Result<()> {
    let mut tree = build()?;
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    println!("Optimizable parameters:");
    for (label, bounds) in tree.opt_labels().iter().zip(tree.float_bounds()) {
        match bounds {
            Some((min, max)) => println!("  {label:<22} in [{min}, {max}]"),
            None => println!("  {label}"),
        }
    }

    let start = tree.pack()?;
    let mut best = (cost(&tree)?, start);
    println!("Initial cost: {:.4}", best.0);

    // Random search: perturb the continuous coordinates of the best point
    let bounds = tree.float_bounds();
    for _ in 0..200 {
        let mut candidate = best.1.clone();
        for (x, bound) in candidate.iter_mut().zip(&bounds) {
            if let Some((min, max)) = bound {
                let step = 0.1 * (max - min) * rng.gen_range(-1.0_f64..1.0);
                *x = (*x + step).clamp(*min, *max);
            }
        }
        let mut trial = tree.clone();
        trial.unpack(&candidate)?;
        let c = cost(&trial)?;
        if c < best.0 {
            best = (c, candidate);
        }
    }

    tree.unpack(&best.1)?;
    println!("Final cost: {:.4}", best.0);
    println!();

    println!("Configuration:");
    println!("{}", tree.to_json_string()?);
    println!();

    println!("Changes from defaults:");
    for change in tree.diff_from_default() {
        println!("  {change}");
    }
    println!();

    // Scenario study without touching the base tree
    let hot = tree.with_overrides([("heat_load", 70.0)], |scoped| {
        scoped.to_mapping_with(MappingStyle::Values)["heat_load"].clone()
    })?;
    println!("Scenario heat load: {hot}");
    println!("Base heat load: {}", tree.get::<f64>("heat_load")?);

    Ok(())
}
