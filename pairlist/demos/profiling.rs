use pairlist::{PairConnections, PairListGenerator, SelfPairListOptions, Vector3D};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let size = match std::env::args().nth(1) {
        Some(size) => size.parse::<usize>()?,
        None => 20,
    };

    // enable collection of profiling data
    time_graph::enable_data_collection(true);
    // clear any existing collected data
    time_graph::clear_collected_data();

    let positions = time_graph::spanned!("Create positions", {
        lattice(size)
    });

    let n_pairs = generate_pairs(&positions)?;
    println!("found {} pairs between {} particles", n_pairs, positions.len());

    // get the call graph and display it
    let graph = time_graph::get_full_graph();
    // (this requires the "table" feature for the time_graph crate)
    println!("{}", graph.as_short_table());

    // also available for saving profiling data to the disk & future analysis
    // (this requires the "json" feature for the time_graph crate)
    println!("{}", graph.as_json());

    Ok(())
}

fn lattice(n: usize) -> Vec<Vector3D> {
    let mut positions = Vec::with_capacity(n * n * n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let seed = positions.len() as f64;
                positions.push(Vector3D::new(
                    1.4 * i as f64 + 0.25 * f64::sin(1.3 * seed),
                    1.4 * j as f64 + 0.25 * f64::sin(2.9 * seed),
                    1.4 * k as f64 + 0.25 * f64::sin(4.7 * seed),
                ));
            }
        }
    }
    return positions;
}

/// Generate a short-range pair list, and use it as exclusions for a long
/// range pair list
fn generate_pairs(positions: &[Vector3D]) -> Result<usize, Box<dyn std::error::Error>> {
    let parameters = r#"{
        "cutoff": 6.0,
        "sort_indices": true
    }"#;

    let n_pairs = time_graph::spanned!("Full generation", {
        let mut bonded = PairListGenerator::new(1.8)?.self_pair_list(positions, Default::default())?;
        let exclusions: &PairConnections = bonded.make_connections(positions.len())?;

        let generator = PairListGenerator::from_json(parameters)?;
        let options = SelfPairListOptions {
            exclusions: Some(exclusions),
            ..Default::default()
        };
        let list = generator.self_pair_list(positions, options)?;
        list.number_of_pairs()
    });

    Ok(n_pairs)
}
