pub fn run(seed_file: Option<&str>) {
    let seed = super::load_seed(seed_file);
    if let Some(path) = seed_file {
        eprintln!(
            "{path}: {} protocols, {} platforms, {} threats",
            seed.protocols.len(),
            seed.platforms.len(),
            seed.threats.len()
        );
    }
    super::print_json(&seed);
}
