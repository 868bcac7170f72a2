use park_scene::ParkConfig;

/// `park-scene [SEED]`: a fixed seed reproduces the sparkle layout.
fn main() -> anyhow::Result<()> {
    let mut config = ParkConfig::default();
    if let Some(seed) = std::env::args().nth(1) {
        config.seed = Some(seed.parse()?);
    }
    park_scene::run(config)
}
