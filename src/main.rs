use std::{env, io};

use log::info;
use model_registry::config::RegistryConfig;

fn main() -> io::Result<()> {
    env_logger::init();

    let config = RegistryConfig::from_env()?.with_args(env::args().skip(1))?;
    let catalog = config.load()?;
    catalog.validate()?;
    info!("loaded {} models from {}", catalog.len(), config.source);

    for spec in &catalog {
        info!(
            "{}: {} over {} combinations",
            spec.name,
            spec.classifier.name(),
            spec.params.num_combinations()
        );
    }

    let summary = serde_json::to_string_pretty(&catalog.summary()).map_err(io::Error::other)?;
    println!("{summary}");
    Ok(())
}
