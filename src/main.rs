use clap::Parser;

use visitrack::cli::{Cli, Commands};
use visitrack::config::{StaticConfig, get_config, init_config_from};
use visitrack::system::init_logging;

fn generate_config(output: Option<&str>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            StaticConfig::default()
                .save_to_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path, e))?;
            println!("Configuration written to {}", path);
        }
        None => print!("{}", StaticConfig::generate_sample_config()),
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command() {
        Commands::GenerateConfig { output } => generate_config(output.as_deref()),
        Commands::Serve => {
            init_config_from(&cli.config);
            let config = get_config();

            let _guard = init_logging(&config.logging).map_err(|e| {
                eprintln!("{}", e.format_colored());
                anyhow::anyhow!(e.format_simple())
            })?;

            visitrack::runtime::modes::run_server().await
        }
    }
}
