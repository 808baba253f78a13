use clap::{Parser, Subcommand};

use pl_domain::config::Config;

/// PageLingo — a local-AI page translation gateway.
#[derive(Debug, Parser)]
#[command(name = "pagelingo", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load the config from `PAGELINGO_CONFIG` (default `config.toml`),
/// falling back to built-in defaults when the file does not exist.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path =
        std::env::var("PAGELINGO_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// `config validate` — parse and report.
pub fn validate() -> bool {
    match load_config() {
        Ok((_, config_path)) => {
            println!("{config_path}: ok");
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

/// `config show` — dump the resolved config.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("rendering config: {e}"),
    }
}
