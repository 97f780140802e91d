mod cli;
mod display;
mod error;

use clap::Parser;
use cli::{Cli, RunCommand};
use error::FluviewCliResult;
use fluview::config::Config;
use log::debug;

const DEFAULT_LOGGING_LEVEL: &str = "warn";

#[tokio::main]
async fn main() -> FluviewCliResult<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();
    let args = Cli::parse();
    debug!("args: {args:?}");
    let config: Config = read_config_from_toml()?;
    debug!("config: {config:?}");

    if let Some(command) = args.command {
        // Return ok if pipe is closed instead of error, otherwise return error
        // See: https://stackoverflow.com/a/65760807, https://github.com/rust-lang/rust/issues/62569
        if let Err(err) = command.run(config).await {
            if err.is_broken_pipe() {
                return Ok(());
            }
            Err(err)?;
        }
    }
    Ok(())
}

fn read_config_from_toml() -> FluviewCliResult<Config> {
    // Linux: ~/.config/fluview/config.toml
    // macOS: ~/Library/Application Support/fluview/config.toml
    let Some(file_path) = dirs::config_dir().map(|dir| dir.join("fluview").join("config.toml"))
    else {
        return Ok(Config::default());
    };
    match std::fs::read_to_string(file_path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}
