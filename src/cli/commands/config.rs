use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Print the effective configuration with secrets masked")]
    Show,

    #[command(about = "Validate the configuration")]
    Check,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();

    match cmd {
        ConfigCommands::Show => {
            let redacted = config.redacted();
            match output_format {
                OutputFormat::Json => output_success(output_format, "Configuration", Some(json!({ "config": redacted }))),
                OutputFormat::Text => {
                    println!("{:#?}", redacted);
                    Ok(())
                }
            }
        }
        ConfigCommands::Check => match config.validate() {
            Ok(()) => output_success(output_format, "Configuration is valid", None),
            Err(e) => {
                output_error(output_format, &e.to_string(), Some("INVALID_CONFIG"))?;
                anyhow::bail!(e)
            }
        },
    }
}
