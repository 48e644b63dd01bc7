use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

const USAGE: &str = "usage: crivo --input <client.json> [--config <path>] [--email <addr>] [--phone <num>]";

/// Command line for one analysis run. `email`/`phone` pre-answer the
/// onboarding step so the run never has to prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub input_path: PathBuf,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn args_from_env() -> Result<CliArgs> {
    parse_args(env::args().skip(1))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut args = args.into_iter();
    let mut config_path = None;
    let mut input_path = None;
    let mut email = None;
    let mut phone = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --config"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--input" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --input"))?;
                input_path = Some(PathBuf::from(value));
            }
            "--email" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --email"))?;
                email = Some(value);
            }
            "--phone" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --phone"))?;
                phone = Some(value);
            }
            other => {
                return Err(anyhow!("unknown argument: {other}. {USAGE}"));
            }
        }
    }

    let input_path = input_path.ok_or_else(|| anyhow!("missing --input. {USAGE}"))?;

    Ok(CliArgs {
        config_path: config_path.unwrap_or_else(|| PathBuf::from("./crivo.jsonc")),
        input_path,
        email,
        phone,
    })
}
