use std::{env, path::PathBuf};

use anyhow::{Result, bail};

pub const USAGE: &str = "usage: albert [--config <path>] [--help]

  --config <path>  configuration file, json5 (default: ./albert.jsonc)
  -h, --help       print this message and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run { config_path: PathBuf },
    ShowUsage,
}

pub fn action_from_env() -> Result<CliAction> {
    parse_args(env::args().skip(1))
}

/// `--help` wins over everything else on the line; the last `--config`
/// wins when repeated.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliAction> {
    let mut args = args.into_iter();
    let mut config_path = PathBuf::from("./albert.jsonc");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::ShowUsage),
            "--config" => match args.next() {
                Some(value) => config_path = PathBuf::from(value),
                None => bail!("missing value for --config\n{USAGE}"),
            },
            other => match other.strip_prefix("--config=") {
                Some(value) if !value.is_empty() => config_path = PathBuf::from(value),
                _ => bail!("unknown argument: {other}\n{USAGE}"),
            },
        }
    }

    Ok(CliAction::Run { config_path })
}
