//! Run configuration: a `tplweave.toml` file layered under CLI flags, in the
//! same shape as `diskplan::config::{Config, Args}` — a `clap::Parser`
//! derive struct for flags, a `serde`-deserialized file for defaults, merged
//! by a single constructor.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use serde::Deserialize;

/// Command-line arguments for the `tplweave` binary.
#[derive(Parser, Debug)]
#[command(author, version, about = "Compile a template document against a data document", long_about = None)]
pub struct Args {
    /// Path to the data document.
    pub data: PathBuf,

    /// Path to the template document.
    pub template: PathBuf,

    /// Path to write the compiled document to; prints to stdout if omitted.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to a `tplweave.toml` config file.
    #[arg(short, long, default_value = "tplweave.toml")]
    config_file: PathBuf,

    /// Directive namespace prefix (overrides the config file's, default `s:`).
    #[arg(long)]
    prefix: Option<String>,

    /// Increase verbosity (0: warn; 1: info; 2: debug; 3: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// On-disk configuration, loaded from `tplweave.toml` if present.
#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
struct ConfigData {
    /// The directive namespace prefix (spec.md §4.1); defaults to `"s:"`.
    prefix: Option<String>,
}

/// Merged configuration: the config file's `prefix`, overridden by
/// `--prefix` if given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    prefix: String,
}

const DEFAULT_PREFIX: &str = "s:";

impl Config {
    /// Load `tplweave.toml` if it exists (a missing file is not an error —
    /// only a present-but-unparseable one is), then apply `--prefix`.
    pub fn from_args(args: &Args) -> Result<Self> {
        let data = if args.config_file.exists() {
            let text = std::fs::read_to_string(&args.config_file)
                .with_context(|| format!("reading config file {:?}", args.config_file))?;
            toml::from_str(&text)
                .with_context(|| format!("parsing config file {:?}", args.config_file))?
        } else {
            ConfigData::default()
        };

        let prefix = args
            .prefix
            .clone()
            .or(data.prefix)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_owned());

        Ok(Config { prefix })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_s_colon_prefix() {
        assert_eq!(Config::default().prefix(), "s:");
    }
}
