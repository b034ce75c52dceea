use anyhow::{Context as _, Result};
use clap::Parser;

use tplweave::config::{Args, Config};
use tplweave::document::text;
use tplweave::Preprocessor;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::from_args(&args)?;

    let data_text = std::fs::read_to_string(&args.data)
        .with_context(|| format!("reading data document {:?}", args.data))?;
    let template_text = std::fs::read_to_string(&args.template)
        .with_context(|| format!("reading template document {:?}", args.template))?;

    let data = text::parse(&data_text)
        .with_context(|| format!("parsing data document {:?}", args.data))?;
    let template = text::parse(&template_text)
        .with_context(|| format!("parsing template document {:?}", args.template))?;

    let mut preprocessor = Preprocessor::with_namespace(&data, &template, config.prefix());
    let compiled = preprocessor
        .parse()
        .context("compiling template against data")?;

    let rendered = text::render(compiled).context("rendering compiled document")?;

    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing compiled document to {:?}", path))?,
        None => println!("{rendered}"),
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
