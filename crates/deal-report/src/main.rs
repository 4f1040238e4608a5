//! deal-report: analyze a real-estate deal description from the command line.
//!
//! Usage:
//!   deal-report listing.txt
//!   deal-report listing.txt --aux rent-roll.txt --format markdown
//!   DEAL_CURRENCY_SCALE=literal deal-report offer.txt --format both

use analysis_orchestrator::{DealAnalysisEngine, EngineConfig};
use anyhow::{bail, Context};
use std::path::PathBuf;

const USAGE: &str = "usage: deal-report <file> [--aux <file>] [--format json|markdown|both]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Markdown,
    Both,
}

impl OutputFormat {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "both" => Ok(OutputFormat::Both),
            other => bail!("unknown format '{}' (expected json, markdown or both)", other),
        }
    }
}

#[derive(Debug, PartialEq)]
struct Options {
    input: PathBuf,
    auxiliary: Option<PathBuf>,
    format: OutputFormat,
}

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &["--aux", "--format"];

fn flag_value<'a>(args: &'a [String], flag: &str) -> anyhow::Result<Option<&'a str>> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(i) => match args.get(i + 1) {
            Some(v) if !v.starts_with("--") => Ok(Some(v.as_str())),
            _ => bail!("{} requires a value\n{}", flag, USAGE),
        },
    }
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let auxiliary = flag_value(args, "--aux")?.map(PathBuf::from);
    let format = match flag_value(args, "--format")? {
        Some(v) => OutputFormat::parse(v)?,
        None => OutputFormat::Json,
    };

    let mut positional = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if arg.starts_with("--") {
            bail!("unknown flag '{}'\n{}", arg, USAGE);
        } else {
            positional.push(arg);
        }
    }

    let input = match positional.as_slice() {
        [one] => PathBuf::from(one.as_str()),
        [] => bail!("missing input file\n{}", USAGE),
        _ => bail!("expected exactly one input file\n{}", USAGE),
    };

    Ok(Options {
        input,
        auxiliary,
        format,
    })
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deal_report=info,analysis_orchestrator=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = parse_args(&args)?;

    let config = EngineConfig::from_env().context("Failed to load engine configuration")?;
    let engine = DealAnalysisEngine::new(config);

    let text = std::fs::read(&options.input)
        .with_context(|| format!("Failed to read {}", options.input.display()))?;
    let auxiliary = options
        .auxiliary
        .as_ref()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    tracing::info!("Analyzing {}", options.input.display());
    let result = engine
        .analyze_bytes(&text, auxiliary.as_deref())
        .with_context(|| format!("Failed to analyze {}", options.input.display()))?;

    for warning in &result.warnings {
        tracing::info!("Warning: {}", warning.message);
    }

    match options.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Markdown => {
            print!("{}", engine.render_markdown(&result));
        }
        OutputFormat::Both => {
            print!("{}", engine.render_markdown(&result));
            println!();
            println!("```json");
            println!("{}", serde_json::to_string_pretty(&result)?);
            println!("```");
        }
    }

    Ok(())
}
