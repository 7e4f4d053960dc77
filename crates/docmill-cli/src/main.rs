//! Docmill CLI - document format conversion

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docmill::{
    ConversionGraph, DataType, Family, PathFinder, Registry, UnsupportedConversion, run_pipeline,
};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docmill")]
#[command(about = "Document format conversion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported input formats, grouped by family
    Formats {
        /// Restrict to one family (text, spreadsheet, presentation, other)
        #[arg(long)]
        family: Option<String>,
    },

    /// Show ranked conversion paths from a format
    Paths {
        /// Source format
        from: String,
        /// Target format (all reachable formats if omitted)
        to: Option<String>,
    },

    /// Convert a document along the cheapest path
    Convert {
        /// Source format
        from: String,
        /// Target format
        to: String,
        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a document
    Validate {
        /// Document format
        format: String,
        /// Input file (defaults to stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut registry = Registry::new();
    docmill_codecs::register_defaults(&mut registry);

    match cli.command {
        Commands::Formats { family } => cmd_formats(&registry, family.as_deref()),
        Commands::Paths { from, to } => cmd_paths(&registry, &from, to.as_deref()),
        Commands::Convert {
            from,
            to,
            input,
            output,
        } => cmd_convert(&registry, &from, &to, input, output),
        Commands::Validate { format, input } => cmd_validate(&registry, &format, input),
    }
}

fn cmd_formats(registry: &Registry, family: Option<&str>) -> Result<()> {
    let filter = match family {
        Some(code) => {
            let family = Family::from_code(code);
            // from_code falls back to Other; reject codes it did not match.
            if family.code() != code {
                bail!("unknown family: {code}");
            }
            Some(family)
        }
        None => None,
    };

    let graph = ConversionGraph::build(registry);
    let formats = graph.input_formats();

    for family in [
        Family::Text,
        Family::Spreadsheet,
        Family::Presentation,
        Family::Other,
    ] {
        if filter.is_some_and(|wanted| wanted != family) {
            continue;
        }
        let members: Vec<_> = formats.iter().filter(|t| t.family == family).collect();
        if members.is_empty() {
            continue;
        }
        println!("{family}:");
        for datatype in members {
            println!(
                "  {} ({}) - {}",
                datatype.format, datatype.mime, datatype.description
            );
        }
        println!();
    }

    Ok(())
}

fn cmd_paths(registry: &Registry, from: &str, to: Option<&str>) -> Result<()> {
    let graph = ConversionGraph::build(registry);
    let source = resolve_type(&graph, from)?;
    let target = to.map(|code| resolve_type(&graph, code)).transpose()?;

    let finder = PathFinder::new(&graph);
    let paths = finder.find_paths(&source, target.as_ref());

    if paths.is_empty() {
        println!("No conversion paths found");
        return Ok(());
    }
    for (i, path) in paths.iter().enumerate() {
        println!("  {}. {}", i + 1, path);
    }
    Ok(())
}

fn cmd_convert(
    registry: &Registry,
    from: &str,
    to: &str,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let graph = ConversionGraph::build(registry);
    let source = resolve_type(&graph, from)?;
    let target = resolve_type(&graph, to)?;

    let finder = PathFinder::new(&graph);
    let paths = finder.find_paths(&source, Some(&target));
    let path = paths.first().ok_or(UnsupportedConversion {
        from: source.clone(),
        to: target.clone(),
    })?;
    tracing::info!(path = %path, "conversion path selected");

    let input: Box<dyn Read + Send> = match input {
        Some(file) => {
            Box::new(File::open(&file).with_context(|| format!("opening {}", file.display()))?)
        }
        None => Box::new(io::stdin()),
    };
    let output: Box<dyn Write + Send> = match output {
        Some(file) => {
            Box::new(File::create(&file).with_context(|| format!("creating {}", file.display()))?)
        }
        None => Box::new(io::stdout()),
    };

    run_pipeline(path, input, output).context("conversion failed")?;
    Ok(())
}

fn cmd_validate(registry: &Registry, format: &str, input: Option<PathBuf>) -> Result<()> {
    let datatype = registry
        .supported_validation_types()
        .into_iter()
        .find(|t| t.format == format)
        .with_context(|| format!("no validator for format: {format}"))?;

    let mut input: Box<dyn Read> = match input {
        Some(file) => {
            Box::new(File::open(&file).with_context(|| format!("opening {}", file.display()))?)
        }
        None => Box::new(io::stdin()),
    };

    let report = registry.validate(&mut input, &datatype)?;
    if report.is_valid() {
        println!("valid");
        Ok(())
    } else {
        for message in &report.messages {
            println!("  {message}");
        }
        bail!("document is not a valid {format}")
    }
}

/// Resolve a format code against every type the graph knows about.
fn resolve_type(graph: &ConversionGraph, code: &str) -> Result<DataType> {
    graph
        .nodes()
        .iter()
        .flat_map(|action| [action.input(), action.output()])
        .find(|t| t.format == code)
        .cloned()
        .with_context(|| format!("unknown format: {code}"))
}
