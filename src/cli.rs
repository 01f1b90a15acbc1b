//! Command-line arguments and the end-to-end run behind the binary.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use log::{error, info};
use thiserror::Error;

use crate::csdl::{Document, FsResolver};
use crate::options::{ConfigError, GeneratorOptions};
use crate::plant::{FAILURE_MESSAGE, PlantConverter};
use crate::render::{DEFAULT_SERVER_URL, RenderError, render_svg};

/// Draw OData CSDL schemas as PlantUML class diagrams
#[derive(Parser, Debug)]
#[command(name = "csdl-diagram", version)]
#[command(about = "Turn a CSDL schema into a PlantUML class diagram or SVG image", long_about = None)]
pub struct Args {
    /// CSDL file to convert; referenced documents are found relative to it
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Render SVG through a PlantUML server instead of writing PlantUML text
    #[arg(short, long)]
    pub svg: bool,

    /// PlantUML server used with --svg
    #[arg(long, value_name = "URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Options file (TOML or YAML)
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Type name to leave out of the diagram; repeat to skip several
    #[arg(long = "skip", value_name = "NAME")]
    pub skip: Vec<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read input file {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{} {}", FAILURE_MESSAGE, .0.join("; "))]
    Conversion(Vec<String>),

    #[error("Error rendering SVG file: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Convert the input named by `args` and write the result.
pub fn run(args: &Args) -> Result<(), CliError> {
    let mut options = GeneratorOptions::load(args.config.as_deref())?;
    if !args.skip.is_empty() {
        options.skip_list = args.skip.clone();
    }

    let document = Document::from_path(&args.input).map_err(|source| CliError::Input {
        path: args.input.clone(),
        source,
    })?;

    let conversion = PlantConverter::new(options).convert(document, &FsResolver);
    if !conversion.is_success() {
        let messages: Vec<String> = conversion
            .errors
            .errors()
            .map(|e| e.message.clone())
            .collect();
        for message in &messages {
            error!(message = message.as_str(); "Conversion error");
        }
        return Err(CliError::Conversion(messages));
    }

    let text = if args.svg {
        info!(server = args.server_url.as_str(); "Rendering SVG");
        render_svg(&conversion.diagram, &args.server_url)?
    } else {
        conversion.diagram
    };

    match &args.output {
        Some(path) => {
            fs::write(path, text).map_err(|source| CliError::Output {
                path: path.clone(),
                source,
            })?;
            info!(path = path.display().to_string(); "Wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .map_err(|source| CliError::Output {
                    path: PathBuf::from("-"),
                    source,
                })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_flags_repeat() {
        let args = Args::try_parse_from([
            "csdl-diagram",
            "model.xml",
            "--skip",
            "Entity",
            "--skip",
            "directoryObject",
            "-o",
            "out.puml",
        ])
        .unwrap();
        assert_eq!(args.skip, ["Entity", "directoryObject"]);
        assert_eq!(args.output, Some(PathBuf::from("out.puml")));
        assert!(!args.svg);
        assert_eq!(args.server_url, DEFAULT_SERVER_URL);
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn missing_input_is_reported() {
        let args = Args::try_parse_from(["csdl-diagram", "/no/such/model.xml"]).unwrap();
        let err = run(&args).unwrap_err();
        assert!(matches!(err, CliError::Input { .. }), "{err:?}");
    }
}
