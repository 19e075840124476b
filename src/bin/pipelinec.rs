//! Pipeline compiler command line interface
//!
//! # Usage
//!
//! ```bash
//! # Compile a pipeline against a symbol index
//! pipelinec compile --pipeline pipeline.yaml --index classes.yaml
//!
//! # Show the inferred mapper registry
//! pipelinec mappers --index classes.json --format json
//!
//! # Run the pipeline description checks only
//! pipelinec check --pipeline pipeline.yaml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pipeline_compiler::compiler::mapper_table;
use pipeline_compiler::{
    load_pipeline_str, CompilationFailed, CompilerConfig, ConfigLoader, MemorySymbolIndex,
    PipelineCompiler, PipelineDefinition,
};

#[derive(Parser)]
#[command(name = "pipelinec")]
#[command(version)]
#[command(about = "Resolve, type-check and expand a declarative step pipeline")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,

    /// Compiler config file (falls back to PIPELINE_COMPILER_CONFIG)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a pipeline: resolve, normalize, check mappers, expand aspects
    Compile {
        /// Pipeline description (YAML)
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Symbol index file (.yaml, .yml or .json)
        #[arg(short, long)]
        index: PathBuf,
    },

    /// Print the mapper registry inferred from a symbol index
    Mappers {
        /// Symbol index file (.yaml, .yml or .json)
        #[arg(short, long)]
        index: PathBuf,
    },

    /// Check a pipeline description without resolving anything
    Check {
        /// Pipeline description (YAML)
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pipeline_compiler=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = ConfigLoader::resolve(cli.config.as_deref())
        .load()
        .and_then(|config| match &cli.command {
            Commands::Compile { pipeline, index } => {
                cmd_compile(&config, pipeline, index, cli.format)
            }
            Commands::Mappers { index } => cmd_mappers(&config, index, cli.format),
            Commands::Check { pipeline } => cmd_check(&config, pipeline, cli.format),
        });

    match result {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Failed(failed)) => {
            report_failure(&failed, cli.format);
            ExitCode::FAILURE
        }
        Err(e) => {
            if cli.format == OutputFormat::Json {
                let output = serde_json::json!({ "success": false, "error": format!("{:#}", e) });
                println!("{}", output);
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

enum Outcome {
    Success,
    Failed(CompilationFailed),
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_compile(
    config: &CompilerConfig,
    pipeline: &Path,
    index: &Path,
    format: OutputFormat,
) -> Result<Outcome> {
    let definition = match read_pipeline(config, pipeline)? {
        Ok(definition) => definition,
        Err(failed) => return Ok(Outcome::Failed(failed)),
    };
    let index = load_index(index)?;

    let compiled = match PipelineCompiler::new(config.clone()).compile(&definition, &index) {
        Ok(compiled) => compiled,
        Err(failed) => return Ok(Outcome::Failed(failed)),
    };
    let summary = compiled.summary();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "success": true, "pipeline": summary });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Compiled '{}': {} steps, {} mappers",
                "OK".green(),
                summary.app_name,
                summary.steps.len(),
                summary.mappers.len()
            );
            for (i, step) in summary.steps.iter().enumerate() {
                let name = if step.side_effect {
                    step.name.cyan()
                } else {
                    step.name.bold()
                };
                println!(
                    "  [{}] {} {} -> {}",
                    i,
                    name,
                    step.input.as_deref().unwrap_or("()"),
                    step.output
                );
                if let Some(operator) = &step.operator {
                    println!("      {} {:?}", operator.dimmed(), step.role);
                }
            }
        }
    }
    Ok(Outcome::Success)
}

fn cmd_mappers(config: &CompilerConfig, index: &Path, format: OutputFormat) -> Result<Outcome> {
    let index = load_index(index)?;
    let registry = match PipelineCompiler::new(config.clone()).infer_mappers(&index) {
        Ok(registry) => registry,
        Err(failed) => return Ok(Outcome::Failed(failed)),
    };
    let table = mapper_table(&registry);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "success": true, "mappers": table });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("{} {} mappers", "OK".green(), table.len());
            for row in &table {
                println!("  {} {}", row.mapper.bold(), row.key);
                println!("      {} <-> {} <-> {}", row.external, row.wire_dto, row.domain);
            }
        }
    }
    Ok(Outcome::Success)
}

fn cmd_check(config: &CompilerConfig, pipeline: &Path, format: OutputFormat) -> Result<Outcome> {
    let definition = match read_pipeline(config, pipeline)? {
        Ok(definition) => definition,
        Err(failed) => return Ok(Outcome::Failed(failed)),
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "success": true, "pipeline": definition });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!(
                "{} '{}': {} steps, {} aspects",
                "OK".green(),
                definition.app_name,
                definition.steps.len(),
                definition.aspects.len()
            );
        }
    }
    Ok(Outcome::Success)
}

// =============================================================================
// HELPERS
// =============================================================================

fn read_pipeline(
    config: &CompilerConfig,
    path: &Path,
) -> Result<std::result::Result<PipelineDefinition, CompilationFailed>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline {}", path.display()))?;
    Ok(load_pipeline_str(&content, config.strict_aspect_config))
}

fn load_index(path: &Path) -> Result<MemorySymbolIndex> {
    let index = MemorySymbolIndex::from_path(path)
        .with_context(|| format!("Failed to load symbol index {}", path.display()))?;
    tracing::info!("Loaded {} classes from {}", index.len(), path.display());
    Ok(index)
}

fn report_failure(failed: &CompilationFailed, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "success": false, "errors": failed.errors });
            println!("{}", output);
        }
        OutputFormat::Text => {
            eprintln!(
                "{}: compilation failed with {} error(s)",
                "error".red().bold(),
                failed.errors.len()
            );
            for err in &failed.errors {
                eprintln!("  {} {}", format!("[{}]", err.phase).yellow(), err.kind);
            }
        }
    }
}
