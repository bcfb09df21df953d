//! Command-line interface for the umlgen utility
//!
//! Parses a diagram document, builds the class model and generates code into
//! an output tree, merging into files that already exist.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, span, Level};

use crate::colorizer::{render_model, render_summary};
use umlgen::codegen::{Capability, CapabilitySet, GeneratorRegistry};
use umlgen::core::logging::init_logging;
use umlgen::generation::{GenerationMode, GenerationOptions, IncrementalGenerationManager};
use umlgen::merge::ConflictPolicy;
use umlgen::model::{Model, ModelBuilder, RelationshipStrictness};
use umlgen::plugins::Orchestrator;

/// umlgen - Generate code from UML diagrams
#[derive(Parser)]
#[command(name = "umlgen")]
#[command(about = "Generate entities, repositories, services and controllers from UML diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error|off)
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate code from a diagram document
    Generate {
        /// Input diagram document (use - for stdin)
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "generated")]
        output: PathBuf,

        /// Package or namespace for generated code
        #[arg(short, long)]
        package: Option<String>,

        /// Target language or framework alias
        #[arg(short, long, default_value = "java")]
        language: String,

        /// Also generate services
        #[arg(long)]
        with_services: bool,

        /// Also generate controllers
        #[arg(long)]
        with_controllers: bool,

        /// Also generate repositories
        #[arg(long)]
        with_repositories: bool,

        /// Also generate SQL migrations
        #[arg(long)]
        with_migrations: bool,

        /// Merge into existing files instead of overwriting them
        #[arg(long)]
        incremental: bool,

        /// Fail on relationships that reference undeclared classes
        #[arg(long)]
        strict: bool,

        /// How to treat declarations whose signature changed
        #[arg(long, value_enum, default_value_t = ConflictChoice::ExistingWins)]
        conflicts: ConflictChoice,

        /// Worker threads (defaults to available parallelism)
        #[arg(long)]
        workers: Option<usize>,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        report: ReportFormat,

        /// When to use colors in output
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// Parse a document and build the class model without generating code
    Validate {
        /// Input diagram document (use - for stdin)
        input: PathBuf,

        /// Fail on relationships that reference undeclared classes
        #[arg(long)]
        strict: bool,

        /// When to use colors in output
        #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
        color: ColorChoice,
    },

    /// List the registered target languages
    Languages {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Conflict policy for same-name declarations with different signatures
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ConflictChoice {
    /// Keep the existing declaration and report it
    #[default]
    ExistingWins,
    /// Refuse to merge the file
    Report,
}

impl From<ConflictChoice> for ConflictPolicy {
    fn from(value: ConflictChoice) -> Self {
        match value {
            ConflictChoice::ExistingWins => ConflictPolicy::ExistingWins,
            ConflictChoice::Report => ConflictPolicy::Report,
        }
    }
}

/// Generation report output
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// When to colorize output
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Use colors if stdout is a terminal and NO_COLOR is not set
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none()
                    && crossterm::tty::IsTty::is_tty(&std::io::stdout())
            }
        }
    }
}

/// Main CLI application
pub struct UmlgenApp {
    orchestrator: Orchestrator,
    registry: GeneratorRegistry,
}

impl UmlgenApp {
    /// Create an application with every dialect and language registered
    pub fn new() -> Self {
        Self {
            orchestrator: Orchestrator::with_all_plugins(),
            registry: GeneratorRegistry::with_defaults(),
        }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        let level = cli
            .log_level
            .map(|l| l.as_str())
            .or(if cli.verbose { Some("debug") } else { None });
        if let Err(e) = init_logging(level, cli.log_format.map(|f| f.as_str())) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("umlgen v{}", env!("CARGO_PKG_VERSION"));
        }

        let command = match &cli.command {
            Commands::Generate { .. } => "generate",
            Commands::Validate { .. } => "validate",
            Commands::Languages { .. } => "languages",
        };
        let span = span!(Level::INFO, "command", command);
        let _enter = span.enter();

        match cli.command {
            Commands::Generate {
                input,
                output,
                package,
                language,
                with_services,
                with_controllers,
                with_repositories,
                with_migrations,
                incremental,
                strict,
                conflicts,
                workers,
                report,
                color,
            } => {
                let mut capabilities = CapabilitySet::entities_only();
                for (enabled, capability) in [
                    (with_repositories, Capability::Repository),
                    (with_services, Capability::Service),
                    (with_controllers, Capability::Controller),
                    (with_migrations, Capability::Migration),
                ] {
                    if enabled {
                        capabilities = capabilities.with(capability);
                    }
                }
                let options = GenerationOptions {
                    package,
                    capabilities,
                    mode: if incremental {
                        GenerationMode::Incremental
                    } else {
                        GenerationMode::Overwrite
                    },
                    workers,
                    conflict_policy: conflicts.into(),
                };
                self.generate_command(&input, &output, &language, strict, options, report, color)
            }
            Commands::Validate {
                input,
                strict,
                color,
            } => self.validate_command(&input, strict, color, cli.verbose),
            Commands::Languages { json } => self.languages_command(json),
        }
    }

    /// Handle the generate command
    #[allow(clippy::too_many_arguments)]
    fn generate_command(
        &self,
        input: &Path,
        output: &Path,
        language: &str,
        strict: bool,
        options: GenerationOptions,
        report: ReportFormat,
        color: ColorChoice,
    ) -> Result<()> {
        // Unknown languages fail before the diagram is even read
        self.registry.resolve(language)?;

        let model = self.load_model(input, strict)?;
        for warning in &model.warnings {
            eprintln!("warning: {}", warning);
        }

        let manager = IncrementalGenerationManager::new(&self.registry, options);
        let summary = manager.generate(model.classes(), language, output)?;

        match report {
            ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            ReportFormat::Text => print!("{}", render_summary(&summary, color.enabled())),
        }

        if summary.has_failures() {
            return Err(anyhow!("{} file(s) could not be generated", summary.counts.failed));
        }
        Ok(())
    }

    /// Handle the validate command
    fn validate_command(&self, input: &Path, strict: bool, color: ColorChoice, verbose: bool) -> Result<()> {
        let model = self.load_model(input, strict)?;
        if verbose {
            eprintln!("Built {} classes", model.len());
        }
        print!("{}", render_model(&model, color.enabled()));
        Ok(())
    }

    /// Handle the languages command
    fn languages_command(&self, json: bool) -> Result<()> {
        let languages = self.registry.languages();
        if json {
            let entries: Vec<serde_json::Value> = languages
                .iter()
                .map(|language| {
                    serde_json::json!({
                        "language": language,
                        "aliases": self.registry.aliases_of(language),
                        "syntax": self.registry.resolve(language).ok().map(|g| g.syntax()),
                    })
                })
                .collect();
            let listing = serde_json::json!({
                "languages": entries,
                "total": languages.len(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            println!("Supported languages:");
            for language in &languages {
                let aliases = self.registry.aliases_of(language);
                if aliases.is_empty() {
                    println!("  {}", language);
                } else {
                    println!("  {:<12} (aliases: {})", language, aliases.join(", "));
                }
            }
            println!();
            println!("Total: {} languages", languages.len());
        }
        Ok(())
    }

    fn load_model(&self, input: &Path, strict: bool) -> Result<Model> {
        let content = self.read_input(input)?;
        let diagram = self.orchestrator.parse(&content)?;
        debug!(input = %input.display(), bytes = content.len(), "Parsed diagram");
        let strictness = if strict {
            RelationshipStrictness::Strict
        } else {
            RelationshipStrictness::Lenient
        };
        Ok(ModelBuilder::new().with_strictness(strictness).build(&diagram)?)
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: &Path) -> Result<String> {
        if input.to_string_lossy() == "-" {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        } else {
            fs::read_to_string(input)
                .with_context(|| format!("Failed to read input file '{}'", input.display()))
        }
    }
}

impl Default for UmlgenApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parsing_generate_command() {
        let args = vec![
            "umlgen",
            "generate",
            "model.mmd",
            "--output",
            "out",
            "-l",
            "ts",
            "--with-services",
            "--incremental",
            "--conflicts",
            "report",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Generate {
                input,
                output,
                language,
                with_services,
                with_controllers,
                incremental,
                conflicts,
                report,
                color,
                ..
            } => {
                assert_eq!(input.to_string_lossy(), "model.mmd");
                assert_eq!(output.to_string_lossy(), "out");
                assert_eq!(language, "ts");
                assert!(with_services);
                assert!(!with_controllers);
                assert!(incremental);
                assert_eq!(conflicts, ConflictChoice::Report);
                assert_eq!(report, ReportFormat::Text); // default
                assert_eq!(color, ColorChoice::Auto); // default
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parsing_defaults() {
        let cli = Cli::try_parse_from(["umlgen", "generate", "model.mmd"]).unwrap();
        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::Generate {
                output, language, ..
            } => {
                assert_eq!(output.to_string_lossy(), "generated");
                assert_eq!(language, "java");
            }
            _ => panic!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parsing_global_log_flags() {
        let cli = Cli::try_parse_from(["umlgen", "languages", "--json", "--log-level", "off"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Off));
        assert!(matches!(cli.command, Commands::Languages { json: true }));
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["umlgen", "generate"]).is_err());
    }

    #[test]
    fn test_load_model_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.mmd");
        fs::write(&path, "classDiagram\n    class Invoice {\n        +String number\n    }\n").unwrap();

        let app = UmlgenApp::new();
        let model = app.load_model(&path, false).unwrap();
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_load_model_missing_file() {
        let app = UmlgenApp::new();
        let err = app.load_model(Path::new("/nonexistent/model.mmd"), false).unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }
}
