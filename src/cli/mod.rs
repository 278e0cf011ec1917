//! Command-line interface for shop-export
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading
//! - Dispatch of the `list`, `run` and `config` subcommands

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use chrono::Local;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};
use tracing::Level;

use crate::config::Config;
use crate::context::Abort;
use crate::error::Result;
use crate::host::{ExportRunner, ExportSummary, default_file_name};
use crate::provider::{ProviderDescriptor, ProviderRegistry, default_registry};
use crate::segment::JsonLinesSegmenter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "shop-export")]
#[command(author, version, about = "Bulk export of storefront data", long_about = None)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (no summary output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available export providers
    List,

    /// Run one export
    Run {
        /// Provider system name, e.g. Exports.ProductXml
        #[arg(short = 'p', long, value_name = "NAME")]
        provider: String,

        /// JSON Lines file with one record per line
        #[arg(short = 'i', long, value_name = "FILE")]
        input: PathBuf,

        /// Output file, generated in the output directory when omitted
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Records per segment
        #[arg(long, value_name = "N")]
        page_size: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    args: CliArgs,
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build the interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Config::load(args.config_file.as_deref())?;
        Ok(Self { args, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Effective log level: flags win over the configured level
    pub fn log_level(&self) -> Level {
        if self.args.very_verbose {
            Level::TRACE
        } else if self.args.verbose {
            Level::DEBUG
        } else {
            self.config.logging.level.to_tracing_level()
        }
    }

    /// Handle the selected subcommand
    ///
    /// # Returns
    /// * `Result<bool>` - False when an export ended incomplete
    pub async fn handle_command(&self) -> Result<bool> {
        match &self.args.command {
            Commands::List => {
                let registry = default_registry()?;
                println!("{}", provider_table(&registry.descriptors()));
                Ok(true)
            }
            Commands::Run {
                provider,
                input,
                output,
                page_size,
                no_progress,
            } => {
                let summary = self
                    .run_export(provider, input, output.as_deref(), *page_size, *no_progress)
                    .await?;
                if !self.args.quiet {
                    print_summary(&summary);
                }
                Ok(summary.is_complete())
            }
            Commands::Config { show } => {
                if *show {
                    self.show_config()?;
                } else {
                    println!("Configuration file: {}", self.config_path().display());
                }
                Ok(true)
            }
        }
    }

    async fn run_export(
        &self,
        system_name: &str,
        input: &Path,
        output: Option<&Path>,
        page_size: Option<usize>,
        no_progress: bool,
    ) -> Result<ExportSummary> {
        let registry = default_registry()?;
        let output = self.output_path(&registry, system_name, output)?;
        let page_size = page_size.unwrap_or(self.config.export.page_size);
        let segmenter = JsonLinesSegmenter::open(input, page_size).await?;
        let settings = self.config.provider_settings(system_name)?;

        let show_progress = self.config.export.show_progress && !no_progress && !self.args.quiet;
        let runner = ExportRunner::new(registry)
            .with_services(self.config.services.build())
            .with_app_version(self.config.export.app_version.as_str())
            .with_progress(show_progress);

        let abort = runner.abort_handle();
        let ctrl_c_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    abort.abort_user();
                }
                Err(err) => {
                    eprintln!("Failed to listen for Ctrl+C: {}", err);
                }
            }
        });

        let result = runner
            .run(system_name, Box::new(segmenter), &output, settings)
            .await;
        ctrl_c_handle.abort();
        result
    }

    /// Resolve the output file of a run
    fn output_path(
        &self,
        registry: &ProviderRegistry,
        system_name: &str,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        if let Some(path) = output {
            return Ok(path.to_path_buf());
        }
        let provider = registry.get(system_name)?;
        let file_name = default_file_name(provider.descriptor(), Local::now());
        Ok(self.config.export.output_directory.join(file_name))
    }

    fn show_config(&self) -> Result<()> {
        println!("Configuration file: {}", self.config_path().display());
        println!();
        println!("{}", self.config.to_toml_string()?);
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}

/// Render provider descriptors as a table
pub fn provider_table(descriptors: &[ProviderDescriptor]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["System name", "Name", "Entity", "Extension", "Settings"]);

    for descriptor in descriptors {
        let settings = descriptor
            .configuration
            .as_ref()
            .map(|c| c.description.clone())
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            descriptor.system_name.clone(),
            descriptor.friendly_name.clone(),
            descriptor.entity_type.to_string(),
            descriptor.extension(),
            settings,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn print_summary(summary: &ExportSummary) {
    for entry in &summary.log {
        if entry.level <= Level::WARN {
            eprintln!("{}", entry);
        }
    }

    let status = match summary.abort {
        Abort::None => "completed",
        Abort::User => "cancelled",
        Abort::Error => "failed",
    };
    println!(
        "{} {}: {} records written, {} failed ({} bytes, {} ms)",
        summary.system_name,
        status,
        summary.records_succeeded,
        summary.records_failed,
        summary.file_size_bytes,
        summary.elapsed_ms
    );
    println!("Output: {}", summary.file_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parsing() {
        let args = CliArgs::try_parse_from([
            "shop-export",
            "run",
            "--provider",
            "Exports.ProductXml",
            "--input",
            "products.jsonl",
            "--page-size",
            "50",
            "-q",
        ])
        .unwrap();

        assert!(args.quiet);
        match args.command {
            Commands::Run {
                provider,
                input,
                output,
                page_size,
                no_progress,
            } => {
                assert_eq!(provider, "Exports.ProductXml");
                assert_eq!(input, PathBuf::from("products.jsonl"));
                assert!(output.is_none());
                assert_eq!(page_size, Some(50));
                assert!(!no_progress);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_provider() {
        assert!(CliArgs::try_parse_from(["shop-export", "run", "--input", "x.jsonl"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from(["shop-export", "list", "--vv"]).unwrap();
        assert!(args.very_verbose);
        assert!(matches!(args.command, Commands::List));
    }

    #[test]
    fn test_log_level_priority() {
        let args = CliArgs::try_parse_from(["shop-export", "-v", "list"]).unwrap();
        let cli = CliInterface {
            args,
            config: Config::default(),
        };
        assert_eq!(cli.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_output_path() {
        let args = CliArgs::try_parse_from(["shop-export", "list"]).unwrap();
        let mut config = Config::default();
        config.export.output_directory = PathBuf::from("exports");
        let cli = CliInterface { args, config };
        let registry = default_registry().unwrap();

        let explicit = cli
            .output_path(&registry, "Exports.ProductXml", Some(Path::new("out.xml")))
            .unwrap();
        assert_eq!(explicit, PathBuf::from("out.xml"));

        let generated = cli
            .output_path(&registry, "Exports.SubscriberCsv", None)
            .unwrap();
        assert!(generated.starts_with("exports"));
        let name = generated.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Exports.SubscriberCsv-"));
        assert!(name.ends_with(".csv"));

        assert!(cli.output_path(&registry, "Exports.Nope", None).is_err());
    }

    #[test]
    fn test_provider_table() {
        let registry = default_registry().unwrap();
        let table = provider_table(&registry.descriptors());
        assert!(table.contains("System name"));
        assert!(table.contains("Exports.ProductXlsx"));
        assert!(table.contains("xlsx"));
    }

    #[tokio::test]
    async fn test_run_export_from_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("subscribers.jsonl");
        std::fs::write(
            &input,
            "{\"Id\":1,\"Email\":\"a@example.com\",\"Active\":true,\"StoreId\":1}\n",
        )
        .unwrap();
        let output = dir.path().join("subscribers.csv");

        let args = CliArgs::try_parse_from(["shop-export", "list"]).unwrap();
        let cli = CliInterface {
            args,
            config: Config::default(),
        };

        let summary = cli
            .run_export("Exports.SubscriberCsv", &input, Some(&output), None, true)
            .await
            .unwrap();
        assert_eq!(summary.records_succeeded, 1);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "a@example.com,True,1\r\n"
        );
    }

    #[tokio::test]
    async fn test_run_export_uses_configured_services() {
        use crate::config::StoreMappingConfig;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("products.jsonl");
        std::fs::write(&input, "{\"Id\":7,\"Name\":\"Desk\"}\n").unwrap();
        let output = dir.path().join("products.xml");

        let args = CliArgs::try_parse_from(["shop-export", "list"]).unwrap();
        let mut config = Config::default();
        config.services.store_mappings.push(StoreMappingConfig {
            entity_name: "Product".to_string(),
            entity_id: 7,
            store_ids: vec![4],
        });
        let cli = CliInterface { args, config };

        let summary = cli
            .run_export("Exports.ProductXml", &input, Some(&output), None, true)
            .await
            .unwrap();
        assert_eq!(summary.records_succeeded, 1);
        assert!(std::fs::read_to_string(&output)
            .unwrap()
            .contains("<StoreIds>\n\t\t\t<StoreId>4</StoreId>\n\t\t</StoreIds>"));
    }
}
