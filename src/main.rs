use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use fxml_compiler::{
    compile_batch, discover_documents, parse_expression, write_output, CompilerConfig,
    FsSourceLoader, IncrementalCache, TableProvider,
};

#[derive(Parser)]
#[clap(name = "fxmlc", about = "Compiles FXML documents into Java builder classes")]
struct Cli {
    #[clap(short, long, help = "Verbose output")]
    verbose: bool,

    #[clap(short, long, help = "Configuration file (defaults to ./fxmlc.json when present)")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[clap(about = "Compile every document under the source root")]
    Compile {
        #[clap(short, long, help = "Source root")]
        source_root: Option<PathBuf>,

        #[clap(short, long, help = "Output directory")]
        output: Option<PathBuf>,

        #[clap(short = 'p', long, help = "Root package of generated classes")]
        root_package: Option<String>,

        #[clap(long, help = "Abort on the first failing document")]
        strict: bool,

        #[clap(short, long, help = "Component library table (JSON), repeatable")]
        metadata: Vec<PathBuf>,

        #[clap(long, help = "Compile documents one at a time")]
        sequential: bool,
    },

    #[clap(about = "Compile without writing output, reporting errors as JSON")]
    Check {
        #[clap(short, long, help = "Source root")]
        source_root: Option<PathBuf>,

        #[clap(short, long, help = "Component library table (JSON), repeatable")]
        metadata: Vec<PathBuf>,
    },

    #[clap(about = "Parse a bind expression and print its canonical form")]
    ParseExpr {
        #[clap(help = "Expression source")]
        expression: String,
    },
}

fn load_config(cli: &Cli) -> Result<CompilerConfig, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => CompilerConfig::load(path)?,
        None => CompilerConfig::discover(&std::env::current_dir()?)?,
    };
    Ok(config)
}

fn load_provider(config: &CompilerConfig) -> Result<TableProvider, Box<dyn std::error::Error>> {
    let mut provider = TableProvider::with_builtins();
    for path in &config.metadata {
        provider.load(path)?;
    }
    info!("Loaded {} types", provider.len());
    Ok(provider)
}

fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Compile {
            source_root,
            output,
            root_package,
            strict,
            metadata,
            sequential,
        } => {
            if let Some(root) = source_root {
                config.source_root = root;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(package) = root_package {
                config.root_package = package;
            }
            config.strict |= strict;
            config.parallel &= !sequential;
            config.metadata.extend(metadata);
            config.validate()?;

            let provider = load_provider(&config)?;
            let loader = FsSourceLoader::new(&config.source_root);
            let documents = discover_documents(&config.source_root, &config.includes, &config.excludes)?;
            let cache = config.cache_dir.as_deref().map(IncrementalCache::new);

            let output = compile_batch(&documents, &provider, &loader, &config, cache.as_ref())?;
            for failure in &output.failures {
                error!("{}", serde_json::to_string(failure)?);
            }
            write_output(&output, &config, &config.output_dir)?;
            Ok(output.failures.is_empty())
        }
        Commands::Check { source_root, metadata } => {
            if let Some(root) = source_root {
                config.source_root = root;
            }
            config.metadata.extend(metadata);
            config.strict = false;

            let provider = load_provider(&config)?;
            let loader = FsSourceLoader::new(&config.source_root);
            let documents = discover_documents(&config.source_root, &config.includes, &config.excludes)?;
            let output = compile_batch(&documents, &provider, &loader, &config, None)?;
            println!("{}", serde_json::to_string_pretty(&output.failures)?);
            Ok(output.failures.is_empty())
        }
        Commands::ParseExpr { expression } => {
            let parsed = parse_expression(&expression)?;
            println!("{}", parsed);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
