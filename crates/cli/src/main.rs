use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use context_code_splitter::{
    Chunk, ChunkOrigin, GapPolicy, Granularity, LanguageRegistry, SharedRegistry, SplitResult,
    Splitter, SplitterConfig,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "context-split")]
#[command(about = "Split source files into syntax-aligned chunks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file (or stdin) into chunks
    Split(SplitArgs),

    /// List registered languages
    Languages(LanguagesArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// File to split, or `-` for stdin
    input: PathBuf,

    /// Language name or alias (defaults to detection by file extension)
    #[arg(short, long)]
    language: Option<String>,

    /// Cut chunks longer than this many lines into windows
    #[arg(long)]
    max_chunk_lines: Option<usize>,

    /// Window size when no grammar is usable
    #[arg(long, default_value_t = 50)]
    fallback_window: usize,

    /// Which of the nested declarations own their lines
    #[arg(long, value_enum, default_value = "outermost")]
    granularity: GranularityFlag,

    /// Merge the lines before a declaration into it
    #[arg(long)]
    attach_leading: bool,

    /// TOML file with additional language entries
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LanguagesArgs {
    /// TOML file with additional language entries
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum GranularityFlag {
    Outermost,
    Nested,
}

impl From<GranularityFlag> for Granularity {
    fn from(flag: GranularityFlag) -> Self {
        match flag {
            GranularityFlag::Outermost => Self::Outermost,
            GranularityFlag::Nested => Self::Nested,
        }
    }
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Split(args) => args.json,
        Commands::Languages(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Split(args) => run_split(args)?,
        Commands::Languages(args) => run_languages(args)?,
    }

    Ok(())
}

fn run_split(args: SplitArgs) -> Result<()> {
    let config = SplitterConfig {
        max_chunk_lines: args.max_chunk_lines,
        fallback_window_lines: args.fallback_window,
        granularity: args.granularity.into(),
        gap_policy: if args.attach_leading {
            GapPolicy::AttachLeading
        } else {
            GapPolicy::Standalone
        },
    };
    let registry = load_registry(args.registry.as_deref())?;
    let splitter = Splitter::with_registry(config, registry).context("Invalid splitter options")?;

    let (text, path) = read_input(&args.input)?;
    log::debug!("Splitting {} bytes from {}", text.len(), args.input.display());
    let result = splitter.split(&text, args.language.as_deref(), path.as_deref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_chunks(&result);
    }
    Ok(())
}

fn run_languages(args: LanguagesArgs) -> Result<()> {
    let registry = load_registry(args.registry.as_deref())?.snapshot();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&languages_json(&registry))?);
        return Ok(());
    }

    for config in registry.languages() {
        let aliases = config.aliases().join(", ");
        let extensions: Vec<_> = config.extensions().collect();
        let grammar = if config.grammar_status().is_available() {
            "available"
        } else {
            "unavailable"
        };
        println!(
            "{:<12} aliases: [{}] extensions: [{}] grammar: {}",
            config.identifier(),
            aliases,
            extensions.join(", "),
            grammar
        );
    }
    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<Arc<SharedRegistry>> {
    let registry = SharedRegistry::new(LanguageRegistry::with_defaults());
    if let Some(path) = path {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file {}", path.display()))?;
        registry
            .load_toml(&source)
            .with_context(|| format!("Invalid registry file {}", path.display()))?;
    }
    Ok(Arc::new(registry))
}

fn read_input(input: &Path) -> Result<(String, Option<String>)> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok((text, None));
    }

    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok((text, Some(input.to_string_lossy().into_owned())))
}

fn print_chunks(result: &SplitResult) {
    if let Some(reason) = &result.fallback {
        eprintln!("Line windows used ({reason})");
    }
    for (idx, chunk) in result.iter().enumerate() {
        println!("--- #{idx} {}", chunk_label(chunk));
        print!("{}", chunk.content);
        if !chunk.content.ends_with('\n') {
            println!();
        }
    }
    eprintln!("{}", result.stats());
}

fn chunk_label(chunk: &Chunk) -> String {
    let origin = match chunk.metadata.origin {
        ChunkOrigin::Declaration => "declaration",
        ChunkOrigin::Residual => "residual",
        ChunkOrigin::Gap => "gap",
        ChunkOrigin::Fallback => "fallback",
    };
    let mut label = format!(
        "{} lines {}-{} {}",
        chunk.language, chunk.start_line, chunk.end_line, origin
    );
    if let Some(node_type) = &chunk.metadata.node_type {
        label.push(' ');
        label.push_str(node_type);
    }
    if let Some(name) = &chunk.metadata.symbol_name {
        label.push(' ');
        label.push_str(name);
    }
    if let Some(part) = chunk.metadata.part {
        label.push_str(&format!(" ({}/{})", part.index + 1, part.count));
    }
    label
}

fn languages_json(registry: &LanguageRegistry) -> serde_json::Value {
    registry
        .languages()
        .map(|config| {
            serde_json::json!({
                "identifier": config.identifier(),
                "aliases": config.aliases(),
                "extensions": config.extensions().collect::<Vec<_>>(),
                "boundary_node_types": config.boundary_node_types(),
                "grammar_available": config.grammar_status().is_available(),
            })
        })
        .collect()
}
