use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

use mistype::batch::{clean_files, write_stats, BatchConfig};
use mistype::config::AppConfig;
use mistype::normalizer::{Normalizer, NormalizerConfig, PunctuationSet};
use mistype::parsers::OutputParser;
use mistype::prompts::{build_request, parse_vars, Catalogue, ChatResponse};
use mistype::{reader, TextAnalyzer};

#[derive(Parser, Debug)]
#[command(name = "mistype")]
#[command(about = "Clean teacher-submitted text while keeping quotes and file paths intact")]
#[command(version)]
struct Args {
    /// TOML config file ([normalizer], [analysis], catalogue)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strip stray mid-word punctuation; stdin to stdout, or files to <stem>_clean.txt
    Clean(CleanArgs),
    /// Print keywords and an extractive summary as JSON
    Analyze(AnalyzeArgs),
    /// Render a catalogue prompt and print the chat request JSON
    Prompt(PromptArgs),
    /// Extract the structured parts of a model reply as JSON
    Parse(ParseArgs),
}

#[derive(ClapArgs, Debug)]
struct CleanArgs {
    /// Files to clean; reads stdin when empty
    files: Vec<PathBuf>,

    /// Overwrite existing _clean.txt outputs
    #[arg(long)]
    overwrite_all: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path (file mode only)
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,

    /// Also strip - ' \ / between word characters
    #[arg(long)]
    extended: bool,

    /// Term to keep untouched (repeatable)
    #[arg(long = "protect", value_name = "TERM")]
    protect: Vec<String>,

    /// Files processed concurrently (default: CPU count)
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(ClapArgs, Debug)]
struct AnalyzeArgs {
    /// Input file; reads stdin when omitted
    file: Option<PathBuf>,

    /// Number of keywords
    #[arg(long)]
    keywords: Option<usize>,

    /// Number of summary sentences
    #[arg(long)]
    sentences: Option<usize>,

    /// Clean the text before analysing it
    #[arg(long)]
    clean: bool,
}

#[derive(ClapArgs, Debug)]
struct PromptArgs {
    /// Task name as written in the catalogue
    #[arg(long, required_unless_present = "list")]
    task: Option<String>,

    /// Prompt catalogue (TOML)
    #[arg(long)]
    catalogue: Option<PathBuf>,

    /// Template value as key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// List task names and exit
    #[arg(long)]
    list: bool,

    /// User text file; reads stdin when omitted
    file: Option<PathBuf>,
}

/// Reply layouts understood by `parse`
#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReplyKind {
    /// Numbered questions and `[ ]` calming strategies
    Reflection,
    /// `Task Instruction:` and `Support Prompt:` sections
    Literacy,
    /// Print the reply text only
    Content,
}

#[derive(ClapArgs, Debug)]
struct ParseArgs {
    /// Reply layout to extract
    #[arg(long, value_enum)]
    kind: ReplyKind,

    /// Input is the model's plain text rather than a chat response JSON
    #[arg(long)]
    text: bool,

    /// Reply file; reads stdin when omitted
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // WHY: stdout carries the cleaned text or JSON, so logs go to stderr
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(?args, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref()).await?;

    match args.command {
        Command::Clean(clean) => run_clean(clean, config).await,
        Command::Analyze(analyze) => run_analyze(analyze, config).await,
        Command::Prompt(prompt) => run_prompt(prompt, config).await,
        Command::Parse(parse) => run_parse(parse).await,
    }
}

async fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => reader::read_stdin().await,
    }
}

async fn run_clean(args: CleanArgs, config: AppConfig) -> Result<()> {
    let mut normalizer_config: NormalizerConfig = config.normalizer;
    if args.extended {
        normalizer_config.punctuation = PunctuationSet::Extended;
    }
    normalizer_config.protected_terms.extend(args.protect);
    let normalizer = Normalizer::new(normalizer_config)?;

    if args.files.is_empty() {
        let input = reader::read_stdin().await?;
        print!("{}", normalizer.normalize(&input));
        return Ok(());
    }

    let batch_config = BatchConfig {
        overwrite_all: args.overwrite_all,
        fail_fast: args.fail_fast,
        concurrency: args.jobs.unwrap_or_else(|| BatchConfig::default().concurrency),
        show_progress: !args.no_progress,
    };

    let stats = clean_files(&args.files, &normalizer, &batch_config).await?;
    write_stats(&args.stats_out, &stats).await?;

    let failed = stats.iter().filter(|s| s.is_failed()).count();
    let skipped = stats.iter().filter(|s| s.status == "skipped").count();

    println!("mistype v{} - clean complete", env!("CARGO_PKG_VERSION"));
    println!("  Cleaned: {} files", stats.len() - failed - skipped);
    println!("  Skipped: {skipped} files");
    if failed > 0 {
        println!("  Failed: {failed} files");
    }
    println!("  Stats written to {}", args.stats_out.display());

    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed to clean", stats.len());
    }
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs, config: AppConfig) -> Result<()> {
    let mut text = read_input(args.file.as_deref()).await?;
    if args.clean {
        text = Normalizer::new(config.normalizer)?.normalize(&text);
    }

    let analyzer = TextAnalyzer::new()?;
    let analysis = analyzer.analyze(
        &text,
        args.keywords.unwrap_or(config.analysis.keywords),
        args.sentences.unwrap_or(config.analysis.summary_sentences),
    );
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_prompt(args: PromptArgs, config: AppConfig) -> Result<()> {
    let Some(catalogue_path) = args.catalogue.or(config.catalogue) else {
        anyhow::bail!("No prompt catalogue given; pass --catalogue or set `catalogue` in the config file");
    };
    let catalogue = Catalogue::load(&catalogue_path).await?;

    if args.list {
        for task in catalogue.tasks() {
            println!("{task}");
        }
        return Ok(());
    }

    let Some(task) = args.task else {
        anyhow::bail!("--task is required unless --list is given");
    };
    let vars = parse_vars(args.set.as_slice())?;
    let user_input = read_input(args.file.as_deref()).await?;
    let normalizer = Normalizer::new(config.normalizer)?;

    let request = build_request(&catalogue, &task, &vars, &user_input, &normalizer)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

async fn run_parse(args: ParseArgs) -> Result<()> {
    let input = read_input(args.file.as_deref()).await?;
    let response;
    let reply = if args.text {
        input.as_str()
    } else {
        response = ChatResponse::from_json(&input)?;
        response.content()?
    };

    let parser = OutputParser::new()?;
    let json = match args.kind {
        ReplyKind::Reflection => {
            let sheet = parser.parse_reflection_sheet(reply);
            if sheet.questions.is_empty() {
                warn!("No numbered questions found in reply");
            }
            if sheet.strategies.is_empty() {
                warn!("No calming strategies found in reply");
            }
            serde_json::to_string_pretty(&sheet)?
        }
        ReplyKind::Literacy => {
            let activity = parser.parse_literacy_activity(reply);
            if activity.task_instruction.is_none() || activity.support_prompt.is_none() {
                warn!("Reply is missing a task instruction or support prompt");
            }
            serde_json::to_string_pretty(&activity)?
        }
        ReplyKind::Content => {
            println!("{reply}");
            return Ok(());
        }
    };
    println!("{json}");
    Ok(())
}
