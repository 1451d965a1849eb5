use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use mori_core::{
    Paragraph, Projection, StripMode, VisibilityFilter, accept_all_modifiers,
    convert_paras_to_html, strip_modifiers,
};
use mori_parser::{ParserConfig, StrictLog, TracingLog};
use smol_str::SmolStr;

#[derive(Parser)]
#[command(version, about = "Mori - inspect and transform paragraph document snapshots", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log structural operations, not just problems
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a snapshot into render entries and print them as JSON
    Parse {
        #[command(flatten)]
        input: ParseArgs,
    },
    /// Parse a snapshot, failing on the first document problem
    Validate {
        #[command(flatten)]
        input: ParseArgs,
    },
    /// Render a snapshot as HTML
    Html {
        /// Snapshot file (JSON array of paragraphs), or `-` for stdin
        source: PathBuf,

        /// Track-change projection to apply before rendering
        #[arg(long, value_enum, default_value_t = View::Redline)]
        view: View,
    },
    /// Accept every pending change and print the resulting snapshot
    Accept {
        /// Snapshot file (JSON array of paragraphs), or `-` for stdin
        source: PathBuf,
    },
}

#[derive(clap::Args)]
struct ParseArgs {
    /// Snapshot file (JSON array of paragraphs), or `-` for stdin
    source: PathBuf,

    /// Parser configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layers to include; paragraphs in other layers are skipped
    #[arg(long = "layer", env = "MORI_LAYERS", value_delimiter = ',')]
    layers: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum View {
    /// Every change applied
    Redline,
    /// Accepted changes applied, pending ones still marked
    Accepted,
    /// Deletes applied, inserts and changes kept
    NonBlame,
    /// No projection
    Raw,
}

impl View {
    fn mode(self) -> Option<StripMode> {
        match self {
            View::Redline => Some(StripMode::Redline),
            View::Accepted => Some(StripMode::Accepted),
            View::NonBlame => Some(StripMode::NonBlame),
            View::Raw => None,
        }
    }
}

fn main() -> Result<()> {
    init_miette()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse { input } => run_parse(input, false)?,
        Commands::Validate { input } => run_parse(input, true)?,
        Commands::Html { source, view } => {
            let paragraphs = read_snapshot(&source)?;
            let projected: Vec<Paragraph> = match view.mode() {
                Some(mode) => paragraphs
                    .iter()
                    .filter_map(|p| {
                        match strip_modifiers(p, mode, &VisibilityFilter::default()) {
                            Projection::Removed => None,
                            Projection::Paragraph(p) => Some(p),
                        }
                    })
                    .collect(),
                None => paragraphs,
            };
            println!("{}", convert_paras_to_html(&projected));
        }
        Commands::Accept { source } => {
            let mut paragraphs = read_snapshot(&source)?;
            let mut accepted = 0;
            for p in paragraphs.iter_mut() {
                accepted += accept_all_modifiers(p).into_diagnostic()?;
            }
            tracing::info!(accepted, "accepted pending changes");
            let out: Vec<Paragraph> = paragraphs
                .iter()
                .filter_map(|p| {
                    match strip_modifiers(p, StripMode::Accepted, &VisibilityFilter::default()) {
                        Projection::Removed => None,
                        Projection::Paragraph(p) => Some(p),
                    }
                })
                .collect();
            print_json(&out)?;
        }
    }

    Ok(())
}

fn run_parse(args: ParseArgs, strict: bool) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading config {}", path.display()))?;
            serde_json::from_str::<ParserConfig>(&text)
                .into_diagnostic()
                .wrap_err("invalid parser config")?
        }
        None => ParserConfig::default(),
    };
    let layers: Vec<SmolStr> = args
        .layers
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(SmolStr::from)
        .collect();

    let mut paragraphs = read_snapshot(&args.source)?;
    let parsed = if strict {
        mori_parser::parse_with(&mut paragraphs, &layers, &config, &mut StrictLog)?
    } else {
        mori_parser::parse_with(&mut paragraphs, &layers, &config, &mut TracingLog)?
    };
    tracing::debug!(
        entries = parsed.entries.len(),
        toc = parsed.toc.len(),
        words = parsed.totals.words,
        "parsed snapshot"
    );
    print_json(&parsed)
}

fn read_snapshot(source: &Path) -> Result<Vec<Paragraph>> {
    let text = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .into_diagnostic()?;
        buf
    } else {
        std::fs::read_to_string(source)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading snapshot {}", source.display()))?
    };
    serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err("snapshot is not a JSON array of paragraphs")
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
