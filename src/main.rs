mod classify;
mod preferences;
mod render;
mod segment;
mod summary;
mod transcript;

use anyhow::{Context, Result};
use clap::Parser;
use preferences::{OutputFormat, Preferences};
use render::RenderInput;
use segment::Segmenter;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{Level, debug, info, warn};
use transcript::Transcript;

/// Render AI coding assistant conversation logs as console text or HTML.
#[derive(Debug, Parser)]
#[command(name = "transcriptor", version)]
struct Cli {
    /// JSONL transcript files, or directories of them (combined in order).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output format. Defaults to html when --output ends in .html.
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Preferences file (default: ./transcriptor.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Document title when the transcript has none.
    #[arg(long)]
    title: Option<String>,

    /// Leave assistant thinking out of the output.
    #[arg(long)]
    hide_thinking: bool,

    /// Log debug detail to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Expand directories into their `*.jsonl` files, sorted by name.
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in fs::read_dir(path).with_context(|| format!("listing {}", path.display()))? {
                let entry = entry.with_context(|| format!("listing {}", path.display()))?;
                let p = entry.path();
                if p.extension().is_some_and(|ext| ext == "jsonl") {
                    found.push(p);
                }
            }
            found.sort();
            if found.is_empty() {
                warn!(dir = %path.display(), "no .jsonl files in directory");
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn read_transcript(path: &Path) -> Result<Transcript> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading transcript {}", path.display()))?;
    let (transcript, errors) = Transcript::parse(&contents);
    for (line, err) in &errors {
        warn!(file = %path.display(), line, "transcript parse error: {err}");
    }
    debug!(
        file = %path.display(),
        entries = transcript.entries().len(),
        skipped = errors.len(),
        "parsed transcript"
    );
    Ok(transcript)
}

fn resolve_format(cli: &Cli, prefs: &Preferences) -> OutputFormat {
    if let Some(format) = cli.format {
        return format;
    }
    let html_output = cli
        .output
        .as_deref()
        .and_then(Path::extension)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));
    if html_output {
        OutputFormat::Html
    } else {
        prefs.format
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut prefs = match &cli.config {
        Some(path) => Preferences::load(path)?,
        None => Preferences::discover(Path::new("."))?,
    };
    if let Some(title) = &cli.title {
        prefs.title = Some(title.clone());
    }
    if cli.hide_thinking {
        prefs.show_thinking = false;
    }
    let format = resolve_format(cli, &prefs);

    let files = collect_inputs(&cli.inputs)?;
    let parts = files
        .iter()
        .map(|f| read_transcript(f))
        .collect::<Result<Vec<_>>>()?;
    let transcript = Transcript::merge(parts);

    let groups = Segmenter::new(&prefs.shell_tool).segment(transcript.entries());
    info!(
        files = files.len(),
        entries = transcript.entries().len(),
        tool_turns = transcript
            .entries()
            .iter()
            .filter(|e| classify::has_tool_invocation(e))
            .count(),
        groups = groups.len(),
        "segmented conversation"
    );

    let options = prefs.render_options();
    let input = RenderInput {
        transcript: &transcript,
        groups: &groups,
        options: &options,
    };
    let rendered = match format {
        OutputFormat::Text => render::render_text(&input),
        OutputFormat::Html => render::render_html(&input)?,
    };

    match &cli.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("writing to stdout")?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("transcriptor: {err:#}");
        process::exit(2);
    }
}
