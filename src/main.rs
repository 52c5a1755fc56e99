//! tmpl-replace CLI
//!
//! Usage:
//!   tmpl-replace [OPTIONS] [FILE]
//!   tmpl-replace --config tmpl.toml
//!
//! Options:
//!   -r, --replacements <FILE[#SELECT]>  JSON/TOML replacement source (repeatable, first wins)
//!   -s, --set <KEY=VALUE>               Inline replacement (repeatable, wins over files)
//!   -p, --prefix <PREFIX>               Required placeholder prefix (default: package)
//!   -u, --unprefixed                    Match @key@ placeholders
//!   -c, --config <FILE>                 Render every template described by a project file
//!   -h, --help                          Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use tracing::Level;

use tmpl_replace::config::{self, ProjectConfig};
use tmpl_replace::source;
use tmpl_replace::{pipeline, Diagnostic, Document, Engine, Mapping, Replacements, TemplateConfig};

#[derive(Parser)]
#[command(name = "tmpl-replace")]
#[command(about = "Replace @package.key@ placeholders in template files")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Write the rendered document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replacement source: a .json or .toml file, optionally FILE#SELECT
    #[arg(short, long = "replacements", value_name = "FILE[#SELECT]")]
    replacements: Vec<String>,

    /// Inline replacement value
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Required placeholder prefix
    #[arg(short, long)]
    prefix: Option<String>,

    /// Match @key@ placeholders without a prefix
    #[arg(short, long)]
    unprefixed: bool,

    /// Project file describing a whole templates step
    #[arg(short, long, conflicts_with_all = ["input", "output", "replacements", "set", "prefix", "unprefixed"])]
    config: Option<PathBuf>,

    /// Label used for the document in diagnostics
    #[arg(long)]
    path_label: Option<String>,

    /// Exit with an error when any placeholder could not be resolved
    #[arg(long)]
    strict: bool,

    /// Show diagnostics as annotated source reports
    #[arg(long)]
    report: bool,

    /// Log the placeholder mode, the merged replacements and each rendered file
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    if needs_usage(&cli, io::stdin().is_terminal()) {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Error printing help: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let project = cli.config.as_deref().map(|path| (path, load_project(path)));

    tracing_subscriber::fmt()
        .with_max_level(log_level(debug_enabled(
            &cli,
            project.as_ref().map(|(_, p)| p),
        )))
        .with_writer(io::stderr)
        .init();

    let failed = match project {
        Some((path, project)) => run_project(&cli, path, project),
        None => run_single(&cli),
    };

    if failed {
        std::process::exit(1);
    }
}

/// Nothing to read: no input file, no project, and stdin is interactive
fn needs_usage(cli: &Cli, stdin_is_terminal: bool) -> bool {
    cli.input.is_none() && cli.config.is_none() && stdin_is_terminal
}

fn debug_enabled(cli: &Cli, project: Option<&ProjectConfig>) -> bool {
    cli.debug || project.is_some_and(|p| p.templates.debug)
}

fn log_level(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

fn load_project(path: &Path) -> ProjectConfig {
    match ProjectConfig::from_file(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading project '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Render one document; returns true when the run should fail
fn run_single(cli: &Cli) -> bool {
    let replacements = match load_replacements(cli) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading replacements: {}", e);
            std::process::exit(1);
        }
    };

    let config = TemplateConfig {
        replacements,
        prefix: cli.prefix.clone(),
        unprefixed: cli.unprefixed,
        debug: cli.debug,
    };
    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let label = match (&cli.path_label, &cli.input) {
        (Some(label), _) => label.clone(),
        (None, Some(path)) => path.display().to_string(),
        (None, None) => "<stdin>".to_string(),
    };

    let rendered = engine.apply(&Document::new(&source, &label));
    print_diagnostics(&rendered.diagnostics, &source, cli.report);

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &rendered.text) {
                eprintln!("Error writing file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        }
        None => print!("{}", rendered.text),
    }

    cli.strict && !rendered.is_clean()
}

/// `--set` values first, then each `--replacements` file in order
fn load_replacements(cli: &Cli) -> Result<Option<Replacements>, source::SourceError> {
    let mut sources: Vec<Mapping> = Vec::new();
    if !cli.set.is_empty() {
        sources.push(source::from_assignments(&cli.set[..])?);
    }
    for arg in &cli.replacements {
        let (path, select) = source::split_selector(arg);
        sources.push(source::load_file(&path, select.as_deref(), None)?);
    }
    Ok((!sources.is_empty()).then_some(Replacements::Ordered(sources)))
}

/// Run the templates step of a project file; returns true when the run should fail
fn run_project(cli: &Cli, path: &Path, mut project: ProjectConfig) -> bool {
    let base = config::base_dir(path);
    project.templates.debug |= cli.debug;

    let engine = match project.engine(&base) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let job = project.job(&base);
    let reports = match pipeline::run(&engine, &job) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut unresolved = 0;
    for report in &reports {
        print_diagnostics(&report.diagnostics, &report.source, cli.report);
        unresolved += report.diagnostics.len();
    }
    eprintln!(
        "Rendered {} template(s) into {}",
        reports.len(),
        job.output_dir.display()
    );

    let strict = cli.strict || project.templates.strict;
    if unresolved > 0 {
        eprintln!("{} placeholder(s) could not be resolved", unresolved);
    }
    strict && unresolved > 0
}

fn print_diagnostics(diagnostics: &[Diagnostic], source: &str, report: bool) {
    let color = io::stderr().is_terminal();
    for diagnostic in diagnostics {
        if report {
            eprint!("{}", diagnostic.format_report(source, color));
        } else {
            eprintln!("\n{}", diagnostic.render(color));
        }
    }
}
