use chrono::Utc;
use clap::{Parser, ValueEnum};
use jbgc::{compile_project_for_target, validate_project, CodeStyle, Project, TranspileOptions};
use std::fs;
use tracing_subscriber::EnvFilter;

/// Define a CLI-specific enum for clap to parse.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleCli {
    Natural,
    Compressed,
}

impl From<StyleCli> for CodeStyle {
    fn from(style: StyleCli) -> Self {
        match style {
            StyleCli::Natural => CodeStyle::Natural,
            StyleCli::Compressed => CodeStyle::Compressed,
        }
    }
}

/// Compile a Jino block project into target source code
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the saved project JSON file
    project_path: String,

    /// Target language identifier
    #[arg(short, long, default_value = "ino")]
    target: String,

    /// Output style
    #[arg(short, long, value_enum, default_value = "natural")]
    style: StyleCli,

    /// Write the program here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Only validate; do not generate code
    #[arg(long)]
    check: bool,

    /// Refuse to generate code when validation reports anything
    #[arg(long)]
    strict: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let json = fs::read_to_string(&cli.project_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read project file '{}': {}",
            &cli.project_path, e
        ))
    });
    let project = Project::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load project: {}", e)));

    let diagnostics = validate_project(&project);
    for diagnostic in &diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    if cli.check {
        if diagnostics.is_empty() {
            eprintln!("No problems found.");
            return;
        }
        std::process::exit(1);
    }
    if cli.strict && !diagnostics.is_empty() {
        exit_with_error(&format!(
            "{} validation problem(s); not generating code in strict mode",
            diagnostics.len()
        ));
    }

    let options = TranspileOptions::default()
        .with_style(cli.style.into())
        .with_exported_at(Utc::now().to_rfc3339());

    let code = compile_project_for_target(&project, &cli.target, &options)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));

    match &cli.output {
        Some(path) => {
            fs::write(path, &code)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e)));
            eprintln!("Wrote {} bytes to {}", code.len(), path);
        }
        None => print!("{}", code),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
