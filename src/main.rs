//! Binary entry point for the modulize CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Preview the migration as JSON
//! modulize --css 'src/**/*.css' --js 'src/**/*.{js,jsx,ts,tsx}' --dry-run
//!
//! # Preview as a unified diff
//! modulize --css 'src/**/*.css' --js 'src/**/*.tsx' --dry-run --format diff
//!
//! # Apply, forcing double quotes in emitted strings
//! modulize --css 'src/**/*.css' --js 'src/**/*.tsx' --quotes double
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use modulize::cli::{render, run_migrate, MigrateRequest, OutputFormat};
use modulize::error::{ModulizeError, OutputErrorCode};
use modulize::migrate::{MigrateOptions, QuoteStyle};
use modulize::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Migrate global CSS classes to CSS modules.
///
/// Classes declared in exactly one stylesheet are renamed to camel case and
/// referenced from scripts through a style module import; every other class
/// is kept global.
#[derive(Parser, Debug)]
#[command(
    name = "modulize",
    version,
    about = "Migrate global CSS classes to CSS modules"
)]
struct Cli {
    /// Glob selecting the stylesheets, relative to --root.
    #[arg(long)]
    css: String,

    /// Glob selecting the scripts, relative to --root.
    #[arg(long)]
    js: String,

    /// Preview changes without writing them.
    #[arg(long)]
    dry_run: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Quote style for emitted strings.
    #[arg(long, value_enum, default_value = "auto")]
    quotes: QuoteStyle,

    /// Base name for style module imports.
    #[arg(long, alias = "importIdentifier", default_value = "styles")]
    import_identifier: String,

    /// Segment inserted before the extension of renamed stylesheets.
    #[arg(long, alias = "moduleCssPrefix", default_value = "module")]
    module_css_prefix: String,

    /// Directory the globs are matched under (default: current directory).
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log line format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines (default).
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl Cli {
    fn request(&self) -> MigrateRequest {
        MigrateRequest {
            root: self.root.clone(),
            css: self.css.clone(),
            js: self.js.clone(),
            dry_run: self.dry_run,
            options: MigrateOptions {
                import_identifier: self.import_identifier.clone(),
                module_marker: self.module_css_prefix.clone(),
                quotes: self.quotes,
            },
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level, cli.log_format);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like every other response
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the migration and print the result.
fn execute(cli: &Cli) -> Result<(), ModulizeError> {
    let report = run_migrate(&cli.request())?;
    let output = render(&report, cli.format)?;

    let mut stdout = io::stdout();
    writeln!(stdout, "{}", output).map_err(|e| ModulizeError::internal(e.to_string()))?;
    stdout
        .flush()
        .map_err(|e| ModulizeError::internal(e.to_string()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
