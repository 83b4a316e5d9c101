//! Parameter Validator CLI
//!
//! Command-line interface for validating parameter files against link
//! schemas and linting schema documents.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use param_validator::{
    lint, load_params, load_schema_auto, FileStatus, LinkSchema, ParamValidator, SchemaDocument,
    Severity, ValidateError, ValidateOptions,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "param-validator")]
#[command(about = "Validate API parameters against Hyper-Schema link schemas")]
#[command(version)]
struct Cli {
    /// Log resolution and matching steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a parameter file against one link of a schema document
    Validate {
        /// Parameter file (a JSON object)
        params: PathBuf,

        /// Schema source: file path or URL (http:// or https://)
        #[arg(long)]
        schema: String,

        /// JSON pointer to the link (e.g. "#/definitions/app/links/0")
        #[arg(long)]
        link: String,

        /// Treat the pointer target as the link schema itself, not a link object
        #[arg(long)]
        link_schema: bool,

        /// Accept parameters the link schema does not declare
        #[arg(long)]
        allow_extra: bool,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint schema documents for broken refs, bad anyOf and invalid patterns
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            params,
            schema,
            link,
            link_schema,
            allow_extra,
            json,
        } => run_validate(ValidateArgs {
            params,
            schema,
            link,
            link_schema,
            options: ValidateOptions::new().allow_extra(allow_extra),
            json_output: json,
        }),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct ValidateArgs {
    params: PathBuf,
    schema: String,
    link: String,
    link_schema: bool,
    options: ValidateOptions,
    json_output: bool,
}

fn run_validate(args: ValidateArgs) -> Result<(), u8> {
    let ValidateArgs {
        params: params_path,
        schema: schema_source,
        link: pointer,
        link_schema,
        options,
        json_output,
    } = args;

    let params = load_params(&params_path).map_err(|e| {
        report_error(json_output, &format!("loading params: {}", e));
        e.exit_code() as u8
    })?;

    let schema = load_schema_auto(&schema_source)
        .map(SchemaDocument::new)
        .map_err(|e| {
            report_error(json_output, &format!("loading schema: {}", e));
            e.exit_code() as u8
        })?;

    let link = schema
        .find(&pointer)
        .and_then(|node| {
            if link_schema {
                LinkSchema::from_schema(node)
            } else {
                LinkSchema::from_link(node)
            }
        })
        .map_err(|e| {
            report_error(json_output, &e.to_string());
            e.exit_code() as u8
        })?;

    match ParamValidator::new(&schema, options).check(&params, &link) {
        Ok(()) => {
            if json_output {
                println!("{}", json!({ "valid": true }));
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::InvalidParams { report }) => {
            if json_output {
                let output = json!({
                    "valid": false,
                    "missing": report.missing,
                    "extra": report.extra,
                    "errors": report.other,
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for line in report.messages() {
                    eprintln!("  {}", line);
                }
            }
            Err(1)
        }
        Err(ValidateError::Resolve(e)) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}
