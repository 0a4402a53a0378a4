//! Command-line surface and error rendering.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use miette::{Diagnostic, Report};
use thiserror::Error;

use socidex_core::IndexVariant;

use crate::pipeline::{PipelineError, ProcessRequest};
use crate::trace::LogLevel;

/// Exit code for success, including validation skips.
pub const EXIT_OK: i32 = 0;
/// Exit code for argument errors and terminal pipeline failures.
pub const EXIT_FAILURE: i32 = 1;

/// CLI-level errors with exit-code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Argument or configuration error
    #[error("Configuration error: {message}")]
    #[diagnostic(code(socidex::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The pipeline failed terminally
    #[error("Pipeline error: {message}")]
    #[diagnostic(code(socidex::cli::pipeline))]
    Pipeline {
        /// The error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        match err {
            // Reference construction failures are caller input problems.
            PipelineError::Reference(e) => Self::config(e.to_string()),
            other => Self::Pipeline {
                message: other.to_string(),
            },
        }
    }
}

/// Map a CLI error to its exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } | CliError::Pipeline { .. } => EXIT_FAILURE,
    }
}

/// Render an error based on the JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let envelope = serde_json::json!({
            "status": "error",
            "error": {
                "code": match err {
                    CliError::Config { .. } => "config",
                    CliError::Pipeline { .. } => "pipeline",
                },
                "message": err.to_string(),
            }
        });
        match serde_json::to_string(&envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Build and publish a SOCI index for one ECR image.
///
/// Validation failures (missing manifest, malformed digest, unsupported
/// media type) exit successfully with a skip message so batch callers do
/// not retry permanently invalid inputs.
#[derive(Parser, Debug)]
#[command(name = "socidex")]
#[command(about = "Build and publish SOCI indexes for ECR container images")]
#[command(version)]
pub struct Cli {
    /// ECR repository name
    #[arg(long)]
    pub repo: String,

    /// Content digest of the image to index (sha256:...)
    #[arg(long)]
    pub digest: String,

    /// AWS region of the registry
    #[arg(long, env = "AWS_REGION")]
    pub region: String,

    /// AWS account ID owning the registry
    #[arg(long, env = "AWS_ACCOUNT_ID")]
    pub account: String,

    /// Index protocol version (V1 builds then selects, V2 converts directly)
    #[arg(long, default_value = "V1")]
    pub soci_version: IndexVariant,

    /// Base tag for the published index; V2 appends "-soci" to it
    #[arg(long)]
    pub output_tag: Option<String>,

    /// Name of the SOCI builder binary to invoke
    #[arg(long, default_value = "soci")]
    pub builder: String,

    /// Directory under which per-run working directories are created
    #[arg(long, env = "SOCIDEX_WORKSPACE", default_value = "/tmp")]
    pub workspace: PathBuf,

    /// Emit machine-readable JSON on stdout and JSON logs on stderr
    #[arg(long)]
    pub json: bool,

    /// Log verbosity
    #[arg(long, short = 'l', value_enum, default_value_t = LogLevel::Info)]
    pub level: LogLevel,
}

impl Cli {
    /// Convert parsed arguments into a pipeline request.
    pub fn to_request(&self) -> Result<ProcessRequest, CliError> {
        if self.soci_version.requires_output_tag()
            && self.output_tag.as_deref().is_none_or(str::is_empty)
        {
            return Err(CliError::config_with_help(
                "--output-tag is required when --soci-version is V2",
                "V2 publishes the index under '<output-tag>-soci'",
            ));
        }
        Ok(ProcessRequest {
            repository: self.repo.clone(),
            digest: self.digest.clone(),
            region: self.region.clone(),
            account: self.account.clone(),
            variant: self.soci_version,
            base_tag: self.output_tag.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    const BASE: &[&str] = &[
        "socidex",
        "--repo",
        "app",
        "--digest",
        "sha256:abc",
        "--region",
        "us-east-1",
        "--account",
        "111122223333",
    ];

    #[test]
    fn test_defaults() {
        let cli = parse(BASE);
        assert_eq!(cli.soci_version, IndexVariant::Legacy);
        assert_eq!(cli.builder, "soci");
        assert!(!cli.json);
        assert!(cli.output_tag.is_none());
    }

    #[test]
    fn test_v1_request_without_tag() {
        let request = parse(BASE).to_request().unwrap();
        assert_eq!(request.variant, IndexVariant::Legacy);
        assert!(request.base_tag.is_none());
    }

    #[test]
    fn test_v2_requires_output_tag() {
        let mut args = BASE.to_vec();
        args.extend(["--soci-version", "V2"]);
        let err = parse(&args).to_request().unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
    }

    #[test]
    fn test_v2_with_output_tag() {
        let mut args = BASE.to_vec();
        args.extend(["--soci-version", "V2", "--output-tag", "release"]);
        let request = parse(&args).to_request().unwrap();
        assert_eq!(request.variant, IndexVariant::Convert);
        assert_eq!(request.base_tag.as_deref(), Some("release"));
    }

    #[test]
    fn test_empty_output_tag_rejected_for_v2() {
        let mut args = BASE.to_vec();
        args.extend(["--soci-version", "V2", "--output-tag", ""]);
        assert!(parse(&args).to_request().is_err());
    }

    #[test]
    fn test_unknown_version_fails_parse() {
        let mut args = BASE.to_vec();
        args.extend(["--soci-version", "V3"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_missing_required_argument_fails_parse() {
        assert!(Cli::try_parse_from(["socidex", "--repo", "app"]).is_err());
    }
}
