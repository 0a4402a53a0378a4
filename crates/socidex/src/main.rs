//! socidex CLI entry point.
//!
//! Wires the ECR registry client and the external SOCI builder into the
//! pipeline and maps its outcome to exit codes: success and validation
//! skips exit zero, argument errors and terminal failures exit one.

// CLI binary outputs to stdout/stderr directly.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;

use socidex::cli::{Cli, CliError, EXIT_FAILURE, EXIT_OK, exit_code_for, render_error};
use socidex::pipeline::Pipeline;
use socidex::trace::{self, TracingConfig, TracingFormat};
use socidex_index::BuilderCommand;
use socidex_registry::EcrClient;

fn main() {
    // NOTE: eprintln! in the panic hook is intentional, tracing may be
    // corrupted during a panic.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version print to stdout and are not errors.
            let code = if e.use_stderr() { EXIT_FAILURE } else { EXIT_OK };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let tracing_config = TracingConfig {
        format: if cli.json {
            TracingFormat::Json
        } else {
            TracingFormat::Pretty
        },
        level: cli.level.clone().into(),
        ..Default::default()
    };
    // Ignore error if tracing is already initialized (e.g., in tests).
    let _ = trace::init_tracing(tracing_config);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: failed to create tokio runtime: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let json_mode = cli.json;
    let exit_code = match rt.block_on(run(cli)) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, json_mode);
            exit_code_for(&err)
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let request = cli.to_request()?;

    let registry = EcrClient::init(request.region.as_str());
    let builder = BuilderCommand::new(&cli.builder);
    let pipeline = Pipeline::new(registry, builder, &cli.workspace);

    let outcome = pipeline.run(&request).await?;

    if cli.json {
        let envelope = serde_json::json!({
            "status": "ok",
            "data": { "message": outcome.to_string() },
        });
        println!(
            "{}",
            serde_json::to_string(&envelope)
                .unwrap_or_else(|_| outcome.to_string())
        );
    } else {
        println!("{outcome}");
    }
    Ok(())
}
