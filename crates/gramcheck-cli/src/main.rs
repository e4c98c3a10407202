use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(target_env = "msvc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use gramcheck_cli::output::{render_descriptors, render_report, render_summary};
use gramcheck_cli::{HarnessOptions, OutputOptions, build_registry};

/// Exit code for a malformed harness setup (bad manifest, duplicate or
/// unknown grammar names), as opposed to a grammar failing its checks.
const EXIT_ASSEMBLY_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "gramcheck",
    about = "gramcheck: load compiled tree-sitter grammars and check they are sound",
    version
)]
pub struct Cli {
    /// Only check these grammars (exact names); checks every grammar when empty
    #[arg(value_name = "NAME")]
    grammars: Vec<String>,

    #[command(flatten)]
    harness: HarnessOptions,

    #[command(flatten)]
    output: OutputOptions,

    /// List the selected grammars without loading them
    #[arg(long)]
    list: bool,
}

fn run(args: Cli) -> anyhow::Result<u8> {
    let total_start = Instant::now();
    let registry = build_registry(&args.harness)?;

    if args.list {
        let selected = registry.select(&args.grammars)?;
        print!("{}", render_descriptors(&selected));
        return Ok(gramcheck_core::EXIT_SUCCESS);
    }

    let report = registry.run_selected(&args.grammars)?;
    print!("{}", render_report(&report, &args.output)?);
    eprintln!("{}", render_summary(&report));

    let total_secs = total_start.elapsed().as_secs_f64();
    tracing::info!(total_secs, "complete");
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err}");
            tracing::error!(error = %err, "harness setup failed");
            ExitCode::from(EXIT_ASSEMBLY_ERROR)
        }
    }
}
