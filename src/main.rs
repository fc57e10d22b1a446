use thinkwire::cli::{parse_args, run_cli_command, version_line, CliCommand, USAGE};
use thinkwire::{ClientConfig, StudioClient};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit status for a malformed command line.
const EXIT_USAGE: i32 = 64;

/// Log to stderr so stdout carries only the answer.
fn init_tracing() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thinkwire=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| eyre!("failed to init tracing: {err}"))
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprint!("{}", USAGE);
            std::process::exit(EXIT_USAGE);
        }
    };

    color_eyre::install()?;

    // Handle version and help before any initialization
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            print!("{}", USAGE);
            return Ok(());
        }
        _ => {}
    }

    init_tracing()?;

    let config = ClientConfig::from_env();
    tracing::debug!(base_url = %config.base_url, model = %config.model, "starting");

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(async {
        let client = StudioClient::new(config);
        let cancel = CancellationToken::new();

        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, cancelling");
                ctrl_c.cancel();
            }
        });

        run_cli_command(command, &client, cancel).await
    });

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {}", e.user_message());
        std::process::exit(e.category().exit_code());
    }

    Ok(())
}
