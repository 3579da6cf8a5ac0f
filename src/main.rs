use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use action_bridge::cli::commands::{cmd_advise, cmd_extract, cmd_validate};
use action_bridge::cli::config::{Cli, Commands, load_config};

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancel `token` on the first Ctrl-C so a running pass can close its session.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling validation");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let trace_file = cli.trace_file.as_deref();
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Extract { input, format } => {
            cmd_extract(&input, &format, &config, trace_file)?;
        }
        Commands::Validate {
            input,
            url,
            snapshot,
            format,
            port,
        } => {
            let validated = cmd_validate(
                &input,
                url.as_deref(),
                snapshot.as_deref(),
                &format,
                port,
                &config,
                trace_file,
                &cancel,
            )
            .await?;
            if !validated {
                std::process::exit(1);
            }
        }
        Commands::Advise {
            error_file,
            url,
            format,
        } => {
            cmd_advise(
                &error_file,
                url.as_deref(),
                &format,
                &config,
                trace_file,
                &cancel,
            )
            .await?;
        }
    }

    Ok(())
}
