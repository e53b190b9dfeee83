// CLI modules
mod args;
mod op;
mod ops;
mod state;

use args::Args;
use clap::Parser;
use op::Op;
use ops::{Cid, Hash, Init, Ls, Reveal, Submit, Version};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

command_enum! {
    (Init, Init),
    (Version, Version),
    (Hash, Hash),
    (Cid, Cid),
    (Submit, Submit),
    (Ls, Ls),
    (Reveal, Reveal),
}

/// Logs go to stderr so command output on stdout stays pipeable.
/// The returned guard must outlive every log call.
fn init_logging(level: tracing::Level) -> tracing_appender::non_blocking::WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(layer).init();
    guard
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = state::AppState::load(args.config_path.clone())
        .map(|state| state.config.log_level())
        .unwrap_or(tracing::Level::WARN);
    let guard = init_logging(level);

    let ctx = op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush buffered logs before exiting
    drop(guard);
    std::process::exit(code);
}
