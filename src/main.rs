//! Demo server.
//!
//! Loads an optional TOML config, installs logging and serves a handful of
//! routes wired through the CORS, logger and static file plugins.

use std::path::PathBuf;

use clap::Parser;

use hookroute::config::{load_config, ServeConfig};
use hookroute::observability::init_logging;
use hookroute::plugins::{
    use_cors, use_logger, use_static, CorsPolicy, LoggerConfig, StaticOptions,
};
use hookroute::{get, path, post, response, serve, use_effect, Outcome, Request};

#[derive(Parser)]
#[command(name = "hookroute")]
#[command(about = "Hook-style HTTP routing demo server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory served under `/static`.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServeConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    init_logging(&config.observability)?;
    tracing::info!(
        bind_address = %config.listener.bind_address,
        port = config.listener.port,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let static_dir = cli.static_dir;
    serve(
        move || {
            use_logger(LoggerConfig::default());
            use_cors(CorsPolicy::default());

            get("/", |_| async { "Hello, world!" });
            get("/users/:id", |cx| async move {
                serde_json::json!({ "id": cx.params.get("id") })
            });

            path("/api", || {
                use_effect(|request: Request| async move {
                    if request.headers().contains_key("authorization") {
                        Outcome::next()
                    } else {
                        Outcome::respond(response::unauthorized())
                    }
                });
                get("/status", |_| async { "ok" });
                post("/echo", |cx| async move { cx.request.into_body() });
            });

            if let Some(dir) = static_dir {
                path("/static", move || use_static(dir, StaticOptions::default()));
            }
        },
        config,
    )
    .await?;

    Ok(())
}
