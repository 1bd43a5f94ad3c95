use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use netgridviz::config::Config;
use netgridviz::debug_recorder::DebugRecorder;
use netgridviz::render::term::TermRenderer;
use netgridviz::server::NetworkState;
use netgridviz::telemetry::logging::{self, LogConfig, LogLevel};
use netgridviz::viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "netgridviz", about = "Live viewer for character-grid draw streams")]
struct Cli {
    /// Port to listen on; falls back to NETGRIDVIZ_PORT, then 41088.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Write logs to a file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Record decoded frames as JSON lines at this path.
    #[arg(long)]
    debug_recorder: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&LogConfig {
        level: cli.log_level,
        file: cli.log_file.clone(),
    })?;

    let config = Config::from_env();
    let port = cli.port.unwrap_or(config.port);

    let mut net = NetworkState::start(port)
        .with_context(|| format!("failed to listen on port {port}"))?;
    if let Some(path) = &cli.debug_recorder {
        net.set_recorder(DebugRecorder::create(path)?);
    }

    let renderer = TermRenderer::new().context("failed to take over the terminal")?;
    Viewer::new(renderer, net).run()
}
