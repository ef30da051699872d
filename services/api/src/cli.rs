use crate::demo::{run_demo, run_score_report, DemoArgs, ScoreReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use talent_pulse::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "TalentPulse Health Orchestrator",
    about = "Run the organizational psychosocial-health scoring service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a COPC metrics export and print composite scores per subject
    Score(ScoreReportArgs),
    /// Run an end-to-end CLI demo covering scoring, plans, and alerts
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
