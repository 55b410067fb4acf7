use crate::commands::{run_evaluate, run_template, EvaluateArgs, TemplateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mileage_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Mileage Portal",
    about = "Run the mileage scholarship and microdegree portal or its offline tools",
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
    /// Write an empty import template workbook
    Template(TemplateArgs),
    /// Evaluate completed subjects against microdegree processes from JSON files
    Evaluate(EvaluateArgs),
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
        Command::Template(args) => run_template(args),
        Command::Evaluate(args) => run_evaluate(args),
    }
}
