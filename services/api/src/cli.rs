use crate::demo::{run_demo, run_travel_cost, DemoArgs, TravelCostArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use epermit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "CEPA ePermit",
    about = "Run the ePermit review, inspection, and invoicing service from the command line",
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
    /// Walk a seeded entity from intent registration to a paid inspection invoice
    Demo(DemoArgs),
    /// Price an inspection trip without touching any store
    TravelCost(TravelCostArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::TravelCost(args) => run_travel_cost(args),
    }
}
