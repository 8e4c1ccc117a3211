use crate::demo::{run_calendar, run_demo, run_reminders, CalendarArgs, DemoArgs, RemindArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use kua_registry::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "KUA Marriage Registry",
    about = "Run and demonstrate the KUA marriage registration service from the command line",
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
    /// Walk two couples through registration, counseling, and the wedding
    Demo(DemoArgs),
    /// Print the wedding and counseling calendars for a month of demo data
    Calendar(CalendarArgs),
    /// Run the H-1 reminder scan over demo data
    Remind(RemindArgs),
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
        Command::Demo(args) => run_demo(args).await,
        Command::Calendar(args) => run_calendar(args).await,
        Command::Remind(args) => run_reminders(args).await,
    }
}
