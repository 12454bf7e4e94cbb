use crate::area::{run_area, AreaArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use ktm_property_hub::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Kathmandu Property Hub",
    about = "Serve the property listing API or convert Nepali land units",
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
    /// Normalize ropani/aana/paisa/dam or bigha/katha/dhur counts to square feet
    Area(AreaArgs),
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
        Command::Area(args) => run_area(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_subcommand_parses_unit_flags() {
        let cli = Cli::try_parse_from(["ktm-property-hub-api", "area", "--bigha", "1", "--katha", "2"])
            .expect("arguments parse");
        match cli.command {
            Some(Command::Area(args)) => {
                assert_eq!(args.bigha, Some(1));
                assert_eq!(args.katha, Some(2));
                assert!(!args.json);
            }
            other => panic!("expected area command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["ktm-property-hub-api"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
