use clap::{Parser, Subcommand};
use fcp_rekor::{
    cli::{self, LatestArgs, SubmitArgs, VerifyArgs},
    error::Result,
};

#[derive(Parser)]
#[command(name = cli::CLI_NAME, version = cli::CLI_VERSION, author, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign the newest statement-attestation as DSSE/in-toto and submit it to Rekor
    Submit(SubmitArgs),
    /// Print the statement-attestation that would be submitted
    Latest(LatestArgs),
    /// Verify a recorded Rekor proof offline
    Verify(VerifyArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    fcp_rekor::init_logging()?;

    // Parse command line arguments
    let cli = Cli::parse();

    // Handle commands
    let result = match cli.command {
        Commands::Submit(args) => cli::handlers::handle_submit_command(args),
        Commands::Latest(args) => cli::handlers::handle_latest_command(args),
        Commands::Verify(args) => cli::handlers::handle_verify_command(args),
    };

    // Format and display any errors
    if let Err(ref e) = result {
        eprintln!("❌ {}", cli::format_error(e));
    }

    result
}
