mod commands;
mod terminal;

use commands::{CommandLine, Commands, mitm, scan, spoof};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose);
    let cfg = commands.engine_config();

    match &commands.command {
        Commands::Scan => scan::scan(&commands, cfg).await,
        Commands::Mitm(args) => mitm::mitm(&commands, args, cfg).await,
        Commands::Spoof { target, impersonate } => {
            spoof::spoof(&commands, *target, *impersonate, cfg)
        }
    }
}
