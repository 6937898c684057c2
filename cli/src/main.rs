mod commands;
mod terminal;

use std::process::ExitCode;

use asnscope_common::config::Config;
use asnscope_common::error;
use commands::{CommandLine, Commands, scan, targets};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);

    let mut cfg = Config {
        no_banner: commands.no_banner,
        quiet: commands.quiet,
        disable_input: false,
    };

    print::banner(cfg.no_banner, cfg.quiet);

    let result = match commands.command {
        Commands::Scan(args) => {
            cfg.disable_input = args.no_input;
            scan::scan(args, &cfg).await
        }
        Commands::Targets(input) => targets::targets(input, &cfg),
    };

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    };

    print::end_of_program();
    code
}
