use clap::Parser;
use daylist::cli::commands::Cli;
use daylist::cli::handlers::{self, Context};
use daylist::util::logging;

fn main() {
    let cli = Cli::parse();

    let ctx = match Context::new(cli.data_dir.as_deref(), cli.json) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // Logging is best effort; the command still runs without it
    if let Err(e) = logging::init_logging(&ctx.config.log.level, &ctx.data_dir) {
        eprintln!("warning: logging disabled: {}", e);
    }

    if let Err(e) = handlers::dispatch(&ctx, cli.command) {
        log::info!("event=command_failed error={}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
