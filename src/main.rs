use clap::Parser;
use traceval::cli::{Cli, Commands};
use traceval::commands;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let result = match cli.command {
        Commands::Report { pipeline } => commands::report::handle_report(pipeline.into_run_config()),
        Commands::Plan { pipeline } => commands::plan::handle_plan(pipeline.into_run_config()),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(err.exit_code());
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
