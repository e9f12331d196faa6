mod cli;

use std::process::ExitCode;

use clap::Parser;
use devcert::{Devcert, DevcertError, Generated, TerminalPrompt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse().checked().unwrap_or_else(|error| error.exit());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) if error.is_user_declined() => {
            println!("Setup cancelled, no changes were made.");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DevcertError> {
    let devcert = Devcert::for_current_user()?;

    if let Some(Commands::Info { file }) = cli.command {
        println!("{}", devcert.describe(&file)?);
        return Ok(());
    }

    let mut prompt = TerminalPrompt::default();
    let Generated { setup, issued } = devcert.generate(&cli.domains, &mut prompt)?;
    if let Some(setup) = setup {
        print!("{}", setup.report(devcert.authority().paths()));
    }
    print!("{}", issued.report());
    Ok(())
}
