extern crate reign;

use std::env::args;
use std::process::ExitCode;

use reign::config::GameConfig;
use reign::game::{Event, Game};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("reign=info,{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let seed = match args().nth(1).map(|arg| arg.parse::<u64>()) {
        None => fastrand::u64(..),
        Some(Ok(seed)) => seed,
        Some(Err(error)) => {
            tracing::error!(%error, "seed should be an unsigned integer");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut log = |event: Event| tracing::debug!(?event, "setup");
    match Game::generate(GameConfig::default(), &mut rng, &mut log) {
        Ok(game) => {
            println!("Seed {}", seed);
            println!("{}", game.ascii_representation());
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(seed, %error, "board generation failed");
            ExitCode::FAILURE
        }
    }
}
