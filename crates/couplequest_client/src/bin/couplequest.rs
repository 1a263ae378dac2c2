//! crates/couplequest_client/src/bin/couplequest.rs

use couplequest_client::{
    adapters::{ConfiguredGeolocation, HttpIdeaClient, JsonFileStore},
    config::ClientConfig,
    error::ClientError,
    repl::{self, Command, Flow},
};
use couplequest_core::{Controller, Store, View};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = ClientConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- 2. Wire the Adapters into the Controller ---
    let store = Store::new(Arc::new(JsonFileStore::open(&config.store_path)));
    let ideas = Arc::new(HttpIdeaClient::new(config.endpoint.clone(), config.timeout)?);
    let geolocation = Arc::new(ConfiguredGeolocation::new(config.location));
    info!(endpoint = %config.endpoint, store = %config.store_path.display(), "Client ready.");

    let mut controller = Controller::new(store, ideas, geolocation);
    if controller.view() == View::Main {
        controller.request_location().await;
    }

    // --- 3. Run the Prompt Loop ---
    let mut rng = rand::thread_rng();
    let mut stdout = std::io::stdout();
    write!(stdout, "{}", repl::render_screen(&controller, &mut rng))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(command) => {
                if repl::execute(&mut controller, command, &mut rng, &mut stdout).await?
                    == Flow::Quit
                {
                    break;
                }
            }
            Err(e) => writeln!(stdout, "{}", e)?,
        }
    }

    Ok(())
}
