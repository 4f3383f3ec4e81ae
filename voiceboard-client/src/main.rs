//! Voiceboard command-line client

mod args;

use std::env;
use std::process;

use clap::Parser;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Action, Args};
use voiceboard_client::constants::{AUTHOR_ENV_VAR, DEFAULT_AUTHOR};
use voiceboard_client::{ClientConfig, ClientError, VoiceClient};
use voiceboard_common::protocol::Message;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        error!("{}", e);
        process::exit(1);
    }
}

/// Install the tracing subscriber on stderr; `RUST_LOG` overrides `--debug`
fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<(), ClientError> {
    let config = ClientConfig {
        host: args.host,
        main_port: args.port,
        notify_port: args.notify_port,
        max_frame_size: args.max_frame_size,
        ..ClientConfig::default()
    };
    let author = args
        .author
        .or_else(|| env::var(AUTHOR_ENV_VAR).ok())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let mut client = VoiceClient::connect(&config, author, move || {
        let _ = notify_tx.send(());
    })
    .await?;

    match args.command {
        Action::Send { file } => {
            let audio = fs::read(&file).await?;
            let id = client.send(&audio).await?;
            info!(id, file = %file.display(), "uploaded");
            println!("{id}");
        }
        Action::Fetch { id, output } => match output {
            Some(path) => {
                let bytes = client.fetch_to_path(id, &path).await?;
                info!(id, bytes, path = %path.display(), "downloaded");
            }
            None => {
                let mut stdout = tokio::io::stdout();
                client.fetch_into(id, &mut stdout).await?;
                stdout.flush().await?;
            }
        },
        Action::List => {
            print_messages(&client.list().await?);
        }
        Action::Watch => {
            print_messages(&client.list().await?);
            loop {
                tokio::select! {
                    signal = notify_rx.recv() => {
                        if signal.is_none() {
                            break;
                        }
                        println!();
                        print_messages(&client.list().await?);
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    client.close().await
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        println!("{}\t{}\t{}", message.id, message.author, message.created_at);
    }
}
