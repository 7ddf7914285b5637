use tokio::io::{AsyncBufReadExt, BufReader};

use ventureplay_lib::ai::Adapters;
use ventureplay_lib::commands::session::HELP;
use ventureplay_lib::commands::{dispatch, SessionCommand};
use ventureplay_lib::config::GameConfig;
use ventureplay_lib::game::GameEngine;
use ventureplay_lib::{init_tracing, AppError};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("ventureplay failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let mut watch_events = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--events" => watch_events = true,
            other => return Err(AppError::Other(format!("unknown argument '{other}'"))),
        }
    }

    init_tracing();
    let config = GameConfig::from_env()?;
    tracing::info!(provider = ?config.provider.to_view(), "configuration loaded");
    let adapters = Adapters::from_config(&config)?;
    let engine = GameEngine::new(config, adapters);

    if watch_events {
        let mut events = engine.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if event.event_type.ends_with(".tick") {
                    continue;
                }
                eprintln!("[event {}] {} {}", event.seq, event.event_type, event.payload);
            }
        });
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|error| AppError::Other(format!("failed to read stdin: {error}")))?
    {
        if line.trim().is_empty() {
            continue;
        }
        let command = match SessionCommand::parse(&line) {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            }
        };
        if command == SessionCommand::Quit {
            break;
        }
        match dispatch(&engine, command).await {
            Ok(serde_json::Value::String(text)) => println!("{text}"),
            Ok(value) => println!(
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            ),
            Err(error) => println!("error: {error}"),
        }
    }

    engine.restart();
    Ok(())
}

fn print_help() {
    println!(
        "ventureplay: play the business simulation from a terminal\n\n\
         usage: ventureplay [--events]\n\n\
         --events   print game events to stderr as they happen\n\n\
         environment:\n  \
         VENTUREPLAY_API_KEY, VENTUREPLAY_MODEL, VENTUREPLAY_BASE_URL, VENTUREPLAY_TIMEOUT_MS,\n  \
         VENTUREPLAY_PROBLEM_SECS, VENTUREPLAY_DOCUMENT_SECS, RUST_LOG\n\n{HELP}"
    );
}
