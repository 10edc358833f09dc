// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PhishGuard

//! Demonstration binary: exercises the client core against a running
//! marketplace server. Configuration comes from the environment (see
//! `config`); screens and navigation live elsewhere.

use std::env;
use std::process::ExitCode;

use phishguard_client::{ClientConfig, PhishGuardClient};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match PhishGuardClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("failed to build client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = match args.first().map(String::as_str) {
        Some("health") => health(&client).await,
        Some("catalog") => catalog(&client).await,
        Some("ask") => ask(&client, &args[1..].join(" ")).await,
        _ => {
            eprintln!("usage: phishguard-client <health | catalog | ask <question>>");
            return ExitCode::FAILURE;
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn health(client: &PhishGuardClient) -> Result<(), phishguard_client::ClientError> {
    let ok = client.health().await?;
    println!("server healthy: {ok}");
    Ok(())
}

async fn catalog(client: &PhishGuardClient) -> Result<(), phishguard_client::ClientError> {
    let modules = client.catalog.list_catalog().await?;
    for module in modules {
        println!(
            "#{} {} - {} credits ({})",
            module.id,
            module.title,
            module.price,
            module.provider_email.as_deref().unwrap_or("unknown provider")
        );
    }
    Ok(())
}

async fn ask(
    client: &PhishGuardClient,
    question: &str,
) -> Result<(), phishguard_client::ClientError> {
    client.assistant.ask(question).await;
    for turn in client.assistant.turns() {
        println!("[{:?}] {}", turn.speaker, turn.text);
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
