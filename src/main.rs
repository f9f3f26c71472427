use std::process::ExitCode;
use std::sync::Arc;

use deck_workbench::api::client::HttpApi;
use deck_workbench::api::session::Session;
use deck_workbench::deck::composer::{ComposerConfig, DeckComposer};
use deck_workbench::logger;
use deck_workbench::models::settings::Settings;
use deck_workbench::utils::logger::{LogLevel, Logger};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(error) => {
            logger!(ERROR, "[MAIN] Invalid settings ({error})");
            return ExitCode::FAILURE;
        }
    };
    match settings.log_level.parse::<LogLevel>() {
        Ok(level) => Logger::set_level(level),
        Err(error) => logger!(WARN, "[MAIN] {error}, keeping INFO"),
    }

    let Some(deck_id) = std::env::args().nth(1).and_then(|a| a.parse::<i64>().ok()) else {
        logger!(ERROR, "[MAIN] Usage: deck-workbench <deck-id>");
        return ExitCode::FAILURE;
    };

    let session = match Session::open(&settings) {
        Ok(session) => Arc::new(session),
        Err(error) => {
            logger!(ERROR, "[MAIN] Unable to open session ({error})");
            return ExitCode::FAILURE;
        }
    };
    let api = match HttpApi::new(&settings, Arc::clone(&session)) {
        Ok(api) => Arc::new(api),
        Err(error) => {
            logger!(ERROR, "[MAIN] Unable to build API client ({error})");
            return ExitCode::FAILURE;
        }
    };

    let composer = DeckComposer::new(
        api.clone(),
        api.clone(),
        api,
        ComposerConfig::from(&settings),
    );
    let code = match composer.load(deck_id).await {
        Ok(()) => {
            print_deck(&composer).await;
            ExitCode::SUCCESS
        }
        Err(error) => {
            logger!(ERROR, "[MAIN] {}", error.user_message());
            ExitCode::FAILURE
        }
    };

    composer.dispose().await;
    session.close().await;
    code
}

async fn print_deck(composer: &DeckComposer) {
    let Some(deck) = composer.deck().await else {
        return;
    };
    println!(
        "{} [{}] colors: {} total: {}",
        deck.name,
        deck.format,
        deck.deck_color.as_deref().unwrap_or("-"),
        deck.total_cards
    );

    for group in composer.grouped().await {
        let count: u32 = group.entries.iter().map(|e| e.copies).sum();
        println!("\n{} ({count})", group.base_type);
        for view in &group.entries {
            let missing = if view.in_collection { "" } else { "  (not in collection)" };
            println!(
                "  {:>3}x {} [{}]{missing}",
                view.copies,
                view.entry.card_name,
                view.entry.mana_cost.mana_value()
            );
        }
    }
}
