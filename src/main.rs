//! `newsdesk` command-line driver.
//!
//! Thin shell over `newsdesk_lib`: parses arguments, resolves credentials,
//! wires the Gemini endpoint, result cache and history store together, and
//! prints bundles as JSON. No generation logic lives here.

use clap::{Args, Parser, Subcommand};
use newsdesk_lib::cache::{FileCacheStorage, ResultCache};
use newsdesk_lib::config::{EditorialSettings, RawSettings};
use newsdesk_lib::coordinator::{Coordinator, SourceMaterial};
use newsdesk_lib::credentials::{self, GatewayConfig};
use newsdesk_lib::history::{HistoryRecord, HistoryStore, JsonHistoryStore, NewDraft};
use newsdesk_lib::llm::gemini::{GeminiEndpoint, DEFAULT_TIMEOUT};
use newsdesk_lib::llm::provider;
use newsdesk_lib::llm::{Gateway, GenerationError, GenerationResult};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Turn source material into headlines, an article and hashtags")]
struct Cli {
    /// Model id (overrides GEMINI_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a full bundle from source text
    Generate {
        /// Read source text from this file instead of stdin
        #[arg(long)]
        source: Option<PathBuf>,
        /// Extra context or keywords for the writer
        #[arg(long)]
        context: Option<String>,
        #[command(flatten)]
        settings: SettingsArgs,
        /// Always call the model, even on a cache hit
        #[arg(long)]
        no_cache: bool,
    },
    /// Regenerate the unlocked titles of a saved bundle
    Titles {
        id: String,
        /// Title to keep as-is (repeatable)
        #[arg(long = "keep")]
        keep: Vec<String>,
    },
    /// Regenerate the hashtags of a saved bundle
    Hashtags { id: String },
    /// Rewrite the article of a saved bundle
    Article {
        id: String,
        /// Keep the old hashtags instead of refreshing them from the new text
        #[arg(long)]
        no_cascade: bool,
    },
    /// Browse saved bundles
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Maintain the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// List selectable models
    Models,
    /// Save an API key to the OS keychain
    Login { key: String },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Show { id: String },
    Delete { id: String },
    Clear,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete expired entries
    Prune,
    /// Delete every entry
    Clear,
}

#[derive(Args)]
struct SettingsArgs {
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    angle: Option<String>,
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    goal: Option<String>,
    #[arg(long)]
    date_format: Option<String>,
    #[arg(long)]
    min_words: Option<i64>,
}

impl From<SettingsArgs> for RawSettings {
    fn from(args: SettingsArgs) -> Self {
        RawSettings {
            language: args.language,
            angle: args.angle,
            style: args.style,
            goal: args.goal,
            date_format: args.date_format,
            min_word_count: args.min_words,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    for env_file in [".env.local", ".env"] {
        match dotenvy::from_filename(env_file) {
            Ok(path) => eprintln!("[STARTUP] Loaded {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", env_file, e),
        }
    }

    env_logger::init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Models => {
            for model in provider::all_models() {
                println!("{:<24} {}", model.id, model.label);
            }
            Ok(())
        }
        Commands::Login { key } => {
            credentials::save_api_key(&key).map_err(|e| e.to_string())?;
            println!("API key saved.");
            Ok(())
        }
        Commands::History { action } => history_command(action).await,
        Commands::Cache { action } => {
            let cache = result_cache();
            match action {
                CacheAction::Prune => println!("Removed {} expired entries.", cache.purge_expired().await),
                CacheAction::Clear => {
                    cache.clear().await;
                    println!("Cache cleared.");
                }
            }
            Ok(())
        }
        command => {
            let config = gateway_config(cli.model);
            let coordinator = coordinator()?;
            generation_command(command, &coordinator, &config).await
        }
    }
}

async fn generation_command(
    command: Commands,
    coordinator: &Coordinator,
    config: &GatewayConfig,
) -> Result<(), String> {
    let history = JsonHistoryStore::default_location();

    match command {
        Commands::Generate {
            source,
            context,
            settings,
            no_cache,
        } => {
            let source_text = read_source(source).await?;
            if source_text.trim().is_empty() {
                return Err("Source text is empty.".into());
            }
            let material = SourceMaterial::new(
                source_text,
                context,
                EditorialSettings::from_raw(settings.into()),
            );
            let output = coordinator
                .generate(&material, config, !no_cache)
                .await
                .map_err(|e| e.user_message())?;

            let saved = history
                .save(NewDraft {
                    source_text: material.source_text,
                    context: material.context,
                    settings: material.settings,
                    output: output.clone(),
                })
                .await;
            match saved {
                Ok(records) => {
                    if let Some(record) = records.first() {
                        eprintln!("Saved to history as {}", record.id);
                    }
                }
                Err(e) => eprintln!("Warning: could not save history: {}", e),
            }
            print_json(&output)
        }
        Commands::Titles { id, keep } => {
            let record = load_record(&history, &id).await?;
            let material = material_of(&record);
            let titles = coordinator
                .regenerate_titles(&material, &record.output, &keep, config)
                .await
                .map_err(|e| e.user_message())?;
            print_json(&GenerationResult {
                titles: Some(titles),
                ..record.output
            })
        }
        Commands::Hashtags { id } => {
            let record = load_record(&history, &id).await?;
            let material = material_of(&record);
            let hashtags = coordinator
                .regenerate_hashtags(&material, record.output.article(), config)
                .await
                .map_err(|e| e.user_message())?;
            print_json(&GenerationResult {
                hashtags: Some(hashtags),
                ..record.output
            })
        }
        Commands::Article { id, no_cascade } => {
            let record = load_record(&history, &id).await?;
            let material = material_of(&record);
            let rewrite = coordinator
                .regenerate_article(&material, record.output.article(), config, !no_cascade)
                .await
                .map_err(|e| e.user_message())?;

            let mut output = record.output.clone();
            output.article = Some(rewrite.article);
            match rewrite.hashtags {
                Some(Ok(tags)) => output.hashtags = Some(tags),
                Some(Err(e)) => eprintln!("Warning: hashtags not refreshed: {}", e.user_message()),
                None => {}
            }
            print_json(&output)
        }
        _ => Ok(()),
    }
}

async fn history_command(action: HistoryAction) -> Result<(), String> {
    let history = JsonHistoryStore::default_location();
    match action {
        HistoryAction::List => {
            let records = history.list().await.map_err(|e| e.to_string())?;
            if records.is_empty() {
                println!("No history yet.");
            }
            for record in records {
                let headline = record.output.titles().first().cloned().unwrap_or_default();
                println!("{}  {}  {}", record.id, record.timestamp.format("%Y-%m-%d %H:%M"), headline);
            }
            Ok(())
        }
        HistoryAction::Show { id } => {
            let record = load_record(&history, &id).await?;
            print_json(&record)
        }
        HistoryAction::Delete { id } => {
            let remaining = history.delete(&id).await.map_err(|e| e.to_string())?;
            println!("Deleted. {} entries remain.", remaining.len());
            Ok(())
        }
        HistoryAction::Clear => {
            history.clear().await.map_err(|e| e.to_string())?;
            println!("History cleared.");
            Ok(())
        }
    }
}

fn gateway_config(model: Option<String>) -> GatewayConfig {
    let mut config = credentials::resolve();
    if let Some(model) = model {
        config.model = model;
    }
    config
}

fn result_cache() -> ResultCache {
    ResultCache::new(Arc::new(FileCacheStorage::default_location()))
}

fn coordinator() -> Result<Coordinator, String> {
    let endpoint = GeminiEndpoint::new(DEFAULT_TIMEOUT)
        .map_err(|e: GenerationError| e.user_message())?;
    let gateway = Gateway::new(Arc::new(endpoint)).with_cache(result_cache());
    Ok(Coordinator::new(gateway))
}

async fn read_source(path: Option<PathBuf>) -> Result<String, String> {
    match path {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e)),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(text)
        }
    }
}

async fn load_record(history: &JsonHistoryStore, id: &str) -> Result<HistoryRecord, String> {
    history
        .get(id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No history entry with id {}", id))
}

fn material_of(record: &HistoryRecord) -> SourceMaterial {
    SourceMaterial::new(
        record.source_text.clone(),
        record.context.clone(),
        record.settings.clone(),
    )
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}
