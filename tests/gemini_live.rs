//! Live test against the Gemini API.
//!
//! Skips unless GEMINI_API_KEY is set (directly or via .env.local / .env
//! in the crate root). Never uses the cache, so every run makes real calls.

use newsdesk_lib::config::{EditorialSettings, RawSettings};
use newsdesk_lib::coordinator::{Coordinator, SourceMaterial};
use newsdesk_lib::credentials::{self, API_KEY_ENV};
use newsdesk_lib::llm::gemini::{GeminiEndpoint, DEFAULT_TIMEOUT};
use newsdesk_lib::llm::{hashtags, Gateway};
use std::sync::Arc;

fn load_env() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    for env_file in [".env.local", ".env"] {
        let path = manifest_dir.join(env_file);
        if path.exists() {
            dotenvy::from_path(&path).expect("Failed to load env file");
            eprintln!("[TEST] Loaded {}", path.display());
        }
    }
}

fn key_present() -> bool {
    std::env::var(API_KEY_ENV)
        .map(|k| !k.trim().is_empty() && k.trim() != credentials::PLACEHOLDER_KEY)
        .unwrap_or(false)
}

#[tokio::test]
async fn test_full_generation_and_title_refill_live() {
    load_env();
    if !key_present() {
        eprintln!("SKIP: No {}", API_KEY_ENV);
        return;
    }

    let config = credentials::resolve();
    let endpoint = GeminiEndpoint::new(DEFAULT_TIMEOUT).unwrap();
    let coordinator = Coordinator::new(Gateway::new(Arc::new(endpoint)));

    let settings = EditorialSettings::from_raw(RawSettings {
        language: Some("en".into()),
        date_format: Some("YYYY-MM-DD".into()),
        ..Default::default()
    });
    let material = SourceMaterial::new(
        "City council approved a new park budget of $2M on Tuesday.",
        None,
        settings,
    );

    let start = std::time::Instant::now();
    let bundle = coordinator.generate(&material, &config, false).await.unwrap();
    eprintln!("[TEST] FULL returned in {}ms", start.elapsed().as_millis());
    for title in bundle.titles() {
        eprintln!("[TEST]   title: {}", title);
    }
    eprintln!("[TEST]   hashtags: {:?}", bundle.hashtags());

    assert_eq!(bundle.titles().len(), 3);
    assert!(!bundle.hashtags().is_empty());
    assert!(hashtags::find_tokens(bundle.article()).is_empty());

    let keep = vec![bundle.titles()[0].clone()];
    let titles = coordinator
        .regenerate_titles(&material, &bundle, &keep, &config)
        .await
        .unwrap();
    assert_eq!(titles.len(), 3);
    assert_eq!(titles[0], keep[0]);
}
