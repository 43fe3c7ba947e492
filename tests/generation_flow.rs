//! End-to-end generation and regeneration against a scripted endpoint.
//!
//! No network: every model reply comes from `support::ScriptedEndpoint`,
//! which also records what the gateway sent.

mod support;

use chrono::{DateTime, Duration, Utc};
use newsdesk_lib::cache::{FileCacheStorage, ManualClock, MemoryCacheStorage, ResultCache};
use newsdesk_lib::config::{EditorialSettings, RawSettings};
use newsdesk_lib::coordinator::{Coordinator, SourceMaterial};
use newsdesk_lib::credentials::{GatewayConfig, PLACEHOLDER_KEY};
use newsdesk_lib::llm::error::INVALID_RESPONSE_MESSAGE;
use newsdesk_lib::llm::gemini::DEFAULT_API_BASE;
use newsdesk_lib::llm::{hashtags, Gateway, GenerationError, GenerationResult};
use newsdesk_lib::session::{Applied, Session, Slice};
use std::sync::Arc;
use support::{ScriptedEndpoint, FULL_REPLY};

const SOURCE: &str = "City council approved a new park budget of $2M on Tuesday.";

fn config() -> GatewayConfig {
    GatewayConfig::new(Some("test-key".into()), "gemini-2.5-flash")
}

fn scenario_settings() -> EditorialSettings {
    EditorialSettings::from_raw(RawSettings {
        language: Some("en".into()),
        angle: Some("straight".into()),
        style: Some("professional".into()),
        goal: Some("google_news".into()),
        date_format: Some("YYYY-MM-DD".into()),
        min_word_count: Some(300),
    })
}

fn material() -> SourceMaterial {
    SourceMaterial::new(SOURCE, None, scenario_settings())
}

fn uncached(endpoint: &Arc<ScriptedEndpoint>) -> Coordinator {
    Coordinator::new(Gateway::new(endpoint.clone()))
}

fn start() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-21T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn full_generation_then_title_refill_keeps_locked_title() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(FULL_REPLY)
            .reply(r###"{"titles": ["Fresh one", "Fresh two"]}"###),
    );
    let coordinator = uncached(&endpoint);

    let bundle = coordinator.generate(&material(), &config(), true).await.unwrap();
    assert_eq!(bundle.titles(), ["A", "B", "C"]);
    assert!((5..=8).contains(&bundle.hashtags().len()));
    assert!(bundle.hashtags().iter().all(|t| hashtags::find_tokens(t) == vec![t.clone()]));
    assert!(!bundle.article().is_empty());
    assert!(hashtags::find_tokens(bundle.article()).is_empty());

    let locked = vec!["A".to_string()];
    let titles = coordinator
        .regenerate_titles(&material(), &bundle, &locked, &config())
        .await
        .unwrap();

    assert_eq!(titles, ["A", "Fresh one", "Fresh two"]);
    let call = endpoint.last_call();
    assert_eq!(call.schema, "titles");
    assert!(call.task_prompt.contains("exactly 2 NEW headline"));
    assert_eq!(endpoint.call_count(), 2);
}

#[tokio::test]
async fn refilled_titles_must_not_repeat_kept_ones() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(r###"{"titles": ["a", "Fresh"]}"###)
            .reply(r###"{"titles": ["Fresh", "fresh "]}"###),
    );
    let coordinator = uncached(&endpoint);
    let bundle = GenerationResult {
        titles: Some(vec!["A".into(), "B".into(), "C".into()]),
        hashtags: Some(vec!["#x".into()]),
        article: Some("An approved article.".into()),
    };
    let locked = vec!["A".to_string()];

    for _ in 0..2 {
        let err = coordinator
            .regenerate_titles(&material(), &bundle, &locked, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation(_)));
    }
    assert_eq!(endpoint.call_count(), 2);
}

#[tokio::test]
async fn api_base_travels_with_each_call() {
    let endpoint = Arc::new(ScriptedEndpoint::new().reply(FULL_REPLY).reply(FULL_REPLY));
    let coordinator = uncached(&endpoint);

    coordinator.generate(&material(), &config(), false).await.unwrap();
    let mut proxied = config();
    proxied.api_base = "http://localhost:8080/v1beta".into();
    coordinator.generate(&material(), &proxied, false).await.unwrap();

    let bases: Vec<String> = endpoint.calls().into_iter().map(|c| c.api_base).collect();
    assert_eq!(bases, [DEFAULT_API_BASE, "http://localhost:8080/v1beta"]);
}

#[tokio::test]
async fn full_generation_is_cached_until_ttl_elapses() {
    let endpoint = Arc::new(ScriptedEndpoint::new().reply(FULL_REPLY).reply(FULL_REPLY));
    let clock = Arc::new(ManualClock::new(start()));
    let cache = ResultCache::new(Arc::new(MemoryCacheStorage::new())).with_clock(clock.clone());
    let coordinator = Coordinator::new(Gateway::new(endpoint.clone()).with_cache(cache));

    let first = coordinator.generate(&material(), &config(), true).await.unwrap();
    clock.advance(Duration::days(6));
    let second = coordinator.generate(&material(), &config(), true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(endpoint.call_count(), 1);

    clock.advance(Duration::days(1) + Duration::seconds(1));
    coordinator.generate(&material(), &config(), true).await.unwrap();
    assert_eq!(endpoint.call_count(), 2);
}

#[tokio::test]
async fn cache_is_keyed_by_model_and_can_be_bypassed() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(FULL_REPLY)
            .reply(FULL_REPLY)
            .reply(FULL_REPLY),
    );
    let cache = ResultCache::new(Arc::new(MemoryCacheStorage::new()));
    let coordinator = Coordinator::new(Gateway::new(endpoint.clone()).with_cache(cache));

    coordinator.generate(&material(), &config(), true).await.unwrap();
    let other_model = GatewayConfig::new(Some("test-key".into()), "gemini-2.5-pro");
    coordinator.generate(&material(), &other_model, true).await.unwrap();
    coordinator.generate(&material(), &config(), false).await.unwrap();
    assert_eq!(endpoint.call_count(), 3);
}

#[tokio::test]
async fn on_disk_cache_survives_a_new_gateway() {
    let tmp = tempfile::tempdir().unwrap();
    let endpoint = Arc::new(ScriptedEndpoint::new().reply(FULL_REPLY));

    for _ in 0..2 {
        let cache = ResultCache::new(Arc::new(FileCacheStorage::new(tmp.path())));
        let coordinator = Coordinator::new(Gateway::new(endpoint.clone()).with_cache(cache));
        coordinator.generate(&material(), &config(), true).await.unwrap();
    }
    assert_eq!(endpoint.call_count(), 1);
}

#[tokio::test]
async fn regenerations_never_use_the_cache() {
    let reply = r###"{"hashtags": ["#One", "#Two"]}"###;
    let endpoint = Arc::new(ScriptedEndpoint::new().reply(reply).reply(reply));
    let cache = ResultCache::new(Arc::new(MemoryCacheStorage::new()));
    let coordinator = Coordinator::new(Gateway::new(endpoint.clone()).with_cache(cache));

    for _ in 0..2 {
        let tags = coordinator
            .regenerate_hashtags(&material(), "An approved article.", &config())
            .await
            .unwrap();
        assert_eq!(tags, ["#One", "#Two"]);
    }
    assert_eq!(endpoint.call_count(), 2);
}

#[tokio::test]
async fn all_locked_titles_make_no_call() {
    let endpoint = Arc::new(ScriptedEndpoint::new());
    let coordinator = uncached(&endpoint);
    let bundle = GenerationResult {
        titles: Some(vec!["A".into(), "B".into()]),
        hashtags: Some(vec!["#x".into()]),
        article: Some("Body.".into()),
    };
    let locked = vec!["B".to_string(), "A".to_string()];

    let err = coordinator
        .regenerate_titles(&material(), &bundle, &locked, &config())
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::NothingToRegenerate);
    assert_eq!(
        err.user_message(),
        "All titles are selected. Uncheck at least one to regenerate."
    );
    assert_eq!(endpoint.call_count(), 0);
}

#[tokio::test]
async fn missing_credential_makes_no_call() {
    let endpoint = Arc::new(ScriptedEndpoint::new().reply(FULL_REPLY));
    let coordinator = uncached(&endpoint);

    for key in [None, Some(String::new()), Some(PLACEHOLDER_KEY.to_string())] {
        let config = GatewayConfig::new(key, "gemini-2.5-flash");
        assert_eq!(
            coordinator.generate(&material(), &config, true).await,
            Err(GenerationError::MissingCredential)
        );
    }
    assert_eq!(endpoint.call_count(), 0);
}

#[tokio::test]
async fn regeneration_without_article_is_configuration_error() {
    let endpoint = Arc::new(ScriptedEndpoint::new());
    let coordinator = uncached(&endpoint);
    let err = coordinator
        .regenerate_hashtags(&material(), "   ", &config())
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::MissingPriorArticle);
    assert!(err.is_configuration());
    assert_eq!(endpoint.call_count(), 0);
}

#[tokio::test]
async fn partial_results_carry_only_their_field() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(r###"{"titles": ["One", "Two", "Three"], "article": "Stray", "hashtags": ["#x"]}"###)
            .reply(r###"{"hashtags": ["#x"], "titles": ["Stray"]}"###)
            .reply(r###"{"article": "Rewritten body.", "titles": ["Stray"]}"###),
    );
    let coordinator = uncached(&endpoint);
    let bundle = GenerationResult {
        titles: Some(vec!["A".into(), "B".into(), "C".into()]),
        hashtags: Some(vec!["#old".into()]),
        article: Some("Old body.".into()),
    };

    let titles = coordinator
        .regenerate_titles(&material(), &bundle, &[], &config())
        .await
        .unwrap();
    assert_eq!(titles, ["One", "Two", "Three"]);

    let tags = coordinator
        .regenerate_hashtags(&material(), "Old body.", &config())
        .await
        .unwrap();
    assert_eq!(tags, ["#x"]);

    let rewrite = coordinator
        .regenerate_article(&material(), "Old body.", &config(), false)
        .await
        .unwrap();
    assert_eq!(rewrite.article, "Rewritten body.");
    assert!(rewrite.hashtags.is_none());

    let schemas: Vec<&str> = endpoint.calls().iter().map(|c| c.schema).collect();
    assert_eq!(schemas, ["titles", "hashtags", "article"]);
}

#[tokio::test]
async fn article_cascade_derives_hashtags_from_new_text() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(r###"{"article": "NEW LEAD - Council funds parks."}"###)
            .reply(r###"{"hashtags": ["#Parks"]}"###),
    );
    let coordinator = uncached(&endpoint);

    let rewrite = coordinator
        .regenerate_article(&material(), "Old body.", &config(), true)
        .await
        .unwrap();
    assert_eq!(rewrite.article, "NEW LEAD - Council funds parks.");
    assert_eq!(rewrite.hashtags, Some(Ok(vec!["#Parks".to_string()])));

    let calls = endpoint.calls();
    assert!(calls[0].task_prompt.contains("Old body."));
    assert!(calls[1].task_prompt.contains("NEW LEAD - Council funds parks."));
}

#[tokio::test]
async fn cascade_failure_does_not_roll_back_article() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(r###"{"article": "Rewritten."}"###)
            .fail(GenerationError::Transport("503".into())),
    );
    let coordinator = uncached(&endpoint);

    let rewrite = coordinator
        .regenerate_article(&material(), "Old body.", &config(), true)
        .await
        .unwrap();
    assert_eq!(rewrite.article, "Rewritten.");
    assert!(matches!(rewrite.hashtags, Some(Err(GenerationError::Transport(_)))));
}

#[tokio::test]
async fn provider_misbehaviour_gets_generic_message() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply("")
            .reply(r###"{"titles": ["A", "B", "C"], "hashtags": ["#a", "#b", "#c", "#d", "#e"], "article": "Body with #Invented tag inside."}"###)
            .reply(r###"{"titles": ["A", "B", "C"], "hashtags": ["#a", "#b", "#c", "#d", "#e"]}"###)
            .reply(r###"{"titles": ["A", "B"], "hashtags": ["#a", "#b", "#c", "#d", "#e"], "article": "Body."}"###)
            .reply(r###"{"titles": ["A", "B", "C"], "hashtags": ["#a", "#b", "#c", "#d"], "article": "Body."}"###),
    );
    let coordinator = uncached(&endpoint);

    let empty = coordinator.generate(&material(), &config(), true).await.unwrap_err();
    assert_eq!(empty, GenerationError::EmptyResponse);

    for _ in 0..4 {
        let err = coordinator.generate(&material(), &config(), true).await.unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation(_)));
        assert_eq!(err.user_message(), INVALID_RESPONSE_MESSAGE);
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn transport_errors_are_not_retried() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .fail(GenerationError::Transport("connection reset".into()))
            .reply(FULL_REPLY),
    );
    let coordinator = uncached(&endpoint);
    let err = coordinator.generate(&material(), &config(), true).await.unwrap_err();
    assert_eq!(err, GenerationError::Transport("connection reset".into()));
    assert_eq!(endpoint.call_count(), 1);
}

#[tokio::test]
async fn gateway_forwards_credentials_and_model() {
    let endpoint = Arc::new(ScriptedEndpoint::new().reply(FULL_REPLY));
    let coordinator = uncached(&endpoint);
    let config = GatewayConfig::new(Some("  key-123  ".into()), "gemini-2.5-flash-lite");

    coordinator.generate(&material(), &config, true).await.unwrap();
    let call = endpoint.last_call();
    assert_eq!(call.api_key, "key-123");
    assert_eq!(call.model, "gemini-2.5-flash-lite");
    assert!(call.task_prompt.contains(SOURCE));
    assert_eq!(call.schema, "full");
}

#[tokio::test]
async fn session_drops_results_from_superseded_calls() {
    let endpoint = Arc::new(
        ScriptedEndpoint::new()
            .reply(FULL_REPLY)
            .reply(r###"{"hashtags": ["#First"]}"###)
            .reply(r###"{"hashtags": ["#Second"]}"###),
    );
    let coordinator = uncached(&endpoint);
    let mut session = Session::new();

    let ticket = session.begin(Slice::Full).unwrap();
    let bundle = coordinator.generate(&material(), &config(), true).await.unwrap();
    assert_eq!(session.apply_full(&ticket, bundle), Applied::Applied);

    let article = session.snapshot().article().to_string();
    let first = session.begin(Slice::Hashtags).unwrap();
    let second = session.begin(Slice::Hashtags).unwrap();
    let first_tags = coordinator
        .regenerate_hashtags(&material(), &article, &config())
        .await
        .unwrap();
    let second_tags = coordinator
        .regenerate_hashtags(&material(), &article, &config())
        .await
        .unwrap();

    assert_eq!(session.apply_hashtags(&second, second_tags), Applied::Applied);
    assert_eq!(session.apply_hashtags(&first, first_tags), Applied::Stale);
    assert_eq!(session.snapshot().hashtags(), ["#Second"]);
}
