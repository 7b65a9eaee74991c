//! End-to-end tests for the search aggregation pipeline: backend
//! fan-out against a mock provider, result merging, response
//! formatting, and transport chunking through the public API.

use omnisearch::orchestrator::settle_outcomes;
use omnisearch::{
    format_results, orchestrate_search, split_chunks, Aggregator, AggregatorConfig,
    AggregatorError, Backend, ChatMessage, GenerateOptions, Generator, SessionId,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn perplexica_only(server: &MockServer) -> AggregatorConfig {
    AggregatorConfig {
        backends: vec![Backend::Perplexica],
        perplexica_url: server.uri(),
        max_retries: 0,
        timeout_seconds: 2,
        cache_ttl_seconds: 0,
        ..Default::default()
    }
}

async fn mount_perplexica_answer(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Cats sleep for most of the day.",
            "sources": [
                {
                    "pageContent": "Domestic cats sleep 12 to 16 hours a day.",
                    "metadata": {
                        "title": "Cat Sleep Habits",
                        "url": "https://cats.example.com/sleep"
                    }
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fan_out_settles_against_live_provider() {
    let server = MockServer::start().await;
    mount_perplexica_answer(&server).await;

    let config = perplexica_only(&server);
    let results = orchestrate_search("cat sleep", &config).await;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.is_success(), "error: {:?}", result.error);
    assert_eq!(result.source, "Perplexica");
    assert!(result.content.contains("Cats sleep for most of the day."));
    assert!(result.content.contains("URL: https://cats.example.com/sleep"));
    assert_eq!(result.url.as_deref(), Some("https://cats.example.com/sleep"));
}

#[tokio::test]
async fn provider_failure_settles_to_failed_slot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = perplexica_only(&server);
    let results = orchestrate_search("anything", &config).await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].is_success());
    assert!(results[0].content.is_empty());
    assert!(results[0].error.is_some());
}

#[test]
fn mixed_outcomes_format_into_ordered_document() {
    let outcomes = vec![
        (
            Backend::DuckDuckGo,
            Ok("cat facts from the web\n\n• Cat Facts\n  URL: https://catfacts.example.com".to_string()),
        ),
        (
            Backend::Perplexica,
            Err(AggregatorError::ExhaustedRetries {
                backend: "Perplexica".into(),
                message: "network error: refused".into(),
            }),
        ),
        (
            Backend::Brave,
            Ok("cat trivia collection\n\n• Cat Trivia\n  URL: https://trivia.example.com/cats".to_string()),
        ),
    ];

    let results = settle_outcomes(outcomes);
    let document = format_results(&results, &AggregatorConfig::default());

    assert!(document.starts_with("Search Sources Used:"));
    assert!(document.contains("✅ DuckDuckGo"));
    assert!(document.contains("❌ Perplexica"));
    assert!(document.contains("✅ Brave"));

    // First success leads, later successes follow under the grouped
    // header, regardless of which backend finished first.
    let facts = document.find("cat facts from the web").expect("lead content");
    let additional = document
        .find("### Additional Information")
        .expect("grouped header");
    let trivia = document.find("cat trivia collection").expect("second content");
    assert!(facts < additional);
    assert!(additional < trivia);

    // Sources numbered in backend order, failed slot contributes none.
    let one = document.find("[1] https://catfacts.example.com").expect("[1]");
    let two = document
        .find("[2] https://trivia.example.com/cats")
        .expect("[2]");
    assert!(one < two);
}

#[test]
fn formatted_document_chunks_without_loss() {
    let long_block = format!(
        "filler sentence about cats. {}\n\n• Cat Encyclopedia\n  URL: https://cats.example.com/all",
        "more filler text here. ".repeat(400)
    );
    let results = settle_outcomes(vec![
        (Backend::DuckDuckGo, Ok(long_block.clone())),
        (Backend::Perplexica, Ok(long_block)),
    ]);

    let config = AggregatorConfig::default();
    let document = format_results(&results, &config);
    assert!(document.chars().count() > config.chunk_limit);

    let chunks = split_chunks(&document, config.chunk_limit);
    assert!(chunks.len() >= 2);
    for chunk in &chunks {
        assert!(chunk.chars().count() <= config.chunk_limit);
    }
    assert_eq!(chunks.concat(), document);
}

struct CannedGenerator {
    reply: String,
}

impl Generator for CannedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _history: &[ChatMessage],
        _options: &GenerateOptions,
    ) -> Result<String, AggregatorError> {
        Ok(self.reply.clone())
    }
}

#[tokio::test]
async fn conversational_turn_produces_annotated_chunks() {
    let server = MockServer::start().await;
    mount_perplexica_answer(&server).await;

    let generator = CannedGenerator {
        reply: "Cats are crepuscular.\n\n**Answer:** Cats sleep 12 to 16 hours a day."
            .to_string(),
    };
    let aggregator =
        Aggregator::new(perplexica_only(&server), generator).expect("valid config");

    let session = SessionId::new("turn-test");
    let chunks = aggregator
        .respond(&session, "how long do cats sleep")
        .await
        .expect("turn should succeed");

    assert!(!chunks.is_empty());
    let document = chunks.concat();
    assert!(document.starts_with("Search Sources Used:"));
    assert!(document.contains("✅ Perplexica"));
    assert!(document.contains("⚠️ DuckDuckGo"));
    assert!(document.contains("**Answer:** Cats sleep 12 to 16 hours a day."));
    assert!(document.contains("[1] https://cats.example.com/sleep"));

    // Both sides of the turn are recorded.
    let history = aggregator.sessions().history(&session);
    assert!(history
        .iter()
        .any(|m| m.content == "how long do cats sleep"));
    assert!(history.iter().any(|m| m.content.contains("crepuscular")));
}
