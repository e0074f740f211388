//! HTTP adapters against a local mock server

use potluck_engine::bot::TelegramChannel;
use potluck_engine::catalog::picnic::password_digest;
use potluck_engine::catalog::PicnicClient;
use potluck_engine::llm::anthropic::AnthropicProvider;
use potluck_engine::llm::ollama::OllamaProvider;
use potluck_engine::llm::{CompletionRequest, LLMError, LLMProvider};
use sdk::{Catalog, EngineError, MessageChannel};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> CompletionRequest {
    CompletionRequest::new("test-model", "Answer in JSON.", "Plan dinner")
}

#[tokio::test]
async fn test_anthropic_concatenates_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "secret-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "system": "Answer in JSON.",
            "messages": [{ "role": "user", "content": "Plan dinner" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "text", "text": "{\"ok\":" },
                { "type": "text", "text": " true}" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::new(server.uri(), "secret-key");
    let text = provider.complete(&request()).await.unwrap();
    assert_eq!(text, "{\"ok\": true}");
}

#[tokio::test]
async fn test_anthropic_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "limited"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "wrong"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "overloaded"))
        .respond_with(ResponseTemplate::new(529))
        .mount(&server)
        .await;

    let limited = AnthropicProvider::new(server.uri(), "limited");
    assert!(matches!(
        limited.complete(&request()).await,
        Err(LLMError::RateLimitExceeded)
    ));

    let wrong = AnthropicProvider::new(server.uri(), "wrong");
    assert!(matches!(
        wrong.complete(&request()).await,
        Err(LLMError::AuthenticationFailed(_))
    ));

    let overloaded = AnthropicProvider::new(server.uri(), "overloaded");
    assert!(matches!(
        overloaded.complete(&request()).await,
        Err(LLMError::ProviderUnavailable(_))
    ));
}

#[tokio::test]
async fn test_ollama_chat_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
            "messages": [
                { "role": "system", "content": "Answer in JSON." },
                { "role": "user", "content": "Plan dinner" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "test-model",
            "message": { "role": "assistant", "content": "[]" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri());
    assert_eq!(provider.complete(&request()).await.unwrap(), "[]");
}

#[tokio::test]
async fn test_ollama_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
        .mount(&server)
        .await;

    let provider = OllamaProvider::new(server.uri());
    match provider.complete(&request()).await {
        Err(LLMError::ProviderUnavailable(msg)) => assert!(msg.contains("model not found")),
        other => panic!("expected ProviderUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_telegram_poll_filters_updates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getUpdates"))
        .and(query_param("offset", "6"))
        .and(query_param("timeout", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 8,
                    "message": { "date": 1_709_550_000, "text": "ok", "from": { "id": 100 } }
                },
                {
                    "update_id": 6,
                    "message": { "date": 1_709_540_000, "text": "plan eten", "from": { "id": 100 } }
                },
                {
                    "update_id": 7,
                    "message": { "date": 1_709_545_000, "from": { "id": 200 } }
                },
                { "update_id": 9 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(server.uri(), "TOKEN");
    let messages = channel.poll_new(Some(5)).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, 6);
    assert_eq!(messages[0].sender, "100");
    assert_eq!(messages[0].text, "plan eten");
    assert_eq!(messages[0].received_at.timestamp(), 1_709_540_000);
    assert_eq!(messages[1].id, 8);
}

#[tokio::test]
async fn test_telegram_api_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/botTOKEN/getUpdates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": false,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(server.uri(), "TOKEN");
    match channel.poll_new(None).await {
        Err(EngineError::Transport(msg)) => assert!(msg.contains("Unauthorized")),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_telegram_send() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_partial_json(json!({ "chat_id": "100", "text": "Hallo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_partial_json(json!({ "chat_id": "999" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "description": "chat not found"
        })))
        .mount(&server)
        .await;

    let channel = TelegramChannel::new(server.uri(), "TOKEN");
    assert!(channel.send("100", "Hallo").await);
    assert!(!channel.send("999", "Hallo").await);
    assert!(!channel.send("100", "   ").await);
}

fn search_body() -> serde_json::Value {
    json!([
        {
            "type": "SINGLE_ARTICLE",
            "items": [
                { "id": "s1", "name": "Halfvolle melk", "unit_quantity": "1 liter", "display_price": 109 },
                { "id": "s2", "name": "Volle melk", "unit_quantity": "1 liter", "display_price": 125 }
            ]
        },
        { "type": "CATEGORY" }
    ])
}

#[tokio::test]
async fn test_picnic_logs_in_once_and_searches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_partial_json(json!({
            "key": "anna@example.com",
            "secret": password_digest("secret"),
            "client_id": 30100
        })))
        .respond_with(ResponseTemplate::new(200).insert_header("x-picnic-auth", "tok-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("search_term", "melk"))
        .and(header("x-picnic-auth", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cart/add_product"))
        .and(header("x-picnic-auth", "tok-1"))
        .and(body_partial_json(json!({ "product_id": "s1", "count": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = PicnicClient::new(server.uri(), "anna@example.com", "secret");
    let products = client.search("melk").await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "s1");
    assert_eq!(products[0].price_cents, Some(109));

    client.search("melk").await.unwrap();
    client.add_product("s1", 2).await.unwrap();
}

#[tokio::test]
async fn test_picnic_relogin_on_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-picnic-auth", "tok-old"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-picnic-auth", "tok-new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("x-picnic-auth", "tok-old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("x-picnic-auth", "tok-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = PicnicClient::new(server.uri(), "anna@example.com", "secret");
    let products = client.search("melk").await.unwrap();
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn test_picnic_rejected_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = PicnicClient::new(server.uri(), "anna@example.com", "wrong");
    assert!(matches!(
        client.search("melk").await,
        Err(EngineError::CatalogAuth(_))
    ));
}
