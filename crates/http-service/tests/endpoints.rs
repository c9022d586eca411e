use std::net::TcpListener;

use page_chat_http_service::{HttpService, HttpServiceConfigBuilder};
use page_chat_model::{
    AnswerRequest, ErrorKind, QaService, ServiceError, SuggestionsRequest,
};
use serde_json::json;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

fn service_for(server: &MockServer) -> HttpService {
    let config = HttpServiceConfigBuilder::new()
        .with_base_url(server.uri())
        .build();
    HttpService::new(config)
}

fn answer_request() -> AnswerRequest {
    AnswerRequest {
        context: "https://a.test".to_owned(),
        question: "What is this page about?".to_owned(),
    }
}

#[tokio::test]
async fn test_get_answer() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat"))
        .and(matchers::body_json(json!({
            "context": "https://a.test",
            "question": "What is this page about?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "It's a blog post.",
            "in_scope": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = service_for(&server)
        .get_answer(&answer_request())
        .await
        .unwrap();
    assert_eq!(answer.answer, "It's a blog post.");
    assert!(answer.in_scope);
}

#[tokio::test]
async fn test_get_answer_out_of_scope() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Sorry, that question is outside the scope of this page.",
            "in_scope": false
        })))
        .mount(&server)
        .await;

    let answer = service_for(&server)
        .get_answer(&answer_request())
        .await
        .unwrap();
    assert!(!answer.in_scope);
}

#[tokio::test]
async fn test_get_suggested_questions() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/suggested-questions"))
        .and(matchers::body_json(json!({ "context": "Owls are birds." })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suggestions": [
                "What are owls?",
                "Where do owls live?",
                "What do owls eat?"
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let suggestions = service_for(&server)
        .get_suggested_questions(&SuggestionsRequest {
            context: "Owls are birds.".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(
        suggestions.suggestions,
        vec!["What are owls?", "Where do owls live?", "What do owls eat?"]
    );
}

#[tokio::test]
async fn test_non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(r#"{"detail":"model unavailable"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = service_for(&server)
        .get_answer(&answer_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), r#"{"detail":"model unavailable"}"#);
}

#[tokio::test]
async fn test_html_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/suggested-questions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>proxy login</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .get_suggested_questions(&SuggestionsRequest {
            context: "https://a.test".to_owned(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_malformed_json_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"answer": 42}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .get_answer(&answer_request())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Nothing listens on a port once its listener is closed.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let config = HttpServiceConfigBuilder::new()
        .with_base_url(format!("http://{addr}"))
        .build();
    let service = HttpService::new(config);

    let err = service.get_answer(&answer_request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.status(), None);
}
