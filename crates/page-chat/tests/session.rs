use std::fs;
use std::time::Duration;

use page_chat::SessionBuilder;
use page_chat::extract::HtmlPageReader;
use page_chat_core::{ControllerEvent, SubmitOutcome};
use page_chat_model::PageContentProvider;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

const PAGE: &str = "<html><head><title>Owls</title></head>\
                    <body><script>track()</script><p>Owls are birds.</p>\
                    </body></html>";
const QUESTION: &str = "What is this page about?";

async fn mount_page(server: &MockServer) {
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/owls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PAGE, "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_suggestions(server: &MockServer, context: &str) {
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/suggested-questions"))
        .and(matchers::body_json(json!({ "context": context })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suggestions": [QUESTION]
        })))
        .mount(server)
        .await;
}

async fn wait_for(
    events_rx: &mut mpsc::UnboundedReceiver<ControllerEvent>,
    mut pred: impl FnMut(&ControllerEvent) -> bool,
) {
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events_rx.recv().await.unwrap();
            if pred(&event) {
                return;
            }
        }
    })
    .await
    .expect("timed out waiting for an event");
}

fn has_suggestions(event: &ControllerEvent) -> bool {
    matches!(event, ControllerEvent::SuggestionsChanged(s) if !s.is_empty())
}

#[tokio::test]
async fn test_html_page_reader() {
    let server = MockServer::start().await;
    mount_page(&server).await;

    let reader = HtmlPageReader::new();
    let content = reader
        .fetch_content(&format!("{}/owls", server.uri()))
        .await
        .unwrap();
    assert_eq!(content, "Owls are birds.");

    // Not mounted, so the server answers 404.
    assert!(
        reader
            .fetch_content(&format!("{}/missing", server.uri()))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_chat_about_page() {
    let server = MockServer::start().await;
    mount_page(&server).await;
    mount_suggestions(&server, "Owls are birds.").await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chat"))
        .and(matchers::body_json(json!({
            "context": "Owls are birds.",
            "question": QUESTION
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "It's about owls.",
            "in_scope": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let history_file = dir.path().join("history.json");
    let url = format!("{}/owls", server.uri());

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::new()
        .with_base_url(server.uri())
        .with_history_file(&history_file)
        .on_event(move |event| {
            events_tx.send(event).ok();
        })
        .build()
        .unwrap();
    session.open(&url).unwrap();
    wait_for(&mut events_rx, has_suggestions).await;

    assert_eq!(session.ask(QUESTION).await.unwrap(), SubmitOutcome::Accepted);
    wait_for(&mut events_rx, |event| *event == ControllerEvent::Idle).await;
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(
        snapshot.transcript.last().unwrap().content(),
        "It's about owls."
    );
    assert!(snapshot.notices.is_empty());
    drop(session);

    // The file maps history keys to serialized transcripts.
    let file: Value =
        serde_json::from_str(&fs::read_to_string(&history_file).unwrap())
            .unwrap();
    let stored = file[format!("chat-history:{url}")].as_str().unwrap();
    let transcript: Value = serde_json::from_str(stored).unwrap();
    assert_eq!(transcript.as_array().unwrap().len(), 3);
    assert_eq!(
        transcript[1],
        json!({ "role": "user", "content": QUESTION })
    );

    // A new session picks up where the last one stopped.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::new()
        .with_base_url(server.uri())
        .with_history_file(&history_file)
        .on_event(move |event| {
            events_tx.send(event).ok();
        })
        .build()
        .unwrap();
    session.open(&url).unwrap();
    wait_for(&mut events_rx, |event| {
        matches!(event, ControllerEvent::Activated { .. })
    })
    .await;
    assert_eq!(session.snapshot().await.unwrap().transcript.len(), 3);
}

#[tokio::test]
async fn test_unreadable_page_uses_url() {
    let server = MockServer::start().await;
    let url = format!("{}/missing", server.uri());
    mount_suggestions(&server, &url).await;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::new()
        .with_base_url(server.uri())
        .on_event(move |event| {
            events_tx.send(event).ok();
        })
        .build()
        .unwrap();
    session.open(&url).unwrap();
    wait_for(&mut events_rx, has_suggestions).await;
}

#[tokio::test]
async fn test_without_page_reader() {
    let server = MockServer::start().await;
    mount_page(&server).await;
    let url = format!("{}/owls", server.uri());
    mount_suggestions(&server, &url).await;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::new()
        .with_base_url(server.uri())
        .without_page_reader()
        .on_event(move |event| {
            events_tx.send(event).ok();
        })
        .build()
        .unwrap();
    session.open(&url).unwrap();
    wait_for(&mut events_rx, has_suggestions).await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|req| req.url.path() != "/owls"));
}
