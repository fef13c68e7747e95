//! Integration tests for the voice client against an in-process WebSocket server.
//!
//! ```bash
//! cargo test --test voice_client
//! ```

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

use w3w_wrapper::voice::{State, ABORTED_BY_NEW_REQUEST, TERMINATED_BY_USER};
use w3w_wrapper::{
    AudioStream, AudioStreamConfig, AutosuggestOptions, ClientConfig, Rfc5646Language,
    Suggestion, VoiceClient, VoiceClientError, VoiceDataSource, W3wError, W3wResult,
};

const WAIT: Duration = Duration::from_secs(5);

type Ws = WebSocketStream<TcpStream>;
type Status = W3wResult<Vec<Suggestion>>;

// ============================================================================
// Mock voice server
// ============================================================================

async fn accept(listener: &TcpListener) -> (String, Ws) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut uri = String::new();
    let ws = accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            uri = req.uri().to_string();
            Ok(resp)
        },
    )
    .await
    .unwrap();
    (uri, ws)
}

/// Serve a single connection with `script`; the config points the client at it.
async fn serve_once<F, Fut, T>(script: F) -> (ClientConfig, JoinHandle<T>)
where
    F: FnOnce(String, Ws) -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send,
    T: Send + 'static,
{
    let _ = env_logger::builder().is_test(true).try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (uri, ws) = accept(&listener).await;
        script(uri, ws).await
    });
    let config = ClientConfig::new("TEST_KEY").with_voice_host(format!("ws://{}", addr));
    (config, handle)
}

/// Wait for the `StartRecognition` control frame.
async fn expect_start_recognition(ws: &mut Ws) -> serde_json::Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("Expected StartRecognition, got {:?}", other),
        }
    }
}

async fn send_json(ws: &mut Ws, value: serde_json::Value) {
    use futures_util::SinkExt;
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

async fn close_with(ws: &mut Ws, code: u16, reason: &str) {
    ws.close(Some(CloseFrame {
        code: CloseCode::from(code),
        reason: reason.to_string().into(),
    }))
    .await
    .unwrap();
    while let Some(Ok(_)) = ws.next().await {}
}

/// Drain frames until the client closes; returns the close frame and every
/// binary byte received before it.
async fn until_client_close(ws: &mut Ws) -> (Option<(u16, String)>, Vec<u8>) {
    let mut audio = Vec::new();
    while let Some(Ok(message)) = ws.next().await {
        match message {
            Message::Binary(bytes) => audio.extend(bytes),
            Message::Close(frame) => {
                let frame = frame.map(|f| (u16::from(f.code), f.reason.into_owned()));
                return (frame, audio);
            }
            _ => {}
        }
    }
    (None, audio)
}

fn suggestions_message() -> serde_json::Value {
    json!({
        "message": "Suggestions",
        "suggestions": [{
            "country": "GB",
            "nearestPlace": "Bayswater, London",
            "words": "filled.count.soap",
            "rank": 1,
            "language": "en",
            "coordinates": {"lat": 51.520847, "lng": -0.195521},
            "square": {
                "southwest": {"lng": -0.195543, "lat": 51.520833},
                "northeast": {"lng": -0.195499, "lat": 51.52086}
            }
        }]
    })
}

// ============================================================================
// Client helpers
// ============================================================================

fn status_channel() -> (
    impl FnOnce(Status) + Send + 'static,
    mpsc::UnboundedReceiver<Status>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |status: Status| {
            let _ = tx.send(status);
        },
        rx,
    )
}

/// The one status of a session, and proof that no second one follows.
async fn only_status(rx: &mut mpsc::UnboundedReceiver<Status>) -> Status {
    let status = timeout(WAIT, rx.recv())
        .await
        .expect("no status reported")
        .expect("status callback dropped without being called");
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
    status
}

async fn wait_for_state(client: &VoiceClient, wanted: fn(&State) -> bool) {
    let mut states = client.subscribe();
    timeout(WAIT, states.wait_for(wanted))
        .await
        .expect("state not reached")
        .unwrap();
}

fn silent_audio() -> (AudioStream, mpsc::Sender<Vec<i16>>) {
    AudioStream::channel(AudioStreamConfig::default(), 8)
}

// ============================================================================
// Terminal paths
// ============================================================================

#[tokio::test]
async fn mock_suggestions_after_streaming_audio() {
    let (config, server) = serve_once(|uri, mut ws| async move {
        let start = expect_start_recognition(&mut ws).await;
        send_json(&mut ws, json!({"message": "RecognitionStarted"})).await;

        // Two buffers of two samples each
        let mut audio = Vec::new();
        while audio.len() < 8 {
            match ws.next().await {
                Some(Ok(Message::Binary(bytes))) => audio.extend(bytes),
                Some(Ok(_)) => {}
                other => panic!("Expected audio, got {:?}", other),
            }
        }
        send_json(&mut ws, suggestions_message()).await;
        let (close, _) = until_client_close(&mut ws).await;
        (uri, start, audio, close)
    })
    .await;

    let (audio, producer) = silent_audio();
    producer.send(vec![1, -2]).await.unwrap();
    producer.send(vec![3, 4]).await.unwrap();
    drop(producer);

    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    let suggestions = only_status(&mut rx).await.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].address.words, "filled.count.soap");
    assert!(suggestions[0].address.center.is_some());

    let (uri, start, audio, close) = timeout(WAIT, server).await.unwrap().unwrap();
    assert!(uri.starts_with("/v1/autosuggest?"));
    assert!(uri.contains("voice-language=en"));
    assert!(uri.ends_with("key=TEST_KEY"));
    assert_eq!(
        start,
        json!({
            "message": "StartRecognition",
            "audio_format": {"type": "raw", "encoding": "pcm_s16le", "sample_rate": 44100}
        })
    );
    assert_eq!(audio, vec![0x01, 0x00, 0xFE, 0xFF, 0x03, 0x00, 0x04, 0x00]);
    assert_eq!(close.map(|(code, _)| code), Some(1000));
    assert_eq!(client.state(), State::Terminated);
}

#[tokio::test]
async fn mock_streaming_error_is_reported() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        send_json(&mut ws, json!({"message": "RecognitionStarted"})).await;
        send_json(
            &mut ws,
            json!({"message": "Error", "type": "AudioError", "code": 2, "reason": "unsupported sample rate"}),
        )
        .await;
        until_client_close(&mut ws).await
    })
    .await;

    let (audio, _producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    let err = only_status(&mut rx).await.unwrap_err();
    assert_eq!(
        err,
        W3wError::Streaming {
            kind: "AudioError".to_string(),
            code: Some(2),
            reason: "unsupported sample rate".to_string(),
        }
    );
}

#[tokio::test]
async fn mock_w3w_error_is_classified() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        send_json(
            &mut ws,
            json!({"message": "W3WError", "error": {"code": "BadClipToCountry", "message": "Invalid country"}}),
        )
        .await;
        // Server hangs up right after; the client must not report twice.
        close_with(&mut ws, 1011, "going away").await;
    })
    .await;

    let (audio, _producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    let err = only_status(&mut rx).await.unwrap_err();
    assert!(matches!(err, W3wError::BadClipToCountry(_)));
    assert_eq!(err.message(), "Invalid country");
}

#[tokio::test]
async fn mock_abnormal_close_with_json_reason() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        close_with(
            &mut ws,
            4001,
            r#"{"code":"InvalidKey","message":"Authentication failed"}"#,
        )
        .await;
    })
    .await;

    let (audio, _producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    match only_status(&mut rx).await.unwrap_err() {
        W3wError::Connection(api) => {
            assert_eq!(api.code, "InvalidKey");
            assert_eq!(api.message, "Authentication failed");
        }
        other => panic!("Expected Connection error, got {:?}", other),
    }
}

#[tokio::test]
async fn mock_abnormal_close_with_plain_reason() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        close_with(&mut ws, 1011, "recognizer crashed").await;
    })
    .await;

    let (audio, _producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    match only_status(&mut rx).await.unwrap_err() {
        W3wError::Connection(api) => {
            assert_eq!(api.code, "NetworkError");
            assert_eq!(api.message, "recognizer crashed");
        }
        other => panic!("Expected Connection error, got {:?}", other),
    }
}

#[tokio::test]
async fn mock_dropped_connection_is_network_error() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        drop(ws);
    })
    .await;

    let (audio, _producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    let err = only_status(&mut rx).await.unwrap_err();
    assert!(matches!(err, W3wError::Connection(ref api) if api.code == "NetworkError"));
}

#[tokio::test]
async fn mock_unreachable_server_is_connection_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = ClientConfig::new("TEST_KEY").with_voice_host(format!("ws://127.0.0.1:{}", port));

    let (audio, producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();

    let err = only_status(&mut rx).await.unwrap_err();
    assert!(matches!(err, W3wError::Connection(ref api) if api.code == "NetworkError"));
    // The session released its audio source.
    assert!(timeout(WAIT, producer.closed()).await.is_ok());
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn mock_manual_close_reports_nothing() {
    let (config, server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        send_json(&mut ws, json!({"message": "RecognitionStarted"})).await;
        until_client_close(&mut ws).await
    })
    .await;

    let (audio, producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();
    wait_for_state(&client, |s| matches!(s, State::Streaming { .. })).await;

    client.close(TERMINATED_BY_USER).unwrap();
    client.close(TERMINATED_BY_USER).unwrap();
    wait_for_state(&client, |s| *s == State::Terminated).await;

    // Callback dropped unused
    assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
    assert!(timeout(WAIT, producer.closed()).await.is_ok());

    let (close, _) = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(close, Some((1000, TERMINATED_BY_USER.to_string())));
}

#[tokio::test]
async fn mock_operations_require_initialize() {
    let mut client = VoiceClient::new(&ClientConfig::new("TEST_KEY"));
    assert_eq!(
        client.open_and_start_recognition(|_| {}),
        Err(VoiceClientError::NotInitialized)
    );
    assert_eq!(client.close("bye"), Err(VoiceClientError::NotInitialized));
}

#[tokio::test]
async fn mock_reopen_after_terminal_needs_initialize() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        send_json(&mut ws, suggestions_message()).await;
        until_client_close(&mut ws).await
    })
    .await;

    let (audio, _producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    let (on_status, mut rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(on_status)
        .unwrap();
    assert!(only_status(&mut rx).await.is_ok());

    assert_eq!(
        client.open_and_start_recognition(|_| {}),
        Err(VoiceClientError::NotInitialized)
    );
}

#[tokio::test]
async fn mock_new_open_aborts_live_session() {
    let _ = env_logger::builder().is_test(true).try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (_, mut first) = accept(&listener).await;
        let first = tokio::spawn(async move {
            expect_start_recognition(&mut first).await;
            send_json(&mut first, json!({"message": "RecognitionStarted"})).await;
            until_client_close(&mut first).await.0
        });

        let (_, mut second) = accept(&listener).await;
        expect_start_recognition(&mut second).await;
        send_json(&mut second, suggestions_message()).await;
        until_client_close(&mut second).await;

        first.await.unwrap()
    });

    let config = ClientConfig::new("TEST_KEY").with_voice_host(format!("ws://{}", addr));
    let mut client = VoiceClient::new(&config);

    let (audio, _first_producer) = silent_audio();
    let (first_status, mut first_rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(first_status)
        .unwrap();
    wait_for_state(&client, |s| matches!(s, State::Streaming { .. })).await;

    let (audio, _second_producer) = silent_audio();
    let (second_status, mut second_rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(second_status)
        .unwrap();

    assert!(only_status(&mut second_rx).await.is_ok());
    assert!(timeout(WAIT, first_rx.recv()).await.unwrap().is_none());

    let first_close = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(first_close, Some((1000, ABORTED_BY_NEW_REQUEST.to_string())));
}

#[tokio::test]
async fn mock_initialize_during_live_session_arms_next_open() {
    let _ = env_logger::builder().is_test(true).try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (prepared_tx, prepared_rx) = oneshot::channel::<()>();
    let _server = tokio::spawn(async move {
        let (_, mut first) = accept(&listener).await;
        expect_start_recognition(&mut first).await;
        send_json(&mut first, json!({"message": "RecognitionStarted"})).await;
        prepared_rx.await.unwrap();
        send_json(&mut first, suggestions_message()).await;
        until_client_close(&mut first).await;

        let (_, mut second) = accept(&listener).await;
        expect_start_recognition(&mut second).await;
        send_json(&mut second, suggestions_message()).await;
        until_client_close(&mut second).await;
    });

    let config = ClientConfig::new("TEST_KEY").with_voice_host(format!("ws://{}", addr));
    let mut client = VoiceClient::new(&config);

    let (audio, _first_producer) = silent_audio();
    let (first_status, mut first_rx) = status_channel();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(first_status)
        .unwrap();
    wait_for_state(&client, |s| matches!(s, State::Streaming { .. })).await;

    // Prepare the next request while the first is still streaming
    let (audio, _second_producer) = silent_audio();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap();
    prepared_tx.send(()).unwrap();

    assert!(only_status(&mut first_rx).await.is_ok());
    wait_for_state(&client, |s| *s == State::Initialized).await;

    let (second_status, mut second_rx) = status_channel();
    client.open_and_start_recognition(second_status).unwrap();
    assert_eq!(only_status(&mut second_rx).await.unwrap().len(), 1);
    assert_eq!(client.state(), State::Terminated);
}

#[tokio::test]
async fn mock_manual_close_also_closes_audio_prepared_mid_session() {
    let (config, _server) = serve_once(|_, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        send_json(&mut ws, json!({"message": "RecognitionStarted"})).await;
        until_client_close(&mut ws).await
    })
    .await;

    let (audio, _first_producer) = silent_audio();
    let mut client = VoiceClient::new(&config);
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap()
        .open_and_start_recognition(|_| {})
        .unwrap();
    wait_for_state(&client, |s| matches!(s, State::Streaming { .. })).await;

    let (audio, second_producer) = silent_audio();
    client
        .initialize(&Rfc5646Language::EnGb.into(), None, audio)
        .unwrap();
    client.close(TERMINATED_BY_USER).unwrap();
    wait_for_state(&client, |s| *s == State::Terminated).await;

    assert!(timeout(WAIT, second_producer.closed()).await.is_ok());
    assert_eq!(client.state(), State::Terminated);
    assert_eq!(
        client.open_and_start_recognition(|_| {}),
        Err(VoiceClientError::NotInitialized)
    );
}

#[tokio::test]
async fn mock_datasource_routes_coordinates_requests() {
    let (config, server) = serve_once(|uri, mut ws| async move {
        expect_start_recognition(&mut ws).await;
        send_json(&mut ws, suggestions_message()).await;
        until_client_close(&mut ws).await;
        uri
    })
    .await;

    let options = AutosuggestOptions::builder()
        .include_coordinates(true)
        .n_results(3)
        .build();
    let (audio, _producer) = silent_audio();
    let mut source = VoiceDataSource::new(&config);
    let (on_result, mut rx) = status_channel();
    source
        .autosuggest(
            audio,
            &Rfc5646Language::ZhHans.into(),
            Some(&options),
            on_result,
        )
        .unwrap();

    assert_eq!(only_status(&mut rx).await.unwrap().len(), 1);

    let uri = timeout(WAIT, server).await.unwrap().unwrap();
    assert!(uri.starts_with("/v1/autosuggest-with-coordinates?"));
    assert!(uri.contains("n-results=3"));
    assert!(uri.contains("voice-language=cmn"));
}
