use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use voicebot::asr::wyoming::{encode_event, read_event, WyomingEvent};
use voicebot::asr::WyomingClient;
use voicebot::error::CaptureError;

/// One-shot Wyoming server: collects the client's events until
/// audio-stop, then answers with `transcript`.
async fn mock_server(transcript: &'static str) -> (u16, JoinHandle<Vec<WyomingEvent>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let mut events = Vec::new();
        while let Some(event) = read_event(&mut reader).await.unwrap() {
            let done = event.event_type == "audio-stop";
            events.push(event);
            if done {
                break;
            }
        }

        let reply = encode_event(
            "transcript",
            serde_json::json!({ "text": transcript }),
            &[],
        );
        writer.write_all(&reply).await.unwrap();
        writer.flush().await.unwrap();
        events
    });

    (port, handle)
}

#[tokio::test]
async fn test_transcribe_round_trip() {
    let (port, server) = mock_server(" Open Chrome ").await;
    let client = WyomingClient::new("127.0.0.1", port);

    let pcm: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    let text = client.transcribe(&pcm, "en-US").await.unwrap();
    assert_eq!(text, "Open Chrome");

    let events = server.await.unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["transcribe", "audio-start", "audio-chunk", "audio-chunk", "audio-chunk", "audio-stop"]
    );
    assert_eq!(events[0].data["language"], "en");
    assert_eq!(events[1].data["rate"], 16000);

    let received: Vec<u8> = events
        .iter()
        .filter(|e| e.event_type == "audio-chunk")
        .flat_map(|e| e.payload.clone())
        .collect();
    assert_eq!(received, pcm);
}

#[tokio::test]
async fn test_empty_transcript_is_unintelligible() {
    let (port, server) = mock_server("   ").await;
    let client = WyomingClient::new("127.0.0.1", port);

    let err = client.transcribe(&[0u8; 64], "en-US").await.unwrap_err();
    assert_eq!(err, CaptureError::Unintelligible);
    server.await.unwrap();
}

#[tokio::test]
async fn test_closed_connection_is_service_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);
        // Drain the request, then hang up without answering
        while let Ok(Some(event)) = read_event(&mut reader).await {
            if event.event_type == "audio-stop" {
                break;
            }
        }
    });

    let client = WyomingClient::new("127.0.0.1", port);
    let err = client.transcribe(&[0u8; 64], "en-US").await.unwrap_err();
    assert!(matches!(err, CaptureError::Service(_)));
    server.await.unwrap();
}
