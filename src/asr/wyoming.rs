//! Wyoming Protocol Client
//!
//! Sends one recorded phrase to an external ASR service and waits for the
//! transcript. Wyoming events are a JSON header line, optionally followed
//! by `data_length` bytes of JSON data and `payload_length` bytes of
//! binary payload.
//!
//! Reference: https://github.com/rhasspy/wyoming

use crate::audio::SAMPLE_RATE;
use crate::error::CaptureError;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Bytes of audio per audio-chunk event
const CHUNK_BYTES: usize = 2048;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const TRANSCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// A decoded Wyoming event
#[derive(Debug, Clone, PartialEq)]
pub struct WyomingEvent {
    pub event_type: String,
    pub data: Value,
    pub payload: Vec<u8>,
}

/// Serialize one event (header line + payload)
pub fn encode_event(event_type: &str, data: Value, payload: &[u8]) -> Vec<u8> {
    let mut header = Map::new();
    header.insert("type".into(), json!(event_type));
    if !data.is_null() {
        header.insert("data".into(), data);
    }
    if !payload.is_empty() {
        header.insert("payload_length".into(), json!(payload.len()));
    }

    let mut bytes = Value::Object(header).to_string().into_bytes();
    bytes.push(b'\n');
    bytes.extend_from_slice(payload);
    bytes
}

/// Read one event. Returns `None` on a clean end of stream.
pub async fn read_event<R>(reader: &mut R) -> anyhow::Result<Option<WyomingEvent>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }

    let header: Value = serde_json::from_str(line.trim())?;
    let event_type = header
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("event without type: {}", line.trim()))?
        .to_string();

    let mut data = header.get("data").cloned().unwrap_or(Value::Null);
    if let Some(len) = header.get("data_length").and_then(Value::as_u64) {
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).await?;
        let extra: Value = serde_json::from_slice(&buf)?;
        data = merge(data, extra);
    }

    let mut payload = Vec::new();
    if let Some(len) = header.get("payload_length").and_then(Value::as_u64) {
        payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload).await?;
    }

    Ok(Some(WyomingEvent {
        event_type,
        data,
        payload,
    }))
}

fn merge(base: Value, extra: Value) -> Value {
    match (base, extra) {
        (Value::Object(mut a), Value::Object(b)) => {
            a.extend(b);
            Value::Object(a)
        }
        (Value::Null, extra) => extra,
        (base, _) => base,
    }
}

async fn write_event<W>(writer: &mut W, event_type: &str, data: Value, payload: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_event(event_type, data, payload)).await
}

/// Wyoming client for ASR services
#[derive(Debug, Clone)]
pub struct WyomingClient {
    host: String,
    port: u16,
    sample_rate: u32,
}

impl WyomingClient {
    /// Create a new Wyoming client
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            sample_rate: SAMPLE_RATE,
        }
    }

    /// Check if the server is reachable
    pub async fn health_check(&self) -> bool {
        match TcpStream::connect((&*self.host, self.port)).await {
            Ok(_) => {
                debug!("Wyoming server available at {}:{}", self.host, self.port);
                true
            }
            Err(e) => {
                warn!("Wyoming server not available: {}", e);
                false
            }
        }
    }

    /// Transcribe 16-bit mono PCM
    pub async fn transcribe(&self, pcm: &[u8], language: &str) -> Result<String, CaptureError> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((&*self.host, self.port)))
            .await
            .map_err(|_| CaptureError::Service("timed out connecting to Wyoming server".into()))?
            .map_err(|e| CaptureError::Service(format!("failed to connect to Wyoming server: {}", e)))?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        self.send_audio(&mut writer, pcm, language)
            .await
            .map_err(|e| CaptureError::Service(format!("failed to send audio: {}", e)))?;

        debug!("Sent audio ({} bytes), waiting for transcript...", pcm.len());

        let transcript = tokio::time::timeout(TRANSCRIPT_TIMEOUT, async {
            while let Some(event) = read_event(&mut reader).await? {
                if event.event_type == "transcript" {
                    let text = event
                        .data
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    return Ok::<_, anyhow::Error>(Some(text));
                }
                debug!("Ignoring Wyoming event '{}'", event.event_type);
            }
            Ok(None)
        })
        .await
        .map_err(|_| CaptureError::Service("timeout waiting for transcript".into()))?
        .map_err(|e| CaptureError::Service(e.to_string()))?
        .ok_or_else(|| CaptureError::Service("connection closed before transcript".into()))?;

        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(CaptureError::Unintelligible);
        }

        info!("📝 Wyoming transcript: '{}'", transcript);
        Ok(transcript)
    }

    async fn send_audio<W>(&self, writer: &mut W, pcm: &[u8], language: &str) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let format = json!({
            "rate": self.sample_rate,
            "width": 2,
            "channels": 1,
        });

        write_event(writer, "transcribe", json!({ "language": wyoming_language(language) }), &[]).await?;
        write_event(writer, "audio-start", format.clone(), &[]).await?;
        for chunk in pcm.chunks(CHUNK_BYTES) {
            write_event(writer, "audio-chunk", format.clone(), chunk).await?;
        }
        write_event(writer, "audio-stop", Value::Null, &[]).await?;
        writer.flush().await
    }
}

/// Wyoming servers take bare language codes ("en"), not locales ("en-US")
pub fn wyoming_language(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}
