//! Wire-level stream demultiplexing. The remote service answers streamed
//! requests with newline-delimited records; `data:` records carry a JSON
//! payload whose generation delta sits at `choices[0].delta.content`, and a
//! literal `[DONE]` payload terminates the stream. Records are reassembled
//! across chunk boundaries so a delta split mid-line is never lost.

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;

use crate::api::{with_auth_headers, ChatRequest, ChatResponse};
use crate::core::config::Config;
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Handle one complete line. Returns true when the stream is finished.
///
/// A payload that fails to parse is skipped, not fatal: transient malformed
/// records must not kill an otherwise healthy stream.
fn process_stream_line(line: &str, tx: &mpsc::UnboundedSender<StreamMessage>) -> bool {
    let Some(payload) = extract_data_payload(line) else {
        return false;
    };

    if payload == "[DONE]" {
        let _ = tx.send(StreamMessage::End);
        return true;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            if let Some(choice) = response.choices.first() {
                if let Some(content) = &choice.delta.content {
                    if !content.is_empty() {
                        let _ = tx.send(StreamMessage::Chunk(content.clone()));
                    }
                }
            }
        }
        Err(_) => {
            tracing::debug!(payload, "skipping malformed stream record");
        }
    }
    false
}

/// Handle whatever is left in the reassembly buffer when the transport
/// closes without a trailing newline. Returns true when the residue was the
/// terminal sentinel.
fn flush_residual(buffer: &[u8], tx: &mpsc::UnboundedSender<StreamMessage>) -> bool {
    if buffer.is_empty() {
        return false;
    }
    match std::str::from_utf8(buffer) {
        Ok(line) => process_stream_line(line.trim(), tx),
        Err(e) => {
            tracing::debug!(error = %e, "invalid UTF-8 at end of stream");
            false
        }
    }
}

/// Pull a short human-readable summary out of an error response body.
fn summarize_api_error(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty response body>".to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let summary = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("message").and_then(|v| v.as_str()));
        if let Some(summary) = summary {
            let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                return collapsed;
            }
        }
    }

    trimmed.to_string()
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub config: Config,
    pub request: ChatRequest,
    pub cancel_token: tokio_util::sync::CancellationToken,
}

/// Spawns one streaming request per call and feeds the parsed fragments to a
/// channel. The receiver side sees an ordered, finite sequence: zero or more
/// `Chunk`s, at most one `Error`, then `End`.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<StreamMessage>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StreamMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                config,
                request,
                cancel_token,
            } = params;

            tokio::select! {
                _ = run_stream(client, config, request, tx) => {}
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    #[cfg(test)]
    fn sender(&self) -> &mpsc::UnboundedSender<StreamMessage> {
        &self.tx
    }
}

async fn run_stream(
    client: reqwest::Client,
    config: Config,
    request: ChatRequest,
    tx: mpsc::UnboundedSender<StreamMessage>,
) {
    let url = construct_api_url(&config.base_url, "chat/completions");
    let model = request.model.clone();

    let response = match with_auth_headers(client.post(url), &config, &model)
        .json(&request)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            let _ = tx.send(StreamMessage::Error(e.to_string()));
            let _ = tx.send(StreamMessage::End);
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let _ = tx.send(StreamMessage::Error(format!(
            "request failed with status {}: {}",
            status,
            summarize_api_error(&body)
        )));
        let _ = tx.send(StreamMessage::End);
        return;
    }

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let Ok(chunk_bytes) = chunk else {
            // Transport closed mid-record; end the sequence without error.
            break;
        };
        buffer.extend_from_slice(&chunk_bytes);

        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let line = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(s) => s.trim().to_string(),
                Err(e) => {
                    tracing::debug!(error = %e, "invalid UTF-8 in stream");
                    buffer.drain(..=newline_pos);
                    continue;
                }
            };
            buffer.drain(..=newline_pos);

            if process_stream_line(&line, &tx) {
                return;
            }
        }
    }

    // A final record may arrive without its newline.
    if flush_residual(&buffer, &tx) {
        return;
    }
    let _ = tx.send(StreamMessage::End);
}
