//! Per-turn sequencing: classify the query, pick the template or the full
//! persona path, stream the chosen response through the demultiplexer and
//! the typing pacer, and surface any transport failure as a single error
//! event. One turn runs at a time; the UI enforces that with its busy flag.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::api::ChatRequest;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::classifier::{classify, Category};
use crate::core::config::Config;
use crate::core::constants::{GENERIC_TURN_ERROR, PROCESSING_PLACEHOLDER};
use crate::core::message::Message;
use crate::core::pacer::{DisplayUpdate, TypingPacer, TypingSpeed};
use crate::core::{persona, templates};

/// Which response path a classified turn takes. Template responses are
/// never re-classified; the branch is taken exactly once per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRoute {
    Canned(Category),
    Generated,
}

pub fn route_for(category: Category) -> TurnRoute {
    if templates::guideline(category).is_some() {
        TurnRoute::Canned(category)
    } else {
        TurnRoute::Generated
    }
}

/// Events delivered to the UI while a turn runs, tagged with the turn they
/// belong to so updates from a cancelled turn can be discarded. `Display`
/// updates rewrite the trailing assistant message in place; `Failed` appends
/// a separate error message and ends the turn, leaving partial content
/// as-is.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    Display { turn: u64, update: DisplayUpdate },
    Failed { turn: u64, message: String },
}

pub struct TurnParams {
    pub client: reqwest::Client,
    pub config: Config,
    /// Transcript up to and including the latest user message. The trailing
    /// assistant placeholder is excluded; the pacer reseeds it.
    pub history: Vec<Message>,
    pub input: String,
    pub turn: u64,
    pub speed: watch::Receiver<TypingSpeed>,
    pub cancel_token: CancellationToken,
}

/// Run one conversation turn on a spawned task. All events, including the
/// terminal error, arrive on `tx`; unless the turn is cancelled, the last
/// event is always either a `done` display update or a `Failed`.
pub fn spawn_turn(params: TurnParams, tx: mpsc::UnboundedSender<TurnEvent>) {
    let turn = params.turn;
    tokio::spawn(async move {
        if let Err(e) = run_turn(params, &tx).await {
            let text = e.to_string();
            let text = if text.is_empty() {
                GENERIC_TURN_ERROR.to_string()
            } else {
                text
            };
            let _ = tx.send(TurnEvent::Failed {
                turn,
                message: format!("⚠️ Error: {text}"),
            });
        }
    });
}

async fn run_turn(
    params: TurnParams,
    tx: &mpsc::UnboundedSender<TurnEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let TurnParams {
        client,
        config,
        history,
        input,
        turn,
        speed,
        cancel_token,
    } = params;

    // Classification completes fully before any generation begins.
    let category = classify(&client, &config, &input).await?;
    let request = build_request(&config, category, &input, &history);

    let (service, mut stream_rx) = ChatStreamService::new();
    service.spawn_stream(StreamParams {
        client,
        config,
        request,
        cancel_token: cancel_token.clone(),
    });
    // The service's own sender must not keep the channel open once the
    // demux task finishes.
    drop(service);

    let update_tx = tx.clone();
    let pacer = TypingPacer::new(PROCESSING_PLACEHOLDER, speed, move |update| {
        let _ = update_tx.send(TurnEvent::Display { turn, update });
    });

    pace_updates(stream_rx, pacer, &cancel_token).await
}

/// Drive the pacer from the demux channel until the stream ends, errors, or
/// the turn is cancelled. Cancellation drops the queued backlog; whatever
/// was already revealed stays in place, minus the cursor.
async fn pace_updates<F: FnMut(DisplayUpdate)>(
    mut stream_rx: mpsc::UnboundedReceiver<StreamMessage>,
    mut pacer: TypingPacer<F>,
    cancel_token: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                pacer.finish();
                return Ok(());
            }
            message = stream_rx.recv() => match message {
                Some(StreamMessage::Chunk(delta)) => pacer.feed(&delta).await,
                Some(StreamMessage::Error(text)) => {
                    // Strip the cursor from whatever was already revealed;
                    // the partial content stays in place.
                    pacer.finish();
                    return Err(text.into());
                }
                Some(StreamMessage::End) | None => break,
            },
        }
    }

    pacer.finish();
    Ok(())
}

fn build_request(
    config: &Config,
    category: Category,
    input: &str,
    history: &[Message],
) -> ChatRequest {
    match route_for(category) {
        TurnRoute::Canned(category) => templates::build_template_request(config, category, input)
            .unwrap_or_else(|| persona::build_primary_request(config, history)),
        TurnRoute::Generated => persona::build_primary_request(config, history),
    }
}
