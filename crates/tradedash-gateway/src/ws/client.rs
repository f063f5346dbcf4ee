/*
[INPUT]:  Backend WebSocket base URL and stream parameters
[OUTPUT]: Ticker and kline events via channels
[POS]:    WebSocket layer - real-time market stream handling
[UPDATE]: When adding new streams or changing connection logic
*/

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use super::message::MarketEvent;
use crate::http::{GatewayError, Result};
use crate::types::TradingPair;

const CHANNEL_CAPACITY: usize = 100;
const RAW_LOG_MAX_BYTES: usize = 1024;

/// Lets the first `limit` occurrences of a log line through, process-wide
struct LogSampler {
    seen: AtomicUsize,
    limit: usize,
}

impl LogSampler {
    const fn new(limit: usize) -> Self {
        Self {
            seen: AtomicUsize::new(0),
            limit,
        }
    }

    /// 1-based index of this occurrence while under the limit
    fn next(&self) -> Option<usize> {
        let index = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        (index <= self.limit).then_some(index)
    }
}

static EVENT_SAMPLES: LogSampler = LogSampler::new(3);
static UNRECOGNIZED_SAMPLES: LogSampler = LogSampler::new(3);
static PARSE_FAILURE_SAMPLES: LogSampler = LogSampler::new(3);

/// Market data stream relayed by the backend (`/ws/ticker`, `/ws/kline`)
#[derive(Debug)]
pub struct MarketStream {
    ws_url: String,
    message_tx: mpsc::Sender<MarketEvent>,
    message_rx: Option<mpsc::Receiver<MarketEvent>>,
    outbound_tx: Arc<Mutex<Option<mpsc::Sender<WsMessage>>>>,
}

impl MarketStream {
    pub fn new(ws_url: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            ws_url: ws_url.into(),
            message_tx: tx,
            message_rx: Some(rx),
            outbound_tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the event receiver; only the first caller gets it
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<MarketEvent>> {
        self.message_rx.take()
    }

    /// Connect to `/ws/ticker?symbols=A,B`
    pub async fn connect_ticker(&self, symbols: &[TradingPair]) -> Result<()> {
        let url = ticker_url(&self.ws_url, symbols)?;
        self.connect_stream(url).await
    }

    /// Connect to `/ws/kline?symbol=S&interval=I`
    pub async fn connect_kline(&self, symbol: TradingPair, interval: &str) -> Result<()> {
        let url = kline_url(&self.ws_url, symbol, interval)?;
        self.connect_stream(url).await
    }

    pub async fn is_connected(&self) -> bool {
        self.outbound_tx.lock().await.is_some()
    }

    /// Close the connection; the reader task sends a Close frame and exits
    pub async fn close(&self) {
        let mut guard = self.outbound_tx.lock().await;
        guard.take();
    }

    async fn connect_stream(&self, url: Url) -> Result<()> {
        {
            let guard = self.outbound_tx.lock().await;
            if guard.is_some() {
                return Err(GatewayError::WebSocket("stream already connected".to_string()));
            }
        }

        let (ws_stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|err| GatewayError::WebSocket(err.to_string()))?;
        info!(url = %url, "ws connected");

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<WsMessage>(CHANNEL_CAPACITY);
        let own_tx = outbound_tx.downgrade();
        let outbound_state = self.outbound_tx.clone();
        {
            let mut guard = outbound_state.lock().await;
            *guard = Some(outbound_tx);
        }

        let message_tx = self.message_tx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if write.send(message).await.is_err() {
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                            Some(Ok(message)) => {
                                if let Some(parsed) = parse_message(message)
                                    && message_tx.send(parsed).await.is_err()
                                {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                warn!(error = %err, "ws read failed");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            let mut guard = outbound_state.lock().await;
            if !release_slot(&mut guard, &own_tx) {
                debug!("ws slot already released or reused");
            }
            info!("ws stream closed");
        });

        Ok(())
    }
}

impl Default for MarketStream {
    fn default() -> Self {
        Self::new(crate::http::DEFAULT_WS_URL)
    }
}

/// Empty the shared sender slot only while it still holds this connection's channel
fn release_slot(
    slot: &mut Option<mpsc::Sender<WsMessage>>,
    own: &mpsc::WeakSender<WsMessage>,
) -> bool {
    let owned = match (slot.as_ref(), own.upgrade()) {
        (Some(current), Some(own)) => current.same_channel(&own),
        _ => false,
    };
    if owned {
        *slot = None;
    }
    owned
}

fn ticker_url(base: &str, symbols: &[TradingPair]) -> Result<Url> {
    let mut url = stream_url(base, "ws/ticker")?;
    let joined = symbols
        .iter()
        .map(TradingPair::as_str)
        .collect::<Vec<_>>()
        .join(",");
    url.query_pairs_mut().append_pair("symbols", &joined);
    Ok(url)
}

fn kline_url(base: &str, symbol: TradingPair, interval: &str) -> Result<Url> {
    let mut url = stream_url(base, "ws/kline")?;
    url.query_pairs_mut()
        .append_pair("symbol", symbol.as_str())
        .append_pair("interval", interval);
    Ok(url)
}

fn stream_url(base: &str, path: &str) -> Result<Url> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?.join(path)?)
}

fn parse_message(message: WsMessage) -> Option<MarketEvent> {
    let text: String = match message {
        WsMessage::Text(text) => text.to_string(),
        WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec()).ok()?,
        _ => return None,
    };

    match MarketEvent::parse(&text) {
        Ok(MarketEvent::Other(value)) => {
            if let Some(index) = UNRECOGNIZED_SAMPLES.next() {
                debug!(
                    sample_index = index,
                    bytes = text.len(),
                    message = %crate::truncate_for_log(&text, RAW_LOG_MAX_BYTES),
                    "ws message type unrecognized"
                );
            }
            Some(MarketEvent::Other(value))
        }
        Ok(event) => {
            if let Some(index) = EVENT_SAMPLES.next() {
                info!(
                    sample_index = index,
                    channel = event.channel(),
                    symbol = event.symbol().unwrap_or("-"),
                    "ws event sample"
                );
            }
            Some(event)
        }
        Err(err) => {
            if let Some(index) = PARSE_FAILURE_SAMPLES.next() {
                warn!(
                    sample_index = index,
                    error = %err,
                    message = %crate::truncate_for_log(&text, RAW_LOG_MAX_BYTES),
                    "ws message parse failed"
                );
            }
            None
        }
    }
}
