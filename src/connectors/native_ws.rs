//! Native WebSocket connector for a venue with its own bespoke streaming
//! protocol (subscribe-message-then-push-frames), as opposed to the
//! generic REST shape in [`super::generic_rest`]. One connector per venue;
//! each venue's framing differs enough that sharing code beyond the
//! transport plumbing isn't worth it.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::connector::{Connector, ConnectorError};
use crate::model::{Fees, OrderBook, Symbol};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct NativeWsConnector {
    venue: String,
    ws_url: String,
    stream: Mutex<Option<WsStream>>,
    connected: AtomicBool,
}

impl NativeWsConnector {
    pub fn new(venue: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            ws_url: ws_url.into(),
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    fn subscribe_message(symbol: &Symbol) -> String {
        serde_json::json!({
            "op": "subscribe",
            "args": [{
                "channel": "books",
                "instId": format!("{}{}", symbol.base, symbol.quote),
            }]
        })
        .to_string()
    }

    fn parse_frame(&self, symbol: &Symbol, text: &str) -> Option<OrderBook> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        let book = value.get("data")?.get(0)?;

        let levels = |side: &str| -> Vec<(f64, f64)> {
            book.get(side)
                .and_then(|v| v.as_array())
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|e| {
                            let pair = e.as_array()?;
                            let price = pair.first()?.as_str()?.parse().ok()?;
                            let amount = pair.get(1)?.as_str()?.parse().ok()?;
                            Some((price, amount))
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        OrderBook::from_raw_levels(
            self.venue.clone(),
            symbol.clone(),
            &levels("bids"),
            &levels("asks"),
            Utc::now(),
            None,
        )
        .ok()
    }
}

#[async_trait]
impl Connector for NativeWsConnector {
    fn venue(&self) -> &str {
        &self.venue
    }

    async fn connect(&self) -> Result<(), ConnectorError> {
        let (ws, _response) = connect_async(&self.ws_url)
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;
        *self.stream.lock().await = Some(ws);
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(mut ws) = self.stream.lock().await.take() {
            let _ = ws.close(None).await;
        }
        self.connected.store(false, Ordering::Relaxed);
    }

    /// Reads frames until one parses into a book for `symbol`, subscribing
    /// first if this is the first call for that symbol on this connection.
    async fn poll_book(&self, symbol: &Symbol, _depth: usize) -> Result<OrderBook, ConnectorError> {
        let mut guard = self.stream.lock().await;
        let ws = guard
            .as_mut()
            .ok_or_else(|| ConnectorError::Transport("not connected".into()))?;

        ws.send(Message::Text(Self::subscribe_message(symbol)))
            .await
            .map_err(|e| ConnectorError::Transport(e.to_string()))?;

        loop {
            let msg = ws
                .next()
                .await
                .ok_or_else(|| ConnectorError::Timeout(symbol.to_string()))?
                .map_err(|e| ConnectorError::Transport(e.to_string()))?;

            let Message::Text(text) = msg else { continue };
            if let Some(book) = self.parse_frame(symbol, &text) {
                return Ok(book);
            }
        }
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn public_fees(&self) -> Option<Fees> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_message_carries_concatenated_symbol() {
        let symbol = Symbol::new("BTC", "USDT").unwrap();
        let msg = NativeWsConnector::subscribe_message(&symbol);
        assert!(msg.contains("BTCUSDT"));
        assert!(msg.contains("\"op\":\"subscribe\""));
    }

    #[test]
    fn parse_frame_extracts_levels_from_nested_data_array() {
        let connector = NativeWsConnector::new("cointr", "wss://example.invalid/ws");
        let symbol = Symbol::new("BTC", "USDT").unwrap();
        let frame = r#"{"data":[{"bids":[["50000.0","1.0"]],"asks":[["50010.0","1.0"]]}]}"#;
        let book = connector.parse_frame(&symbol, frame).unwrap();
        assert_eq!(book.bids[0].price, 50000.0);
        assert_eq!(book.asks[0].price, 50010.0);
    }
}
