use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;
use url::Url;

/// Stream name for the diff depth feed of `symbol`
pub fn depth_stream_name(symbol: &str) -> String {
    format!("{}@depth@100ms", symbol.to_lowercase())
}

pub struct BinanceClient {
    pub socket: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    url: String,
}

impl BinanceClient {
    pub fn new(url: &str) -> Self {
        BinanceClient {
            socket: None,
            url: url.to_string(),
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        let url = Url::parse(&self.url)?;
        let (socket, _) = connect_async(url).await?;
        info!("Connected to {}", self.url);
        self.socket = Some(socket);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut socket) = self.socket.take() {
            socket.close(None).await?;
            Ok(())
        } else {
            Err(anyhow!("WebSocket not connected"))
        }
    }

    pub fn connected(&self) -> bool {
        self.socket.is_some()
    }

    async fn send(&mut self, method: &str, params: serde_json::Value, id: u64) -> Result<()> {
        let request = json!({
            "method": method,
            "params": params,
            "id": id,
        });

        let request_text = serde_json::to_string(&request)?;
        debug!("Sending request: {}", request_text);

        if let Some(socket) = &mut self.socket {
            socket.send(Message::Text(request_text)).await?;
            Ok(())
        } else {
            Err(anyhow!("WebSocket not connected"))
        }
    }

    /// Receive a text frame; `Ok(None)` for control frames and after close.
    ///
    /// A closed or failed socket is dropped, so `connected()` tells the two
    /// `Ok(None)` cases apart.
    pub async fn receive(&mut self) -> Result<Option<String>> {
        let Some(socket) = &mut self.socket else {
            error!("Not connected to WebSocket server");
            return Err(anyhow!("Not connected to WebSocket server"));
        };

        match socket.next().await {
            Some(Ok(Message::Text(text))) => {
                debug!("Received text: {}", text);
                Ok(Some(text))
            }
            Some(Ok(Message::Close(frame))) => {
                info!("Received close frame: {:?}", frame);
                self.socket = None;
                Ok(None)
            }
            Some(Ok(_)) => Ok(None),
            Some(Err(e)) => {
                error!("Error receiving message: {}", e);
                self.socket = None;
                Err(anyhow!("WebSocket error: {}", e))
            }
            None => {
                debug!("WebSocket stream ended");
                self.socket = None;
                Ok(None)
            }
        }
    }

    pub async fn subscribe(&mut self, streams: Vec<String>, id: u64) -> Result<()> {
        self.send("SUBSCRIBE", json!(streams), id).await
    }

    pub async fn unsubscribe(&mut self, streams: Vec<String>, id: u64) -> Result<()> {
        self.send("UNSUBSCRIBE", json!(streams), id).await
    }
}
