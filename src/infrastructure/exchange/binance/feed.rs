use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use log::{debug, info, warn};

use crate::config_loader::FeedConfig;
use crate::domain::constants::{CALL_ID_SUBSCRIBE, CALL_ID_UNSUBSCRIBE};
use crate::domain::errors::FeedError;
use crate::domain::model::depth::{DiffRecord, SnapshotRecord};
use crate::domain::traits::{DiffStream, MarketFeed};

use super::client::{depth_stream_name, BinanceClient};
use super::parsers::{BinanceMessage, BinanceParser};
use super::rest::BinanceRestClient;

/// Binance spot depth: REST snapshots plus the diff depth stream
pub struct BinanceFeed {
    rest: BinanceRestClient,
    ws_url: String,
}

impl BinanceFeed {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            rest: BinanceRestClient::new(&config.rest_base_url, config.snapshot_timeout())?,
            ws_url: config.ws_base_url.clone(),
        })
    }
}

#[async_trait]
impl MarketFeed for BinanceFeed {
    async fn fetch_snapshot(&self, symbol: &str, depth: usize) -> Result<SnapshotRecord, FeedError> {
        self.rest.fetch_depth(symbol, depth).await
    }

    async fn subscribe(&self, symbol: &str) -> Result<DiffStream, FeedError> {
        let mut client = BinanceClient::new(&self.ws_url);
        client
            .connect()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let stream_name = depth_stream_name(symbol);
        client
            .subscribe(vec![stream_name.clone()], CALL_ID_SUBSCRIBE)
            .await
            .map_err(|e| FeedError::Subscription(e.to_string()))?;
        info!("Subscribed to {}", stream_name);

        let subscription = DepthSubscription {
            client: Some(client),
            streams: vec![stream_name],
        };
        Ok(stream::unfold(Some(subscription), next_diff).boxed())
    }

    fn name(&self) -> &str {
        "binance"
    }
}

/// Open socket plus the streams it is subscribed to.
///
/// Dropping it (stream dropped or its task aborted) sends UNSUBSCRIBE and
/// closes the socket on a spawned task.
struct DepthSubscription {
    client: Option<BinanceClient>,
    streams: Vec<String>,
}

impl DepthSubscription {
    fn client(&mut self) -> Option<&mut BinanceClient> {
        self.client.as_mut()
    }
}

impl Drop for DepthSubscription {
    fn drop(&mut self) {
        let Some(mut client) = self.client.take() else {
            return;
        };
        if !client.connected() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to close subscription to {:?}", self.streams);
            return;
        };
        let streams = std::mem::take(&mut self.streams);
        handle.spawn(async move {
            if let Err(e) = client.unsubscribe(streams.clone(), CALL_ID_UNSUBSCRIBE).await {
                warn!("Failed to unsubscribe from {:?}: {}", streams, e);
            }
            match client.disconnect().await {
                Ok(()) => info!("Unsubscribed from {:?} and closed socket", streams),
                Err(e) => debug!("Socket close for {:?} failed: {}", streams, e),
            }
        });
    }
}

// One step of the diff stream; `None` state ends it after a terminal error
async fn next_diff(
    state: Option<DepthSubscription>,
) -> Option<(Result<DiffRecord, FeedError>, Option<DepthSubscription>)> {
    let mut subscription = state?;
    loop {
        let Some(client) = subscription.client() else {
            return Some((Err(FeedError::StreamClosed), None));
        };
        let text = match client.receive().await {
            Ok(Some(text)) => text,
            Ok(None) if client.connected() => continue,
            Ok(None) => return Some((Err(FeedError::StreamClosed), None)),
            Err(e) => return Some((Err(FeedError::Transport(e.to_string())), None)),
        };

        match BinanceParser::parse_message(&text) {
            Ok(BinanceMessage::DepthUpdate(diff)) => return Some((Ok(diff), Some(subscription))),
            Ok(BinanceMessage::SubscriptionResult { id }) => {
                debug!("Subscription acknowledged (id={})", id);
            }
            Ok(BinanceMessage::Error { code, message }) => {
                warn!("Stream error {}: {}", code, message);
                return Some((Err(FeedError::Subscription(format!("{} ({})", message, code))), None));
            }
            Ok(BinanceMessage::Unknown(_)) => {}
            // undecodable payloads are reported but the socket stays open
            Err(e) => return Some((Err(e), Some(subscription))),
        }
    }
}
