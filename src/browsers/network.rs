use crate::http::ObservedResponse;
use crate::CaptureResult;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::{debug, error, trace, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::sleep;
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct ActivityState {
    in_flight: HashSet<String>,
    last_change: Instant,
}

/// Tracks in-flight requests of a page to detect network idle.
#[derive(Debug)]
pub struct NetworkActivity {
    state: Mutex<ActivityState>,
}

impl NetworkActivity {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ActivityState {
                in_flight: HashSet::new(),
                last_change: Instant::now(),
            }),
        }
    }

    pub fn request_started(&self, request_id: &str) {
        let mut state = self.state.lock();
        state.in_flight.insert(request_id.to_string());
        state.last_change = Instant::now();
    }

    /// Also used for failed and cancelled requests.
    pub fn request_finished(&self, request_id: &str) {
        let mut state = self.state.lock();
        if state.in_flight.remove(request_id) {
            state.last_change = Instant::now();
        }
    }

    /// Restarts the quiet period, so an idle page is not reported idle before
    /// a navigation had a chance to issue its requests.
    pub fn mark_navigation(&self) {
        self.state.lock().last_change = Instant::now();
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    pub fn is_idle(&self, window: Duration) -> bool {
        let state = self.state.lock();
        state.in_flight.is_empty() && state.last_change.elapsed() >= window
    }

    pub async fn wait_for_idle(&self, window: Duration) {
        while !self.is_idle(window) {
            sleep(POLL_INTERVAL.min(window.max(Duration::from_millis(1)))).await;
        }
    }
}

impl Default for NetworkActivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Network events of one page, keyed by the browser's request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Started(String),
    Received {
        request_id: String,
        url: String,
        status: u16,
    },
    Finished(String),
    Failed(String),
}

/// Reads the body of a response whose loading has finished.
#[async_trait]
pub trait BodySource: Send + Sync {
    async fn body(&self, request_id: &str) -> CaptureResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ended {
    Finished,
    Failed,
}

/// Feeds `activity` and forwards watched responses once their body is
/// complete.
///
/// Events of one request may arrive in any order. A request that already
/// ended is never counted as in flight again, and a watched response whose
/// loading already finished is read as soon as its headers arrive.
pub async fn pump_network_events<S, B>(
    mut events: S,
    bodies: B,
    watch: Vec<String>,
    activity: Arc<NetworkActivity>,
    sender: mpsc::UnboundedSender<ObservedResponse>,
) where
    S: Stream<Item = NetworkEvent> + Unpin,
    B: BodySource,
{
    let mut pending: HashMap<String, (String, u16)> = HashMap::new();
    let mut ended: HashMap<String, Ended> = HashMap::new();

    while let Some(event) = events.next().await {
        let ready = match event {
            NetworkEvent::Started(id) => {
                if !ended.contains_key(&id) {
                    activity.request_started(&id);
                }
                None
            }
            NetworkEvent::Received {
                request_id,
                url,
                status,
            } => {
                trace!("Response {} from {}", status, url);
                if !watch.iter().any(|fragment| url.contains(fragment.as_str())) {
                    continue;
                }
                match ended.get(&request_id) {
                    Some(Ended::Finished) => Some((request_id, url, status)),
                    Some(Ended::Failed) => {
                        warn!("Request to {} failed before completing", url);
                        None
                    }
                    None => {
                        pending.insert(request_id, (url, status));
                        None
                    }
                }
            }
            NetworkEvent::Finished(id) => {
                activity.request_finished(&id);
                ended.insert(id.clone(), Ended::Finished);
                pending.remove(&id).map(|(url, status)| (id, url, status))
            }
            NetworkEvent::Failed(id) => {
                activity.request_finished(&id);
                if let Some((url, _)) = pending.remove(&id) {
                    warn!("Request to {} failed before completing", url);
                }
                ended.insert(id, Ended::Failed);
                None
            }
        };

        let Some((request_id, url, status)) = ready else {
            continue;
        };

        match read_response(&bodies, &request_id, &url, status).await {
            Ok(response) => {
                if sender.send(response).is_err() {
                    debug!("Response receiver dropped, stopping network pump");
                    break;
                }
            }
            Err(e) => error!("Error reading response from {}: {}", url, e),
        }
    }
}

async fn read_response<B: BodySource>(
    bodies: &B,
    request_id: &str,
    url: &str,
    status: u16,
) -> CaptureResult<ObservedResponse> {
    let body = bodies.body(request_id).await?;
    Ok(ObservedResponse::new(Url::parse(url)?, status, body))
}
