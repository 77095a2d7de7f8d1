//! [`RosbridgeLink`] – outbound connection to a `rosbridge_server`.
//!
//! The link is a cheap, cloneable sender.  A background task owns the
//! WebSocket and writes every queued [`RosbridgeOp`] as a text frame.  The
//! queue is bounded: once `capacity` ops are waiting, [`RosbridgeLink::send`]
//! waits for the writer, so a stalled bridge slows publishers down instead of
//! buffering without limit.  When the writer stops (server closed the socket,
//! write error) every later send fails; the link never reconnects on its own.
//!
//! Frames coming back from the bridge are `status` reports.  Warnings and
//! errors (a rejected advertise, an unknown message type) are logged at the
//! matching level.

use futures_util::{SinkExt, StreamExt};
use lampo_types::BoardError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::rosbridge::{RosbridgeOp, RosbridgeStatus, StatusLevel};

/// Handle used by publishers to queue operations for the rosbridge writer.
#[derive(Clone, Debug)]
pub struct RosbridgeLink {
    tx: mpsc::Sender<RosbridgeOp>,
}

impl RosbridgeLink {
    /// Connect to `url` (e.g. `"ws://localhost:9090"`) and spawn the writer
    /// task.  At most `capacity` ops wait in the queue.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Connection`] if the WebSocket handshake fails.
    pub async fn connect(url: &str, capacity: usize) -> Result<Self, BoardError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| BoardError::Connection(format!("rosbridge handshake with {url}: {e}")))?;
        info!(url = %url, "connected to rosbridge");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<RosbridgeOp>(capacity.max(1));
        let url = url.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    op = rx.recv() => {
                        let Some(op) = op else { break };
                        let frame = match op.to_frame() {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(topic = %op.topic(), error = %e, "dropping unencodable rosbridge op");
                                continue;
                            }
                        };
                        if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                            error!(url = %url, error = %e, "rosbridge write failed");
                            break;
                        }
                    }
                    msg = ws_rx.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => log_incoming(&url, text.as_str()),
                            Some(Ok(Message::Close(_))) | None => {
                                warn!(url = %url, "rosbridge closed the connection");
                                break;
                            }
                            Some(Err(e)) => {
                                error!(url = %url, error = %e, "rosbridge read failed");
                                break;
                            }
                            _ => {}
                        }
                    }
                }
            }
            let _ = ws_tx.close().await;
        });

        Ok(Self { tx })
    }

    /// Create an in-process link whose operations arrive on the returned
    /// receiver instead of a socket.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RosbridgeOp>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue `op` for delivery, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Publish`] once the writer side has gone away.
    pub async fn send(&self, op: RosbridgeOp) -> Result<(), BoardError> {
        self.tx.send(op).await.map_err(|mpsc::error::SendError(op)| BoardError::Publish {
            topic: op.topic().to_string(),
            details: "rosbridge link closed".to_string(),
        })
    }
}

/// Log one frame received from the bridge.
fn log_incoming(url: &str, text: &str) {
    let Some(status) = RosbridgeStatus::parse(text) else {
        debug!(url = %url, frame = %text, "unhandled rosbridge frame");
        return;
    };
    let id = status.id.as_deref().unwrap_or("-");
    match status.level {
        StatusLevel::Error => error!(url = %url, id = %id, "rosbridge error: {}", status.msg),
        StatusLevel::Warning => warn!(url = %url, id = %id, "rosbridge warning: {}", status.msg),
        StatusLevel::Info | StatusLevel::None => debug!(url = %url, id = %id, "rosbridge status: {}", status.msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn publish(n: i64) -> RosbridgeOp {
        RosbridgeOp::Publish { topic: "a".into(), msg: json!(n) }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_logs(f: impl FnOnce()) -> String {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn channel_link_delivers_ops_in_order() {
        let (link, mut rx) = RosbridgeLink::channel(4);
        link.send(publish(1)).await.unwrap();
        link.send(publish(2)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), publish(1));
        assert_eq!(rx.recv().await.unwrap(), publish(2));
    }

    #[tokio::test]
    async fn full_queue_holds_sender_until_writer_drains() {
        let (link, mut rx) = RosbridgeLink::channel(2);
        link.send(publish(1)).await.unwrap();
        link.send(publish(2)).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), link.send(publish(3))).await;
        assert!(blocked.is_err(), "send must wait while the queue is full");

        assert_eq!(rx.recv().await.unwrap(), publish(1));
        tokio::time::timeout(Duration::from_secs(1), link.send(publish(3)))
            .await
            .expect("send resumes once a slot frees up")
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), publish(2));
        assert_eq!(rx.recv().await.unwrap(), publish(3));
    }

    #[tokio::test]
    async fn zero_capacity_is_raised_to_one() {
        let (link, mut rx) = RosbridgeLink::channel(0);
        link.send(publish(1)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), publish(1));
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_is_publish_error() {
        let (link, rx) = RosbridgeLink::channel(1);
        drop(rx);
        let err = link
            .send(RosbridgeOp::Publish { topic: "traf_lights".into(), msg: json!({}) })
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Publish { ref topic, .. } if topic == "traf_lights"));
    }

    #[tokio::test]
    async fn connect_to_unreachable_server_is_connection_error() {
        let err = RosbridgeLink::connect("ws://127.0.0.1:1", 10).await.unwrap_err();
        assert!(matches!(err, BoardError::Connection(_)));
    }

    #[test]
    fn error_status_is_logged_as_error() {
        let logs = captured_logs(|| {
            log_incoming(
                "ws://bridge:9090",
                r#"{"op":"status","level":"error","id":"advertise:traf_lights:1","msg":"Unable to import msg class TrafficLights"}"#,
            );
        });
        let line = logs.lines().find(|l| l.contains("rosbridge error")).expect("error line");
        assert!(line.contains("ERROR"));
        assert!(line.contains("advertise:traf_lights:1"));
        assert!(line.contains("Unable to import msg class TrafficLights"));
    }

    #[test]
    fn warning_status_is_logged_as_warning() {
        let logs = captured_logs(|| {
            log_incoming("ws://bridge:9090", r#"{"op":"status","level":"warning","msg":"topic not advertised"}"#);
        });
        let line = logs.lines().find(|l| l.contains("rosbridge warning")).expect("warning line");
        assert!(line.contains("WARN"));
        assert!(line.contains("topic not advertised"));
    }

    #[test]
    fn other_frames_stay_at_debug() {
        let logs = captured_logs(|| {
            log_incoming("ws://bridge:9090", r#"{"op":"publish","topic":"/x","msg":{}}"#);
        });
        assert!(logs.contains("DEBUG"));
        assert!(!logs.contains("ERROR"));
        assert!(!logs.contains("WARN"));
    }
}
