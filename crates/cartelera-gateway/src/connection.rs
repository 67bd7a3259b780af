use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use cartelera_types::api::Claims;
use cartelera_types::events::{GatewayCommand, GatewayEvent};
use cartelera_types::feed::BannerGate;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Banner lifetime mirrored server-side: after this long without a
/// dismiss from the client, the gate re-arms on its own.
const BANNER_TTL: Duration = Duration::from_secs(6);

/// Handle a single WebSocket connection: Identify handshake with JWT,
/// Ready, then fan events to the client until either side drops.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, jwt_secret: String) {
    let (mut sender, mut receiver) = socket.split();

    let (user_id, full_name) = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(id) => id,
        None => {
            warn!("WebSocket client failed to identify, closing");
            return;
        }
    };

    info!("{} ({}) connected to gateway", full_name, user_id);

    let ready = GatewayEvent::Ready {
        user_id,
        full_name: full_name.clone(),
    };
    let Ok(ready_json) = serde_json::to_string(&ready) else {
        return;
    };
    if sender.send(Message::Text(ready_json.into())).await.is_err() {
        return;
    }

    // Register per-user channel for targeted notification delivery
    let (conn_id, mut user_rx) = dispatcher.register_user_channel(user_id).await;
    let mut broadcast_rx = dispatcher.subscribe();

    // Unread-diff gate for this connection's notification banner
    let banner = Arc::new(Mutex::new(BannerGate::new()));
    let banner_recv = banner.clone();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward broadcasts + targeted events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;
        let mut banner_fired_at: Option<tokio::time::Instant> = None;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Broadcast receiver lagged by {} events", n);
                            continue;
                        }
                        Err(_) => break,
                    };
                    if forward(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                result = user_rx.recv() => {
                    let mut event = match result {
                        Some(event) => event,
                        None => break,
                    };

                    if let GatewayEvent::NotificationCreate { unread_count, alert, .. } = &mut event {
                        let mut gate = banner.lock().await;
                        // Re-arm if the client never told us it dismissed
                        if let Some(fired) = banner_fired_at {
                            if fired.elapsed() >= BANNER_TTL {
                                gate.dismiss();
                                banner_fired_at = None;
                            }
                        }
                        *alert = gate.observe(*unread_count);
                        if *alert {
                            banner_fired_at = Some(tokio::time::Instant::now());
                        }
                    }

                    if forward(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read client frames: only Identify (already handled) and Pong matter
    let full_name_recv = full_name.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(GatewayCommand::Identify { .. }) => {}
                    Ok(GatewayCommand::BannerDismissed) => {
                        banner_recv.lock().await.dismiss();
                    }
                    Err(e) => {
                        warn!(
                            "{} ({}) bad command: {} -- raw: {}",
                            full_name_recv,
                            user_id,
                            e,
                            truncate_for_log(&text, 200)
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.unregister_user_channel(user_id, conn_id).await;
    info!("{} ({}) disconnected from gateway", full_name, user_id);
}

/// Truncate client-supplied text to at most `max` bytes for logging,
/// backing off to the previous char boundary so the slice never splits a
/// multi-byte character.
fn truncate_for_log(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

async fn forward(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).map_err(axum::Error::new)?;
    sender.send(Message::Text(text.into())).await
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<(Uuid, String)> {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    let timeout = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { token }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    let token_data = decode::<Claims>(
                        &token,
                        &DecodingKey::from_secret(jwt_secret.as_bytes()),
                        &Validation::default(),
                    )
                    .ok()?;

                    return Some((token_data.claims.sub, token_data.claims.full_name));
                }
            }
        }
        None
    });

    timeout.await.ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::truncate_for_log;

    #[test]
    fn log_truncation_never_splits_a_character() {
        // 199 ASCII bytes, then a 2-byte character straddling the cut
        let mut text = "a".repeat(199);
        text.push('é');
        let logged = truncate_for_log(&text, 200);
        assert_eq!(logged.len(), 199);
        assert!(logged.chars().all(|c| c == 'a'));
    }

    #[test]
    fn short_text_passes_through_untouched() {
        assert_eq!(truncate_for_log("zamba", 200), "zamba");
        assert_eq!(truncate_for_log("", 200), "");
    }

    #[test]
    fn truncation_on_a_boundary_keeps_the_full_prefix() {
        let text = "ñ".repeat(150); // 300 bytes, boundary at 200
        let logged = truncate_for_log(&text, 200);
        assert_eq!(logged.len(), 200);
        assert_eq!(logged.chars().count(), 100);
    }
}
