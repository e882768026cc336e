use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Serialize)]
struct StreamPayload<'a, T: Serialize> {
    seq: u64,
    end_flag: bool,
    state: Option<&'a T>,
}

/// Pushes the current value of `updates`, then every committed change,
/// until the publishing side goes away or the client disconnects.
pub async fn handle_ws_stream<T>(mut socket: WebSocket, mut updates: watch::Receiver<T>, label: String)
where
    T: Serialize + Send + Sync,
{
    info!("ws stream started: {}", label);

    let mut seq: u64 = 0;

    loop {
        let json = {
            let state = updates.borrow_and_update();
            let payload = StreamPayload {
                seq,
                end_flag: false,
                state: Some(&*state),
            };
            match serde_json::to_string(&payload) {
                Ok(j) => j,
                Err(e) => {
                    error!("json serialize error: {}", e);
                    return;
                }
            }
        };

        if let Err(e) = socket.send(Message::Text(json.into())).await {
            warn!("ws send failed: {}", e);
            return;
        }
        seq += 1;

        if updates.changed().await.is_err() {
            break;
        }
    }

    // publisher dropped: the view was unmounted
    let end_payload: StreamPayload<'_, T> = StreamPayload {
        seq,
        end_flag: true,
        state: None,
    };

    if let Ok(json) = serde_json::to_string(&end_payload) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    info!("ws stream finished: {}", label);
}
