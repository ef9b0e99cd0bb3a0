//! Replay transport: answers `GET:all` with a recorded snapshot instead of a
//! live websocket, and logs every other command the bridge sends.

use std::sync::Arc;

use homee_bridge_adapter_homee::command::GET_ALL;
use homee_bridge_adapter_homee::{HomeeConnection, Outbound};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Drive `connection` until the bridge asks to close it.
pub async fn run(
    connection: Arc<HomeeConnection>,
    mut outbound: mpsc::Receiver<Outbound>,
    snapshot: String,
) {
    let (frames, rx) = mpsc::channel::<String>(16);

    let pump = async move {
        while let Some(frame) = outbound.recv().await {
            match frame {
                Outbound::Command(command) if command == GET_ALL => {
                    if frames.send(snapshot.clone()).await.is_err() {
                        break;
                    }
                }
                Outbound::Command(command) => tracing::info!(%command, "hub command"),
                Outbound::Close => break,
            }
        }
        // Dropping the sender ends the frame stream and closes the connection.
    };

    tokio::join!(connection.run(ReceiverStream::new(rx)), pump);
}
