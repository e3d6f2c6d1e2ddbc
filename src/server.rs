//! JSON control server.
//!
//! Exposes the animation queue over HTTP so external tools can drive the
//! sculpture: list the queue, append/delete animations, or push a raw
//! positions frame. Commands are forwarded to the frame runtime over a
//! channel; the server never touches the bus itself.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::{
    animation::AnimationSpec,
    runtime::{ControlCommand, SharedStatus},
};

#[derive(Clone)]
struct ServerState {
    control_tx: flume::Sender<ControlCommand>,
    status: SharedStatus,
    total_balls: usize,
}

/// Commands accepted on the control endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommandRequest {
    ListAnimations,
    AppendAnimation { animation: AnimationSpec },
    DeleteAnimation,
    SendPositions { positions: Vec<f64> },
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animations: Option<Vec<String>>,
    pub timestamp: String,
}

impl CommandResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            animations: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

async fn handle_command(
    State(state): State<ServerState>,
    Json(request): Json<CommandRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), (StatusCode, String)> {
    log::debug!("Control server received {request:?}");

    let forward = |command: ControlCommand| async {
        state.control_tx.send_async(command).await.map_err(|err| {
            log::error!("Failed to forward command to runtime: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal Server Error: {err}"),
            )
        })
    };

    let response = match request {
        CommandRequest::ListAnimations => {
            let queue = state.status.lock().unwrap().queue.clone();
            let mut response = CommandResponse::success("Animation queue");
            response.animations = Some(queue);
            response
        }
        CommandRequest::AppendAnimation { animation } => {
            forward(ControlCommand::Append(animation)).await?;
            CommandResponse::success("Animation appended")
        }
        CommandRequest::DeleteAnimation => {
            forward(ControlCommand::DeleteHead).await?;
            CommandResponse::success("Animation deleted")
        }
        CommandRequest::SendPositions { positions } => {
            if positions.len() != state.total_balls {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!(
                        "Expected {} positions, got {}",
                        state.total_balls,
                        positions.len()
                    ),
                ));
            }
            forward(ControlCommand::PushPositions(positions)).await?;
            CommandResponse::success("Positions received")
        }
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Run the control server until a shutdown signal arrives.
pub async fn serve(
    port: u16,
    total_balls: usize,
    control_tx: flume::Sender<ControlCommand>,
    status: SharedStatus,
    shutdown_rx: flume::Receiver<()>,
) -> Result<()> {
    let addr = format!("127.0.0.1:{port}");
    log::info!("Starting control server on {addr}");

    let state = ServerState {
        control_tx,
        status,
        total_balls,
    };

    let app = Router::new()
        .route("/", post(handle_command))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| anyhow!("Failed to bind control server to {addr}: {err}"))?;

    let shutdown_signal = async move {
        match shutdown_rx.recv_async().await {
            Ok(()) => log::info!("Control server received shutdown signal, exiting"),
            Err(_) => log::info!("Control server shutdown channel closed, exiting"),
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|err| anyhow!("Control server error: {err}"))?;

    Ok(())
}
