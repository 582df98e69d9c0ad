use std::{fs, io::ErrorKind, os::unix::fs::FileTypeExt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};

use crate::{
    config::Config,
    gateway::ChatCompletionsClient,
    pipeline::RoutingPipeline,
    protocol::{ClientMessage, ServerMessage, encode_server_message, parse_client_message},
};

enum ExitReason {
    SocketMessage,
    Signal(&'static str),
}

/// Unix-socket NDJSON ingress: each line is one client message, each route
/// request runs its own pipeline instance. Connections are independent
/// tasks, so requests across connections execute concurrently; nothing but
/// the read-only config crosses request boundaries.
pub async fn run(config: Config) -> Result<()> {
    prepare_socket_path(&config.server.socket_path)?;
    let listener = UnixListener::bind(&config.server.socket_path).with_context(|| {
        format!("unable to bind socket {}", config.server.socket_path.display())
    })?;

    let generator = Arc::new(ChatCompletionsClient::new(
        config.gateway.endpoint.clone(),
        config.gateway.request_timeout_ms,
    ));
    let pipeline = RoutingPipeline::new(
        generator,
        config.pipeline.routes.clone(),
        config.pipeline.limits.clone(),
        None,
    );

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let (exit_tx, mut exit_rx) = mpsc::channel::<()>(1);

    eprintln!(
        "Albert listening on unix socket (NDJSON): {}",
        config.server.socket_path.display()
    );

    let exit_reason = loop {
        tokio::select! {
            _ = sigint.recv() => break ExitReason::Signal("SIGINT"),
            _ = sigterm.recv() => break ExitReason::Signal("SIGTERM"),
            _ = exit_rx.recv() => break ExitReason::SocketMessage,
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let pipeline = pipeline.clone();
                        let exit_tx = exit_tx.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_client(stream, pipeline, exit_tx).await {
                                tracing::warn!(
                                    target: "server",
                                    error = %err,
                                    "client_handling_failed"
                                );
                            }
                        });
                    }
                    Err(err) => {
                        tracing::warn!(target: "server", error = %err, "accept_failed");
                    }
                }
            }
        }
    };

    cleanup_socket_path(&config.server.socket_path)?;
    match exit_reason {
        ExitReason::SocketMessage => eprintln!("Albert stopped: received exit message"),
        ExitReason::Signal(signal_name) => eprintln!("Albert stopped: received {signal_name}"),
    }

    Ok(())
}

async fn handle_client(
    stream: UnixStream,
    pipeline: RoutingPipeline,
    exit_tx: mpsc::Sender<()>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match parse_client_message(line) {
            Ok(ClientMessage::Exit) => {
                let _ = exit_tx.send(()).await;
                break;
            }
            Ok(ClientMessage::Route(event)) => match pipeline.route(&event).await {
                Ok(verdict) => ServerMessage::Verdict { verdict },
                Err(err) => ServerMessage::Error {
                    message: err.to_string(),
                },
            },
            Err(err) => ServerMessage::Error {
                message: format!("invalid protocol message: {}", err),
            },
        };

        let mut encoded = encode_server_message(&response);
        encoded.push('\n');
        write_half.write_all(encoded.as_bytes()).await?;
    }

    Ok(())
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() || metadata.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale socket {}", path.display()))?;
            } else {
                bail!(
                    "socket path exists but is not removable as file/socket: {}",
                    path.display()
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("unable to inspect {}", path.display()));
        }
    }

    Ok(())
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
    }
}
