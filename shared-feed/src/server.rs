use std::{future::Future, net::SocketAddr};

use anyhow::Result;
use tokio::{
    io::{AsyncBufRead, AsyncWrite, BufReader},
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{debug, info, warn};

use crate::{
    access_point::AccessPoint,
    message::{ClientToServer, ServerToClient, read_frame, write_message},
};

/// TCP front end that turns line-delimited JSON requests into feed calls.
pub struct FeedServer {
    listener: TcpListener,
    feed: AccessPoint,
}

impl FeedServer {
    pub fn new(listener: TcpListener, feed: AccessPoint) -> Self {
        Self { listener, feed }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let FeedServer { listener, feed } = self;
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!("feed server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &feed);
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn handle_accept_result(result: std::io::Result<(TcpStream, SocketAddr)>, feed: &AccessPoint) {
    match result {
        Ok((stream, peer)) => spawn_connection_handler(stream, peer, feed),
        Err(err) => warn!(error = ?err, "failed to accept connection"),
    }
}

fn spawn_connection_handler(stream: TcpStream, peer: SocketAddr, feed: &AccessPoint) {
    let feed = feed.clone();
    tokio::spawn(async move {
        debug!(%peer, "connection opened");
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        match serve_connection(&mut reader, &mut writer, &feed).await {
            Ok(()) => debug!(%peer, "connection closed"),
            Err(err) => warn!(peer = %peer, error = ?err, "connection closed with error"),
        }
    });
}

/// Answers requests on one connection until the peer hangs up.
pub async fn serve_connection<R, W>(
    reader: &mut R,
    writer: &mut W,
    feed: &AccessPoint,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = read_frame(reader).await? {
        let response = match serde_json::from_slice::<ClientToServer>(&frame) {
            Ok(request) => dispatch(request, feed).await,
            Err(err) => {
                debug!(error = %err, "malformed request");
                ServerToClient::malformed(format!("malformed request: {err}"))
            }
        };
        write_message(writer, &response).await?;
    }
    Ok(())
}

async fn dispatch(request: ClientToServer, feed: &AccessPoint) -> ServerToClient {
    let result = match request {
        ClientToServer::Post { message } => {
            feed.post(message).await.map(|()| ServerToClient::Posted)
        }
        ClientToServer::Get { count } => feed
            .get(count)
            .await
            .map(|messages| ServerToClient::Messages { messages }),
    };
    result.unwrap_or_else(|err| ServerToClient::from_feed_error(&err))
}
