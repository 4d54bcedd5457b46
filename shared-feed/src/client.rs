use std::{io, net::SocketAddr};

use thiserror::Error;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};
use tracing::{debug, warn};

use crate::{
    error::FeedError,
    message::{ClientToServer, ErrorKind, ServerToClient, read_message, write_message},
};

/// Errors observed by a remote caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server reported a feed error for this request.
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The server answered with something this request did not expect.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Connection to a [`crate::server::FeedServer`].
///
/// Requests on one connection are answered in order, so a client issues one
/// request at a time and waits for its response.
pub struct FeedClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FeedClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        debug!(%addr, "connected to feed server");
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    pub async fn post(&mut self, message: impl Into<String>) -> Result<(), ClientError> {
        let request = ClientToServer::Post {
            message: message.into(),
        };
        match self.call(&request).await? {
            ServerToClient::Posted => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get(&mut self, count: i64) -> Result<Vec<String>, ClientError> {
        match self.call(&ClientToServer::Get { count }).await? {
            ServerToClient::Messages { messages } => Ok(messages),
            other => Err(unexpected(other)),
        }
    }

    pub async fn close(mut self) {
        if let Err(error) = self.writer.shutdown().await {
            warn!(?error, "failed to shutdown client writer cleanly");
        }
    }

    async fn call(&mut self, request: &ClientToServer) -> Result<ServerToClient, ClientError> {
        write_message(&mut self.writer, request).await?;
        let response = read_message::<_, ServerToClient>(&mut self.reader)
            .await?
            .ok_or_else(|| ClientError::Protocol("server closed the connection".into()))?;

        match response {
            ServerToClient::Error {
                kind,
                message,
                count,
            } => Err(remote_error(kind, message, count)),
            response => Ok(response),
        }
    }
}

fn remote_error(kind: ErrorKind, message: String, count: Option<i64>) -> ClientError {
    match (kind, count) {
        (ErrorKind::Closed, _) => ClientError::Feed(FeedError::Closed),
        (ErrorKind::InvalidArgument, Some(count)) => {
            ClientError::Feed(FeedError::InvalidArgument { count })
        }
        (ErrorKind::InvalidArgument, None) | (ErrorKind::Malformed, _) => {
            ClientError::Protocol(message)
        }
    }
}

fn unexpected(response: ServerToClient) -> ClientError {
    ClientError::Protocol(format!("unexpected response: {response:?}"))
}
