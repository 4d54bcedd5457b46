use std::io;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FeedError;

const LINE_ENDINGS: &[u8] = b"\n\r";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientToServer {
    Post { message: String },
    Get { count: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerToClient {
    Posted,
    Messages { messages: Vec<String> },
    Error {
        kind: ErrorKind,
        message: String,
        /// The rejected count, for `invalid_argument` errors.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<i64>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Closed,
    Malformed,
}

impl ServerToClient {
    pub fn from_feed_error(err: &FeedError) -> Self {
        let (kind, count) = match err {
            FeedError::InvalidArgument { count } => (ErrorKind::InvalidArgument, Some(*count)),
            FeedError::Closed => (ErrorKind::Closed, None),
        };
        ServerToClient::Error {
            kind,
            message: err.to_string(),
            count,
        }
    }

    pub fn malformed(message: String) -> Self {
        ServerToClient::Error {
            kind: ErrorKind::Malformed,
            message,
            count: None,
        }
    }
}

/// Reads the next non-empty line as raw bytes, without its line ending.
///
/// Bytes are not checked for UTF-8 here; a bad line fails to decode as JSON
/// and is answered like any other malformed request.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    // Line-oriented framing keeps the protocol usable from netcat.
    let mut line = Vec::new();
    loop {
        line.clear();
        let bytes = reader.read_until(b'\n', &mut line).await?;
        if bytes == 0 {
            return Ok(None);
        }

        while line.last().is_some_and(|byte| LINE_ENDINGS.contains(byte)) {
            line.pop();
        }
        if line.is_empty() {
            continue;
        }

        return Ok(Some(line));
    }
}

pub async fn read_message<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    match read_frame(reader).await? {
        Some(frame) => serde_json::from_slice(&frame).map(Some).map_err(to_io_error),
        None => Ok(None),
    }
}

pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(message).map_err(to_io_error)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

fn to_io_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
