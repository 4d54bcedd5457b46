use std::{fmt::Display, future::Future};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::{
    access_point::AccessPoint,
    client::{ClientError, FeedClient},
    error::FeedError,
    protocol::{HELP, ShellCommand},
};

/// The two feed operations, whether the feed lives in-process or behind a socket.
pub trait FeedService {
    type Error: Display;

    fn post(&mut self, message: String) -> impl Future<Output = Result<(), Self::Error>>;

    fn get(&mut self, count: i64) -> impl Future<Output = Result<Vec<String>, Self::Error>>;
}

impl FeedService for AccessPoint {
    type Error = FeedError;

    async fn post(&mut self, message: String) -> Result<(), FeedError> {
        AccessPoint::post(self, message).await
    }

    async fn get(&mut self, count: i64) -> Result<Vec<String>, FeedError> {
        AccessPoint::get(self, count).await
    }
}

impl FeedService for FeedClient {
    type Error = ClientError;

    async fn post(&mut self, message: String) -> Result<(), ClientError> {
        FeedClient::post(self, message).await
    }

    async fn get(&mut self, count: i64) -> Result<Vec<String>, ClientError> {
        FeedClient::get(self, count).await
    }
}

/// Reads commands line by line until `quit` or end of input.
///
/// Failed commands are reported on `errors` and the loop keeps going.
pub async fn run_shell<S, R, O, E>(
    feed: &mut S,
    input: &mut R,
    output: &mut O,
    errors: &mut E,
) -> Result<()>
where
    S: FeedService,
    R: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if input.read_until(b'\n', &mut buffer).await? == 0 {
            debug!("shell input closed");
            return Ok(());
        }
        let Ok(line) = std::str::from_utf8(&buffer) else {
            write_line(errors, "!!! invalid UTF-8 input").await?;
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match ShellCommand::parse(line) {
            Ok(command) => command,
            Err(err) => {
                write_line(errors, &format!("!!! {err}")).await?;
                continue;
            }
        };

        match command {
            ShellCommand::Post { message } => {
                if let Err(err) = feed.post(message).await {
                    write_line(errors, &format!("!!! {err}")).await?;
                }
            }
            ShellCommand::Get { count } => match feed.get(count).await {
                Ok(messages) => {
                    for message in messages {
                        write_line(output, &message).await?;
                    }
                }
                Err(err) => write_line(errors, &format!("!!! {err}")).await?,
            },
            ShellCommand::Help => write_line(output, HELP).await?,
            ShellCommand::Quit => return Ok(()),
        }
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_point::FeedConfig;

    async fn run_script(feed: &mut AccessPoint, script: &str) -> (String, String) {
        run_bytes(feed, script.as_bytes()).await
    }

    async fn run_bytes(feed: &mut AccessPoint, script: &[u8]) -> (String, String) {
        let mut input = tokio::io::BufReader::new(script);
        let mut output = Vec::new();
        let mut errors = Vec::new();
        run_shell(feed, &mut input, &mut output, &mut errors)
            .await
            .expect("shell run");
        (
            String::from_utf8(output).expect("utf8 output"),
            String::from_utf8(errors).expect("utf8 errors"),
        )
    }

    #[tokio::test]
    async fn get_prints_one_message_per_line_oldest_first() {
        let mut feed = AccessPoint::spawn(FeedConfig::default());
        let (output, errors) =
            run_script(&mut feed, "post a\npost b\npost c\npost d\nget 2\n").await;
        assert_eq!(output, "c\nd\n");
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn errors_are_reported_and_the_shell_continues() {
        let mut feed = AccessPoint::spawn(FeedConfig::default());
        let (output, errors) = run_script(&mut feed, "bogus\nget -1\npost ok\nget\n").await;
        assert_eq!(output, "ok\n");
        let lines: Vec<&str> = errors.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("!!! invalid command"));
        assert!(lines[1].contains("invalid argument"));
    }

    #[tokio::test]
    async fn quit_stops_reading() {
        let mut feed = AccessPoint::spawn(FeedConfig::default());
        let (output, _) = run_script(&mut feed, "post x\nquit\nget\n").await;
        assert!(output.is_empty());
        assert_eq!(feed.get(10).await.expect("get"), vec!["x"]);
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_reported_and_skipped() {
        let mut feed = AccessPoint::spawn(FeedConfig::default());
        let (output, errors) = run_bytes(&mut feed, b"post a\n\xff\xfe\nget\n").await;
        assert_eq!(output, "a\n");
        assert_eq!(errors, "!!! invalid UTF-8 input\n");
    }
}
