use std::{path::Path, process::Stdio, time::Duration};

use anyhow::{Context, Result, anyhow};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStderr, Command},
    time::timeout,
};

const READ_TIMEOUT: Duration = Duration::from_secs(3);

#[tokio::test]
async fn cli_post_and_get_end_to_end() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("shared_feed");

    let (mut server_child, mut server_logs) = spawn_server(&binary).await?;
    let addr = read_server_addr(&mut server_logs).await?;

    // Drain additional server logs in the background so the pipe never fills.
    let server_log_task = tokio::spawn(async move {
        drain_logs(server_logs).await;
    });

    run_cli(&binary, &["post", "--server", &addr, "Hello", "world!"]).await?;
    run_cli(&binary, &["post", "--server", &addr, "Today is Monday"]).await?;

    let output = run_cli(&binary, &["get", "--server", &addr, "5"]).await?;
    assert_eq!(output, "Hello world!\nToday is Monday\n");

    // The interactive shell talks to the same feed.
    let shell_output = run_shell(&binary, &addr, "post third\nget 2\nquit\n").await?;
    assert_eq!(shell_output, "Today is Monday\nthird\n");

    let rejected = Command::new(&binary)
        .args(["get", "--server", &addr, "-1"])
        .env("RUST_LOG", "warn")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    assert!(!rejected.success(), "negative count should fail");

    // Server stays up after clients disconnect; terminate it manually.
    let _ = server_child.kill().await;
    let _ = server_child.wait().await;
    let _ = server_log_task.await;

    Ok(())
}

#[tokio::test]
async fn local_shell_keeps_logs_off_stdout() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("shared_feed");
    let mut child = Command::new(&binary)
        .arg("local")
        .env("RUST_LOG", "debug")
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn local shell")?;

    let mut stdin = child.stdin.take().context("shell stdin missing")?;
    stdin.write_all(b"post one\npost two\nget\n").await?;
    drop(stdin);

    let output = timeout(READ_TIMEOUT, child.wait_with_output())
        .await
        .context("local shell timed out")??;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?, "one\ntwo\n");
    assert!(String::from_utf8(output.stderr)?.contains("feed worker started"));
    Ok(())
}

async fn spawn_server(binary: &Path) -> Result<(Child, BufReader<ChildStderr>)> {
    let mut cmd = Command::new(binary);
    cmd.arg("serve")
        .arg("--listen")
        .arg("127.0.0.1:0")
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("failed to spawn server")?;
    let stderr = child
        .stderr
        .take()
        .context("server stderr missing after spawn")?;

    Ok((child, BufReader::new(stderr)))
}

async fn read_server_addr(reader: &mut BufReader<ChildStderr>) -> Result<String> {
    loop {
        let line = read_line(reader)
            .await?
            .context("server did not emit listening address")?;
        let trimmed = line.trim();
        if !trimmed.contains("feed server listening on") {
            continue;
        }
        let addr = trimmed
            .split_whitespace()
            .last()
            .context("unexpected server banner format")?;
        if !addr.contains(':') {
            return Err(anyhow!("server banner missing socket: {trimmed}"));
        }
        return Ok(addr.to_string());
    }
}

async fn run_cli(binary: &Path, args: &[&str]) -> Result<String> {
    let output = timeout(
        READ_TIMEOUT,
        Command::new(binary)
            .args(args)
            .env("RUST_LOG", "warn")
            .stderr(Stdio::null())
            .output(),
    )
    .await
    .context("cli command timed out")??;
    if !output.status.success() {
        return Err(anyhow!("{args:?} exited with status {}", output.status));
    }
    Ok(String::from_utf8(output.stdout)?)
}

async fn run_shell(binary: &Path, addr: &str, script: &str) -> Result<String> {
    let mut child = Command::new(binary)
        .args(["shell", "--server", addr])
        .env("RUST_LOG", "info")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to spawn shell")?;

    let mut stdin = child.stdin.take().context("shell stdin missing")?;
    stdin.write_all(script.as_bytes()).await?;
    stdin.flush().await?;
    drop(stdin);

    let output = timeout(READ_TIMEOUT, child.wait_with_output())
        .await
        .context("shell timed out")??;
    if !output.status.success() {
        return Err(anyhow!("shell exited with status {}", output.status));
    }
    Ok(String::from_utf8(output.stdout)?)
}

async fn read_line(reader: &mut BufReader<ChildStderr>) -> Result<Option<String>> {
    let mut line = String::new();
    let read_future = reader.read_line(&mut line);
    let bytes_io = match timeout(READ_TIMEOUT, read_future).await {
        Ok(result) => result,
        Err(_) => return Err(anyhow!("timed out waiting for line")),
    };
    let byte_count = bytes_io?;
    if byte_count == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

async fn drain_logs(mut reader: BufReader<ChildStderr>) {
    let mut buffer = String::new();
    while let Ok(bytes) = reader.read_line(&mut buffer).await {
        if bytes == 0 {
            break;
        }
        buffer.clear();
    }
}
