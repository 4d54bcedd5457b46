use anyhow::{Context, Result};
use clap::Parser;
use tokio::{io::BufReader, net::TcpListener, sync::oneshot};
use tracing::{info, warn};

use shared_feed::{
    access_point::{AccessPoint, FeedConfig},
    cli::{Cli, Command, GetArgs, LocalArgs, PostArgs, RemoteArgs, ServeArgs},
    client::FeedClient,
    http,
    server::FeedServer,
    shell::{FeedService, run_shell},
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs stay off stdout, which carries command output.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(args).await?,
        Command::Shell(args) => shell(args).await?,
        Command::Local(args) => local(args).await?,
        Command::Post(args) => post(args).await?,
        Command::Get(args) => get(args).await?,
        Command::Demo => demo().await?,
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let feed = AccessPoint::spawn(FeedConfig {
        mailbox_capacity: args.mailbox_capacity,
    });

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    let server = FeedServer::new(listener, feed.clone());
    info!("feed server listening on {}", server.local_addr()?);

    let (http_stop_tx, http_stop_rx) = oneshot::channel::<()>();
    let http_task = match args.http {
        Some(addr) => {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            let feed = feed.clone();
            Some(tokio::spawn(http::serve(listener, feed, async move {
                let _ = http_stop_rx.await;
            })))
        }
        None => None,
    };

    let result = server.run_until_ctrl_c().await;
    let _ = http_stop_tx.send(());
    if let Some(task) = http_task {
        match task.await {
            Ok(Err(err)) => warn!("http server exited with error: {err:?}"),
            Err(err) => warn!("http server task failed: {err:?}"),
            Ok(Ok(())) => {}
        }
    }
    feed.shutdown().await;

    if let Err(err) = result {
        warn!("feed server exited with error: {err:?}");
        return Err(err);
    }
    Ok(())
}

async fn shell(args: RemoteArgs) -> Result<()> {
    let mut client = FeedClient::connect(args.server)
        .await
        .with_context(|| format!("failed to connect to {}", args.server))?;
    info!("connected to {}", args.server);
    run_stdio_shell(&mut client).await?;
    client.close().await;
    Ok(())
}

async fn local(args: LocalArgs) -> Result<()> {
    let mut feed = AccessPoint::spawn(FeedConfig {
        mailbox_capacity: args.mailbox_capacity,
    });
    run_stdio_shell(&mut feed).await?;
    feed.shutdown().await;
    Ok(())
}

async fn run_stdio_shell<S: FeedService>(feed: &mut S) -> Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    run_shell(feed, &mut stdin, &mut stdout, &mut stderr).await
}

async fn post(args: PostArgs) -> Result<()> {
    let mut client = connect(&args.remote).await?;
    client.post(args.words.join(" ")).await?;
    client.close().await;
    Ok(())
}

async fn get(args: GetArgs) -> Result<()> {
    let mut client = connect(&args.remote).await?;
    let messages = client.get(args.count).await?;
    client.close().await;
    for message in messages {
        println!("{message}");
    }
    Ok(())
}

async fn connect(remote: &RemoteArgs) -> Result<FeedClient> {
    FeedClient::connect(remote.server)
        .await
        .with_context(|| format!("failed to connect to {}", remote.server))
}

async fn demo() -> Result<()> {
    let feed = AccessPoint::spawn(FeedConfig::default());
    feed.post("Hello world!").await.context("post")?;
    feed.post("Today is Monday").await.context("post")?;

    let messages = feed.get(5).await.context("get")?;
    for message in messages {
        info!("{message}");
    }
    feed.shutdown().await;
    Ok(())
}
