use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

use crate::{access_point::DEFAULT_MAILBOX_CAPACITY, protocol::DEFAULT_GET_COUNT};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the feed server, accepting local TCP (and optionally HTTP) connections.
    Serve(ServeArgs),
    /// Connect to a feed server and issue commands interactively.
    Shell(RemoteArgs),
    /// Run the interactive shell against an in-process feed.
    Local(LocalArgs),
    /// Append one message to a remote feed.
    Post(PostArgs),
    /// Print the most recent messages of a remote feed, oldest first.
    Get(GetArgs),
    /// Post two messages to an in-process feed and print them back.
    Demo,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Socket address for the line-delimited JSON protocol. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub listen: SocketAddr,

    /// Also serve the HTTP API on this address.
    #[arg(long)]
    pub http: Option<SocketAddr>,

    /// Pending requests allowed before submitters wait.
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    pub mailbox_capacity: usize,
}

#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// Address of the feed server to connect to.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub server: SocketAddr,
}

#[derive(Args, Debug, Clone)]
pub struct LocalArgs {
    /// Pending requests allowed before submitters wait.
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    pub mailbox_capacity: usize,
}

#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Message text; multiple words are joined with single spaces.
    #[arg(required = true, num_args = 1..)]
    pub words: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Number of messages to fetch.
    #[arg(default_value_t = DEFAULT_GET_COUNT, allow_negative_numbers = true)]
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_defaults_to_ten_messages() {
        let cli = Cli::try_parse_from(["shared_feed", "get"]).expect("parse");
        let Command::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.count, 10);
        assert_eq!(args.remote.server, "127.0.0.1:5000".parse().unwrap());
    }

    #[test]
    fn get_accepts_negative_counts() {
        let cli = Cli::try_parse_from(["shared_feed", "get", "-1"]).expect("parse");
        assert!(matches!(cli.command, Command::Get(GetArgs { count: -1, .. })));
    }

    #[test]
    fn post_joins_words() {
        let cli = Cli::try_parse_from(["shared_feed", "post", "Today", "is", "Monday"])
            .expect("parse");
        let Command::Post(args) = cli.command else {
            panic!("expected post");
        };
        assert_eq!(args.words.join(" "), "Today is Monday");
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
