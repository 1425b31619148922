//! Command line parsing.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PeerShare - send a file to a peer in paced chunks.
#[derive(Debug, Parser)]
#[command(
    name = "peershare",
    version,
    about = "PeerShare - chunked file transfer between two peers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Send a file to a listening peer
    Send {
        /// Address of the receiving peer
        addr: SocketAddr,
        /// File to send
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Receive files into the configured output directory
    Receive {
        /// Address to listen on (defaults to `listen_addr` from the config)
        #[arg(value_name = "LISTEN_ADDR")]
        listen: Option<SocketAddr>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_send() {
        let cli = Cli::try_parse_from(["peershare", "send", "10.0.0.2:7878", "photo.jpg"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Send {
                addr: "10.0.0.2:7878".parse().unwrap(),
                path: PathBuf::from("photo.jpg"),
            }
        );
    }

    #[test]
    fn parses_receive_with_and_without_addr() {
        let cli = Cli::try_parse_from(["peershare", "receive"]).unwrap();
        assert_eq!(cli.command, Command::Receive { listen: None });

        let cli = Cli::try_parse_from(["peershare", "receive", "127.0.0.1:9000"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Receive {
                listen: Some("127.0.0.1:9000".parse().unwrap())
            }
        );
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["peershare"]).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Cli::try_parse_from(["peershare", "send"]).is_err());
        assert!(Cli::try_parse_from(["peershare", "send", "not-an-addr", "f"]).is_err());
        assert!(Cli::try_parse_from(["peershare", "receive", "x", "y"]).is_err());
        assert!(Cli::try_parse_from(["peershare", "upload"]).is_err());
    }
}
