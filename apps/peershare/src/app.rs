//! Send and receive commands, wired over a TCP channel.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use peershare_channel::tcp;
use peershare_transfer::{
    DirectorySink, FileSource, FileSummary, ProgressSink, Receiver, Transmitter,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::cli::Command;
use crate::config::Config;

/// Runs one command until it finishes or Ctrl-C is pressed.
pub async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("SIGINT received, cancelling");
            interrupt.cancel();
        }
    });

    match command {
        Command::Send { addr, path } => send(&config, addr, &path, &cancel).await,
        Command::Receive { listen } => {
            let addr = listen.unwrap_or(config.listen_addr);
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            serve(&config, &listener, &cancel).await.map(|_| ())
        }
    }
}

/// Connects to `addr` and sends the file at `path`.
async fn send(
    config: &Config,
    addr: SocketAddr,
    path: &Path,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let transfer = config.transfer();
    let chunker = transfer.chunker()?;
    let source = FileSource::from_path(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let (mut tx, _rx) = tcp::connect(addr, cancel)
        .await
        .with_context(|| format!("connecting to {addr}"))?;
    tracing::info!(peer = %addr, name = %config.name, "connected");

    let mut transmitter = Transmitter::new(chunker, transfer.pacer()).with_name(&config.name);
    let report = transmitter
        .send(&mut tx, &source, &ProgressLog::new("send"), cancel)
        .await?;
    tx.shutdown().await?;

    tracing::info!(
        file = %source.meta().file_name,
        chunks = report.total_chunks,
        bytes = report.bytes,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "send finished"
    );
    Ok(())
}

/// Accepts one peer on `listener` and saves its files until it disconnects.
async fn serve(
    config: &Config,
    listener: &TcpListener,
    cancel: &CancellationToken,
) -> anyhow::Result<Vec<FileSummary>> {
    config.transfer().validate()?;
    tracing::info!(
        addr = %listener.local_addr()?,
        output = %config.output_dir.display(),
        name = %config.name,
        "waiting for a peer"
    );

    let (_tx, mut rx, peer) = tcp::accept(listener, cancel).await?;
    let mut receiver = Receiver::new(
        config.max_chunk_size,
        DirectorySink::new(&config.output_dir),
    );
    let files = receiver
        .receive_all(&mut rx, &ProgressLog::new("receive"), cancel)
        .await?;

    for file in &files {
        tracing::info!(
            file = %file.file_name,
            size = file.size,
            sha256 = %file.sha256,
            "received"
        );
    }
    tracing::info!(%peer, files = files.len(), "peer disconnected");
    Ok(files)
}

/// Logs progress each time it crosses a 10 % step.
struct ProgressLog {
    direction: &'static str,
    last_step: AtomicU32,
}

impl ProgressLog {
    fn new(direction: &'static str) -> Self {
        Self {
            direction,
            last_step: AtomicU32::new(0),
        }
    }

    /// Returns `true` if `percent` lands in a different step than the last report.
    fn crossed_step(&self, percent: f64) -> bool {
        let step = (percent / 10.0).floor() as u32;
        self.last_step.swap(step, Ordering::Relaxed) != step
    }
}

impl ProgressSink for ProgressLog {
    fn report(&self, percent: f64) {
        if self.crossed_step(percent) {
            tracing::info!(
                direction = self.direction,
                percent = percent.round() as u32,
                "progress"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(output_dir: &Path) -> Config {
        Config {
            chunk_size: 1000,
            chunk_interval_ms: 0,
            output_dir: output_dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn progress_log_steps() {
        let log = ProgressLog::new("test");
        assert!(!log.crossed_step(5.0));
        assert!(log.crossed_step(12.5));
        assert!(!log.crossed_step(19.9));
        assert!(log.crossed_step(100.0));
        assert!(log.crossed_step(33.0));
    }

    #[tokio::test]
    async fn send_and_receive_over_tcp() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("report.pdf");
        let data: Vec<u8> = (0..25_500u32).map(|i| (i % 256) as u8).collect();
        std::fs::write(&input, &data).unwrap();

        let out_dir = tmp.path().join("inbox");
        let config = test_config(&out_dir);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();

        let server = {
            let config = config.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { serve(&config, &listener, &cancel).await })
        };

        send(&config, addr, &input, &cancel).await.unwrap();
        let files = tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "report.pdf");
        assert_eq!(files[0].file_type, "application/pdf");
        assert_eq!(std::fs::read(out_dir.join("report.pdf")).unwrap(), data);
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(serve(&config, &listener, &cancel).await.is_err());
    }

    #[tokio::test]
    async fn send_missing_file_fails_before_connecting() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let unused: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let err = send(
            &config,
            unused,
            &tmp.path().join("missing.bin"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("missing.bin"));
    }
}
