//! Host link
//!
//! The byte channel to the remote host. Outbound bytes go through the
//! [`Transport`] trait; inbound bytes are read on a background thread and
//! pushed into a bounded queue that the foreground loop drains.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::queue::{self, Consumer, Producer, RX_CAPACITY};

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read from link: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to write to link: {0}")]
    Write(#[source] io::Error),

    #[error("Link disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// Outbound side of the link.
pub trait Transport {
    /// Send one byte to the host.
    fn send(&mut self, byte: u8) -> Result<()>;

    /// Push out anything buffered.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<W: Write> Transport for W {
    fn send(&mut self, byte: u8) -> Result<()> {
        self.write_all(&[byte]).map_err(|err| match err.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => LinkError::Disconnected,
            _ => LinkError::Write(err),
        })
    }

    fn flush(&mut self) -> Result<()> {
        Write::flush(self).map_err(LinkError::Write)
    }
}

/// Background thread copying inbound bytes into a queue.
pub struct LinkReader {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl LinkReader {
    /// Start reading `source` until EOF or error. Returns the reader handle
    /// and the consuming end of the inbound queue.
    pub fn spawn<R>(source: R) -> (Self, Consumer<u8>)
    where
        R: Read + Send + 'static,
    {
        let (tx, rx) = queue::bounded(RX_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread = thread::spawn(move || read_loop(source, tx, &flag));
        (
            Self {
                running,
                thread: Some(thread),
            },
            rx,
        )
    }

    /// Check if the reader is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the reader to stop after its current read.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for the reader thread to exit.
    pub fn join(mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LinkReader {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn read_loop<R: Read>(mut source: R, tx: Producer<u8>, running: &AtomicBool) {
    let mut buffer = [0u8; 1024];

    while running.load(Ordering::SeqCst) {
        match source.read(&mut buffer) {
            Ok(0) => {
                info!("link closed by peer");
                break;
            }
            Ok(n) => {
                for &byte in &buffer[..n] {
                    // Blocks while the foreground loop catches up
                    if tx.push(byte).is_err() {
                        debug!("inbound queue consumer dropped");
                        running.store(false, Ordering::SeqCst);
                        return;
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("{}", LinkError::Read(err));
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
}

/// TCP connection standing in for the serial line.
pub struct TcpLink {
    stream: TcpStream,
}

impl TcpLink {
    /// Connect to `addr` (`host:port`).
    pub fn connect(addr: &str) -> Result<Self> {
        let connect_err = |source: io::Error| LinkError::Connect {
            addr: addr.to_string(),
            source,
        };
        let addrs: Vec<_> = addr.to_socket_addrs().map_err(connect_err)?.collect();
        let stream = TcpStream::connect(&addrs[..]).map_err(connect_err)?;
        stream.set_nodelay(true).map_err(connect_err)?;
        info!("connected to {}", addr);
        Ok(Self { stream })
    }

    /// Split into the outbound transport and an inbound reader thread.
    pub fn split(self) -> Result<(TcpStream, LinkReader, Consumer<u8>)> {
        let read_half = self.stream.try_clone().map_err(LinkError::Read)?;
        let (reader, rx) = LinkReader::spawn(read_half);
        Ok((self.stream, reader, rx))
    }
}

/// Close both directions of a TCP link, unblocking its reader.
pub fn shutdown(stream: &TcpStream) {
    if let Err(err) = stream.shutdown(Shutdown::Both) {
        debug!("shutdown: {}", err);
    }
}
