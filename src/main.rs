//! thinterm - a VT100 serial terminal on the host console
//!
//! The emulated 80x25 screen is drawn in the host terminal. Inbound bytes
//! come from a TCP link standing in for the serial line, or from the
//! terminal's own output when running in loopback.
//!
//! # Quick Start
//!
//! ```text
//! thinterm                         # Loopback: keystrokes come back as input
//! thinterm --connect host:2323     # Talk to a host over TCP
//! thinterm --replay capture.bin    # Feed a capture and dump the screen
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | NumLock / Ctrl+] | Open or cancel the setup screen |
//! | Ctrl+Q | Quit |

use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossterm::event::{self, Event};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use thinterm::config::{Config, PROFILE_COUNT};
use thinterm::core::link::{self, LinkError, TcpLink, Transport};
use thinterm::core::queue::{self, Consumer, Producer, PushError, KEY_CAPACITY, RX_CAPACITY};
use thinterm::core::session::Session;
use thinterm::ui::{DebugRenderer, HostKey, KeyMapper, Renderer};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Idle wait between loop iterations
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Where inbound bytes come from
enum Mode {
    Loopback,
    Connect(String),
    Replay(PathBuf),
}

/// Command line options
struct Options {
    mode: Mode,
    config_path: Option<PathBuf>,
    /// 1-based profile number
    profile: Option<usize>,
}

fn print_version() {
    eprintln!("thinterm {}", VERSION);
}

fn print_help() {
    eprintln!("thinterm {} - A VT100 serial terminal", VERSION);
    eprintln!();
    eprintln!("Usage: thinterm [OPTIONS]");
    eprintln!();
    eprintln!("Link options:");
    eprintln!("  (default)             Loopback: sent bytes are received back");
    eprintln!("  --connect <ADDR>      Connect to HOST:PORT over TCP");
    eprintln!("  --replay <FILE>       Feed FILE as inbound bytes, print the screen");
    eprintln!();
    eprintln!("Other options:");
    eprintln!("  --config <PATH>       Read configuration from PATH");
    eprintln!("  --profile <N>         Start with profile N (1-{})", PROFILE_COUNT);
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys:");
    eprintln!("  NumLock, Ctrl+]       Setup screen");
    eprintln!("  Ctrl+Q                Quit");
    eprintln!();
    eprintln!("Configuration: ~/.thinterm/config.toml");
    eprintln!("Log file:      ~/.thinterm/thinterm.log (RUST_LOG sets the level)");
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options {
        mode: Mode::Loopback,
        config_path: None,
        profile: None,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--connect" => {
                options.mode = Mode::Connect(value_of(&args, &mut i, "address")?);
            }
            "--replay" => {
                options.mode = Mode::Replay(PathBuf::from(value_of(&args, &mut i, "file")?));
            }
            "--config" => {
                options.config_path = Some(PathBuf::from(value_of(&args, &mut i, "path")?));
            }
            "--profile" => {
                let value = value_of(&args, &mut i, "profile")?;
                match value.parse::<usize>() {
                    Ok(n) if (1..=PROFILE_COUNT).contains(&n) => options.profile = Some(n),
                    _ => return Err(format!("Invalid profile: {}", value)),
                }
            }
            arg => {
                return Err(format!("Unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Take the argument following option `args[*i]`.
fn value_of(args: &[String], i: &mut usize, what: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("Missing {} argument", what))
}

/// Install the file logger. The console is the terminal display, so
/// nothing is logged to it.
fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("thinterm.log"))
        .unwrap_or_else(|| PathBuf::from("thinterm.log"));

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("thinterm {} starting...", VERSION);

    let mut config = match &options.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    if let Some(n) = options.profile {
        config.select_profile(n - 1)?;
    }

    match options.mode {
        Mode::Replay(path) => run_replay(config, &path),
        Mode::Connect(addr) => run_connect(config, &addr),
        Mode::Loopback => run_loopback(config),
    }
}

/// Feed a capture file through a fresh terminal and print the screen.
fn run_replay(config: Config, path: &Path) -> anyhow::Result<()> {
    let capture =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("replaying {} bytes from {}", capture.len(), path.display());

    let mut session = Session::new(Vec::new(), config);
    session.start();
    session.feed_bytes(&capture);

    println!("{}", DebugRenderer::render(&session.state));
    Ok(())
}

/// Talk to a remote host over TCP.
fn run_connect(config: Config, addr: &str) -> anyhow::Result<()> {
    let (stream, reader, mut inbound) = TcpLink::connect(addr)?.split()?;
    let mut session = Session::new(BufWriter::new(stream), config);

    let result = run_terminal(&mut session, &mut inbound);

    link::shutdown(session.transport().get_ref());
    reader.stop();
    drop(inbound);
    reader.join();
    result
}

/// Outbound bytes feed straight back into the inbound queue, like a
/// looped-back serial port.
struct Loopback(Producer<u8>);

impl Write for Loopback {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            match self.0.try_push(byte) {
                Ok(()) => {}
                Err(PushError::Full(_)) => debug!("loopback overflow, dropped {:#04x}", byte),
                Err(PushError::Disconnected(_)) => {
                    return Err(io::ErrorKind::BrokenPipe.into());
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_loopback(config: Config) -> anyhow::Result<()> {
    let (tx, mut inbound) = queue::bounded(RX_CAPACITY);
    let mut session = Session::new(Loopback(tx), config);
    run_terminal(&mut session, &mut inbound)
}

/// Host input as seen by the foreground loop
enum Input {
    Key(HostKey),
    Resize(u16, u16),
}

/// Read host events on a background thread.
fn spawn_input(keys: Producer<Input>) {
    thread::spawn(move || loop {
        let input = match event::read() {
            Ok(Event::Key(key_event)) => match KeyMapper::map(&key_event) {
                Some(key) => Input::Key(key),
                None => continue,
            },
            Ok(Event::Resize(cols, rows)) => Input::Resize(cols, rows),
            Ok(_) => continue,
            Err(e) => {
                error!("Failed to read input: {}", e);
                break;
            }
        };
        match keys.try_push(input) {
            Ok(()) => {}
            Err(PushError::Full(_)) => debug!("key queue full, key dropped"),
            Err(PushError::Disconnected(_)) => break,
        }
    });
}

/// Set up the host console, run the foreground loop, and always restore
/// the console afterwards.
fn run_terminal<T: Transport>(
    session: &mut Session<T>,
    inbound: &mut Consumer<u8>,
) -> anyhow::Result<()> {
    let (cols, rows) = Renderer::size()?;
    info!("Host console size: {}x{}", cols, rows);

    session.start();

    let mut renderer = Renderer::new();
    renderer.init()?;

    let (key_tx, mut keys) = queue::bounded(KEY_CAPACITY);
    spawn_input(key_tx);

    let result = run_main_loop(session, &mut renderer, inbound, &mut keys);

    let _ = renderer.cleanup();
    if let Err(e) = &result {
        error!("Terminal loop failed: {}", e);
    }
    result
}

/// Drain inbound bytes, then keystrokes, then redraw.
fn run_main_loop<T: Transport>(
    session: &mut Session<T>,
    renderer: &mut Renderer,
    inbound: &mut Consumer<u8>,
    keys: &mut Consumer<Input>,
) -> anyhow::Result<()> {
    renderer.render(&session.state)?;

    loop {
        let mut dirty = false;

        for byte in inbound.drain() {
            session.process_byte(byte);
            dirty = true;
        }
        if inbound.is_disconnected() {
            info!("Link closed");
            break;
        }

        while let Some(input) = keys.try_pop() {
            match input {
                Input::Key(HostKey::Quit) => {
                    info!("Quit requested");
                    return Ok(());
                }
                Input::Key(HostKey::Key(key)) => match session.handle_key(key) {
                    Ok(()) => {}
                    Err(LinkError::Disconnected) => {
                        info!("Link closed while sending");
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                },
                Input::Resize(cols, rows) => renderer.resize(cols, rows),
            }
            dirty = true;
        }
        if keys.is_disconnected() {
            info!("Input closed");
            break;
        }

        session.flush()?;

        if dirty {
            renderer.render(&session.state)?;
        } else {
            thread::sleep(POLL_INTERVAL);
        }
    }

    Ok(())
}
