/// Entry point and client loop.
///
/// The transport is not part of this program: inbound protocol messages
/// are read one JSON object per line from `--input` (or stdin), and
/// outbound payloads go one per line to `--output` (or the log).

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use webtiles_term::config::{ClientConfig, LogConfig};
use webtiles_term::domain::tiles::UniformAtlas;
use webtiles_term::session::dispatch::Session;
use webtiles_term::session::outbound::Outbound;
use webtiles_term::ui::input::InputState;
use webtiles_term::ui::renderer::{self, Renderer};

const FRAME_SLEEP: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(name = "webtiles-term")]
#[command(about = "Terminal client for remote text/tile game sessions")]
struct Args {
    /// Inbound message stream, one JSON command per line (default: stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Where outbound payloads are written, one per line (default: log only)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Config file (default: search for config.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Apply the whole input, print a text dump of the screen, and exit
    #[arg(long)]
    headless: bool,

    /// Screen size for --headless, as COLSxROWS
    #[arg(long, default_value = "80x24", value_parser = parse_size)]
    size: (usize, usize),
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected COLSxROWS, got {s:?}"))?;
    let w = w.parse::<usize>().map_err(|e| e.to_string())?;
    let h = h.parse::<usize>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("size must be positive".into());
    }
    Ok((w, h))
}

fn main() {
    let args = Args::parse();
    let (config, config_warnings) = ClientConfig::load(args.config.as_deref());

    match init_logging(&config.log) {
        Ok(()) => {
            for w in &config_warnings {
                warn!("{w}");
            }
        }
        Err(e) => {
            eprintln!("Could not open log file {}: {e}", config.log.file.display());
            for w in &config_warnings {
                eprintln!("{w}");
            }
        }
    }

    let atlas = UniformAtlas {
        sprite_w: config.viewport.cell_width,
        sprite_h: config.viewport.cell_height,
        columns: config.viewport.atlas_columns,
    };
    let mut session = Session::new(&config, Box::new(atlas));

    let mut sink = match OutboundSink::open(args.output.as_deref()) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("Could not open output: {e}");
            return;
        }
    };

    let inbound = match spawn_reader(args.input.as_deref()) {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("Could not open input: {e}");
            return;
        }
    };

    if args.headless {
        run_headless(&mut session, &inbound, &mut sink, args.size);
        return;
    }

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = client_loop(&mut session, &inbound, &mut sink, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Client error: {e}");
    }

    let stats = session.stats();
    info!(applied = stats.applied, dropped = stats.dropped, "session ended");
}

fn init_logging(cfg: &LogConfig) -> io::Result<()> {
    let file = File::create(&cfg.file)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

// ── Inbound ──

/// Read lines on a background thread. The channel keeps arrival order;
/// the sender is dropped at EOF.
fn spawn_reader(path: Option<&Path>) -> io::Result<Receiver<String>> {
    let reader: Box<dyn BufRead + Send> = match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in reader.lines() {
            match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("inbound read failed: {e}");
                    break;
                }
            }
        }
        debug!("inbound stream closed");
    });
    Ok(rx)
}

// ── Outbound ──

enum OutboundSink {
    File(BufWriter<File>),
    Log,
}

impl OutboundSink {
    fn open(path: Option<&Path>) -> io::Result<Self> {
        Ok(match path {
            Some(p) => OutboundSink::File(BufWriter::new(File::create(p)?)),
            None => OutboundSink::Log,
        })
    }

    fn send_all(&mut self, msgs: Vec<Outbound>) {
        for msg in msgs {
            let payload = msg.encode();
            match self {
                OutboundSink::File(w) => {
                    if let Err(e) = writeln!(w, "{payload}").and_then(|_| w.flush()) {
                        warn!("outbound write failed: {e}");
                    }
                }
                OutboundSink::Log => info!(%payload, "outbound"),
            }
        }
    }
}

// ── Loops ──

fn run_headless(
    session: &mut Session,
    inbound: &Receiver<String>,
    sink: &mut OutboundSink,
    (w, h): (usize, usize),
) {
    for line in inbound.iter() {
        session.handle_message(&line);
        sink.send_all(session.drain_outbound());
    }
    println!("{}", renderer::text_dump(session, w, h));
}

fn client_loop(
    session: &mut Session,
    inbound: &Receiver<String>,
    sink: &mut OutboundSink,
    renderer: &mut Renderer,
) -> io::Result<()> {
    let mut input = InputState::new();
    let mut connected = true;

    loop {
        // Apply everything that arrived since the last frame, in order.
        while connected {
            match inbound.try_recv() {
                Ok(line) => {
                    session.handle_message(&line);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("inbound stream ended");
                    connected = false;
                }
            }
        }

        input.drain_events();
        if input.ctrl_c_pressed() {
            break;
        }
        for code in input.keypresses() {
            session.handle_key(code);
        }

        sink.send_all(session.drain_outbound());
        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
