use std::{
    fs::File,
    io::{self, Read},
    path::PathBuf,
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::Parser;

use deck_bridge::{
    config::{self, BridgeConfig},
    host::{list_ports, parse_message, LogSink, MidiOut, MidiSink, Remapper, WordReader},
    wire::WireWord,
};

const DEFAULT_CONFIG: &str = "bridge.yml";
const READER_THREAD_NAME: &str = "deck-bridge-reader";

#[derive(Parser, Debug)]
#[clap(
    name = "deck-bridge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Turns the controller's wire words into MIDI notes and control changes",
)]
struct Args {
    #[clap(short, long, default_value = DEFAULT_CONFIG, help = "Bridge config file")]
    config: PathBuf,

    #[clap(short, long, help = "Byte stream from the controller (overrides serial_port)")]
    serial: Option<String>,

    #[clap(short, long, help = "MIDI output port name hint (overrides midi_port)")]
    midi_port: Option<String>,

    #[clap(long, help = "List MIDI output ports and exit")]
    list_ports: bool,

    #[clap(long, help = "Log decoded events instead of sending MIDI")]
    monitor: bool,

    #[clap(long, conflicts_with = "serial", help = "Decode a captured byte dump")]
    replay: Option<PathBuf>,
}

#[derive(Debug)]
enum ControlMessage {
    Word { word: WireWord, timestamp: Instant },
    Closed(Option<io::Error>),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_ports {
        for name in list_ports()? {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config: BridgeConfig = config::load_or_default(&args.config)?;
    if let Some(serial) = args.serial {
        config.serial_port = serial;
    }
    if let Some(port) = args.midi_port {
        config.midi_port = port;
    }

    let source: Box<dyn Read + Send> = match &args.replay {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("opening replay {}", path.display()))?,
        ),
        None => {
            if config.serial_port.trim().is_empty() {
                bail!("no serial port configured (use --serial or serial_port in the config)");
            }
            let port = File::open(&config.serial_port)
                .with_context(|| format!("opening {}", config.serial_port))?;
            log::info!("reading controller stream from {}", config.serial_port);
            Box::new(port)
        }
    };

    let (tx, rx) = mpsc::channel::<ControlMessage>();
    let reader = thread::Builder::new()
        .name(READER_THREAD_NAME.into())
        .spawn(move || read_words(source, tx))
        .context("starting reader thread")?;

    let mut remapper = Remapper::new(config.mapping.clone());
    if args.monitor {
        run(&rx, &mut remapper, &mut LogSink);
    } else {
        let mut out = match MidiOut::connect(&config.midi_port) {
            Ok(out) => out,
            Err(err) => {
                log::error!("{err}");
                return Err(err.into());
            }
        };
        run(&rx, &mut remapper, &mut out);
        out.close();
    }

    drop(rx);
    let _ = reader.join();
    Ok(())
}

/// Reader thread: frame the stream into words and hand them to the main
/// loop with their arrival time.
fn read_words(source: Box<dyn Read + Send>, tx: Sender<ControlMessage>) {
    let mut reader = WordReader::new(source);
    loop {
        let message = match reader.read_word() {
            Ok(Some(word)) => ControlMessage::Word {
                word,
                timestamp: Instant::now(),
            },
            Ok(None) => ControlMessage::Closed(None),
            Err(err) => ControlMessage::Closed(Some(err)),
        };
        let closed = matches!(message, ControlMessage::Closed(_));
        if tx.send(message).is_err() || closed {
            break;
        }
    }
}

fn run<S: MidiSink>(rx: &Receiver<ControlMessage>, remapper: &mut Remapper, sink: &mut S) {
    while let Ok(message) = rx.recv() {
        match message {
            ControlMessage::Word { word, timestamp } => {
                let event = parse_message(word);
                log::debug!("{:#06x} -> {event:?}", word.0);
                remapper.dispatch(event, timestamp, sink);
            }
            ControlMessage::Closed(None) => {
                log::info!("controller stream closed");
                break;
            }
            ControlMessage::Closed(Some(err)) => {
                log::error!("controller stream failed: {err}");
                break;
            }
        }
    }
}
