use anyhow::Error;
use clap::Parser;
use std::io::BufRead;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

mod calculator;
mod clipboard;
mod clock;
mod config;
mod display;
mod evaluator;
mod input;
mod tokenizer;
mod widget;

use clock::{Locale, Ticker};
use config::Config;
use tokenizer::{TokenizeError, Tokenizer};
use widget::Widget;

/// Desk calculator driven by key presses.
///
/// Plain characters are keys (`0-9 + - * / % . , =`), `<Name>` is a named
/// key (`Enter`, `Escape`, `Backspace`, `C-c`, `C-v`) and `{id}` presses an
/// on-screen button (`ac`, `ce`, `add`, `subtract`, `multiply`, `divide`,
/// `percent`, `equals`, `dot`, `0`-`9`).
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Key sequences to press; reads lines from stdin when absent
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    keys: Vec<String>,
    /// Config file (defaults to the per-user deskcalc/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Locale for the date and time readout
    #[arg(long)]
    locale: Option<Locale>,
    /// Enable the key click
    #[arg(long)]
    audio: bool,
    /// Show the date and time readout
    #[arg(long)]
    clock: bool,
    /// Local time offset from UTC in minutes
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,
    /// Keep copy and paste inside this process instead of the desktop clipboard
    #[arg(long)]
    memory_clipboard: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(offset) = self.utc_offset {
            config.utc_offset_minutes = offset;
        }
        config.audio |= self.audio;
        config.clock |= self.clock;
    }
}

#[derive(Debug, Clone)]
enum Event {
    Line(String),
    Tick,
    Eof,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run() -> Result<(), Error> {
    init_tracing();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    tracing::debug!(?config, "starting");

    let mut tokenizer = Tokenizer::default();
    let clipboard: Box<dyn clipboard::Clipboard> = if args.memory_clipboard {
        Box::new(clipboard::MemoryClipboard::default())
    } else {
        Box::new(clipboard::SystemClipboard::default())
    };
    let mut widget = Widget::new(&config, clipboard, Box::new(widget::TerminalSpeaker));

    let stdout = std::io::stdout();
    let lock = stdout.lock();
    let mut w = std::io::BufWriter::new(lock);

    if !args.keys.is_empty() {
        for keys in &args.keys {
            press_keys(&mut tokenizer, &mut widget, keys)?;
        }
        render(&mut w, &widget, config.clock)?;
    } else {
        let is_interactive = atty::is(atty::Stream::Stdin);
        let (tx, rx) = flume::unbounded();

        let reader = {
            let tx = tx.clone();
            std::thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(Event::Line(line)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(%e, "stdin read failed");
                            break;
                        }
                    }
                }
                let _ = tx.send(Event::Eof);
            })
        };
        let _ticker = config
            .clock
            .then(|| Ticker::start(Duration::from_secs(1), tx.clone(), Event::Tick));
        drop(tx);

        if is_interactive {
            prompt(&mut w, &widget, config.clock)?;
            w.flush()?;
        }

        for event in rx.iter() {
            match event {
                Event::Line(keys) => {
                    if let Err(e) = press_keys(&mut tokenizer, &mut widget, &keys) {
                        eprintln!("{}", e);
                        tokenizer.reset();
                    }
                    render(&mut w, &widget, config.clock)?;
                    if is_interactive {
                        prompt(&mut w, &widget, config.clock)?;
                    }
                    w.flush()?;
                }
                Event::Tick => {
                    widget.tick();
                    if is_interactive {
                        repaint(&mut w, &widget)?;
                    }
                }
                Event::Eof => break,
            }
        }

        if reader.join().is_err() {
            tracing::warn!("stdin reader panicked");
        }
    }
    w.flush()?;

    Ok(())
}

fn press_keys(
    tokenizer: &mut Tokenizer,
    widget: &mut Widget,
    keys: &str,
) -> Result<(), TokenizeError> {
    for c in keys.chars() {
        if let Some(key) = tokenizer.update(c)? {
            widget.press(&key);
        }
    }
    tokenizer.finalize()
}

fn render(w: &mut impl Write, widget: &Widget, show_clock: bool) -> std::io::Result<()> {
    if show_clock {
        let readout = widget.readout();
        writeln!(w, "{} {}  {}", readout.date, readout.time, widget.display())
    } else {
        writeln!(w, "{}", widget.display())
    }
}

fn prompt(w: &mut impl Write, widget: &Widget, show_clock: bool) -> std::io::Result<()> {
    if show_clock {
        let readout = widget.readout();
        write!(w, "{} {}  {} >>> ", readout.date, readout.time, widget.display())
    } else {
        write!(w, ">>> ")
    }
}

/// Redraws the clock prompt in place.
fn repaint(w: &mut impl Write, widget: &Widget) -> std::io::Result<()> {
    write!(w, "\r\x1b[2K")?;
    prompt(w, widget, true)?;
    w.flush()
}
