use std::io::{self, IsTerminal};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anstream::{eprintln, println};
use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use rng_color::{
    Clipboard, ClipboardError, ClipboardWorker, Color, ColorPresenter, PresenterConfig, Repr,
};
use rustyline::error::ReadlineError;
use rustyline::ExternalPrinter;

/// Random colors in your terminal, copied as rgb() or #hex
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Seed the pseudorandom generator
    #[arg(long)]
    seed: Option<u64>,
    /// How long the copy confirmation stays, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    delay: u64,
    /// Start with this color, as #rrggbb or rgb(r, g, b)
    #[arg(long, value_name = "COLOR")]
    initial: Option<Color>,
    /// Print one color and exit
    #[arg(long)]
    once: bool,
    /// Copy this representation (rgb or hex) and exit
    #[arg(long, value_name = "KIND")]
    copy: Option<Repr>,
    /// Quiet, only print the color texts
    #[arg(short, long)]
    quiet: bool,
    #[command(flatten)]
    color: colorchoice_clap::Color,
}

struct SystemClipboard(arboard::Clipboard);

impl SystemClipboard {
    fn open() -> Result<Self, ClipboardError> {
        arboard::Clipboard::new()
            .map(Self)
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.0
            .set_text(text)
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Generate,
    Copy(Repr),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = match s.trim() {
            "" | "g" | "generate" => Command::Generate,
            "r" | "rgb" | "copy-rgb" => Command::Copy(Repr::Rgb),
            "h" | "hex" | "copy-hex" => Command::Copy(Repr::Hex),
            "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => anyhow::bail!("unknown command {other:?}, try 'help'"),
        };
        Ok(cmd)
    }
}

const HELP: &str = "\
enter, g  new color
r         copy rgb(r, g, b)
h         copy #rrggbb
q         quit";

pub fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.color.write_global();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = PresenterConfig {
        confirm_delay: Duration::from_millis(cli.delay),
    };
    let clipboard = ClipboardWorker::spawn(SystemClipboard::open);
    let mut presenter = match cli.seed {
        Some(seed) => ColorPresenter::with_seed(seed, clipboard, config),
        None => ColorPresenter::new(clipboard, config),
    };
    if let Some(color) = cli.initial {
        presenter.show(color);
    }

    if cli.once || cli.copy.is_some() || !io::stdin().is_terminal() {
        run_once(presenter, cli.copy, cli.quiet)
    } else {
        run_interactive(presenter, cli.quiet)
    }
}

fn print_state(presenter: &ColorPresenter, quiet: bool) {
    if quiet {
        println!("{:#}", presenter.state());
    } else {
        println!("{}", presenter.state());
    }
}

fn report_error(presenter: &mut ColorPresenter) -> bool {
    match presenter.take_error() {
        Some(err) => {
            eprintln!("{}: {err}", "error".red());
            true
        }
        None => false,
    }
}

fn run_once(mut presenter: ColorPresenter, copy: Option<Repr>, quiet: bool) -> anyhow::Result<()> {
    if let Some(kind) = copy {
        presenter.copy(kind);
        presenter.flush();
    }
    print_state(&presenter, quiet);
    let failed = report_error(&mut presenter);
    presenter.close();
    if failed {
        anyhow::bail!("could not copy the color");
    }
    Ok(())
}

const PROMPT: &str = "> ";

/// Cursor up one row and clear it: the banner line sits right above the prompt
const ERASE_BANNER: &str = "\x1b[1A\x1b[2K";

/// Erases the banner line when its deadline passes while the editor waits
/// for input
struct HideTimer {
    deadlines: Option<Sender<Option<Instant>>>,
    handle: Option<JoinHandle<()>>,
}

impl HideTimer {
    fn spawn<P>(printer: P) -> Self
    where
        P: ExternalPrinter + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || run_hide_timer(rx, printer));
        Self {
            deadlines: Some(tx),
            handle: Some(handle),
        }
    }

    /// Erase the banner at `deadline`, replacing any pending erase
    fn arm(&self, deadline: Instant) {
        self.send(Some(deadline));
    }

    /// The banner line is no longer right above the prompt
    fn disarm(&self) {
        self.send(None);
    }

    fn send(&self, deadline: Option<Instant>) {
        if let Some(tx) = &self.deadlines {
            if tx.send(deadline).is_err() {
                log::debug!("hide timer stopped");
            }
        }
    }
}

impl Drop for HideTimer {
    fn drop(&mut self) {
        self.deadlines = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("hide timer panicked");
            }
        }
    }
}

fn run_hide_timer<P: ExternalPrinter>(deadlines: Receiver<Option<Instant>>, mut printer: P) {
    let mut pending: Option<Instant> = None;
    loop {
        let next = match pending {
            Some(deadline) => {
                deadlines.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => deadlines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match next {
            Ok(deadline) => pending = deadline,
            Err(RecvTimeoutError::Timeout) => {
                pending = None;
                log::trace!("banner expired, erasing it");
                if let Err(err) = printer.print(ERASE_BANNER.to_string()) {
                    log::debug!("could not erase the banner: {err}");
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn run_interactive(mut presenter: ColorPresenter, quiet: bool) -> anyhow::Result<()> {
    let mut rl = rustyline::DefaultEditor::new().context("failed to open the line editor")?;
    let timer = match rl.create_external_printer() {
        Ok(printer) => Some(HideTimer::spawn(printer)),
        Err(err) => {
            log::debug!("no external printer, the banner will not hide by itself: {err}");
            None
        }
    };

    println!("{}", HELP.dimmed());
    print_state(&presenter, quiet);

    loop {
        presenter.poll(Instant::now());
        report_error(&mut presenter);

        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("failed to read the command"),
        };
        // anything printed from here on pushes the banner line out of place
        if let Some(timer) = &timer {
            timer.disarm();
        }
        if !line.trim().is_empty() {
            if let Err(err) = rl.add_history_entry(line.as_str()) {
                log::debug!("could not add {line:?} to the history: {err}");
            }
        }

        let cmd = match line.parse::<Command>() {
            Ok(cmd) => cmd,
            Err(err) => {
                eprintln!("{}: {err}", "error".red());
                continue;
            }
        };
        log::trace!("command {cmd:?}");

        match cmd {
            Command::Generate => {
                presenter.generate();
                print_state(&presenter, quiet);
            }
            Command::Copy(kind) => {
                presenter.copy(kind);
                // nothing else to do until the write lands
                presenter.flush();
                report_error(&mut presenter);
                let banner = presenter.state().banner();
                if let Some(deadline) = banner.deadline() {
                    println!("{banner}");
                    if let Some(timer) = &timer {
                        timer.arm(deadline);
                    }
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    drop(timer);
    presenter.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct ChannelPrinter(Sender<String>);

    impl ExternalPrinter for ChannelPrinter {
        fn print(&mut self, msg: String) -> rustyline::Result<()> {
            let _ = self.0.send(msg);
            Ok(())
        }
    }

    fn timer() -> (HideTimer, Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        (HideTimer::spawn(ChannelPrinter(tx)), rx)
    }

    #[test_case("" => Command::Generate ; "empty")]
    #[test_case(" g " => Command::Generate ; "short generate")]
    #[test_case("rgb" => Command::Copy(Repr::Rgb) ; "rgb")]
    #[test_case("copy-hex" => Command::Copy(Repr::Hex) ; "hex")]
    #[test_case("q" => Command::Quit ; "quit")]
    #[test_case("paint" => panics "unknown command" ; "unknown")]
    fn command(s: &str) -> Command {
        s.parse().unwrap()
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "rcolor",
            "--seed",
            "9",
            "--initial",
            "rgb(12, 200, 5)",
            "--copy",
            "hex",
        ])
        .unwrap();
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.initial, Some(Color::new(12, 200, 5)));
        assert_eq!(cli.copy, Some(Repr::Hex));
        assert_eq!(cli.delay, 1000);
    }

    #[test]
    fn banner_erased_at_deadline() {
        let (timer, printed) = timer();
        let armed = Instant::now();
        timer.arm(armed + Duration::from_millis(50));

        let msg = printed.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(msg, ERASE_BANNER);
        assert!(Instant::now() >= armed + Duration::from_millis(50));
        // only once per deadline
        assert!(printed.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn disarm_cancels_erase() {
        let (timer, printed) = timer();
        timer.arm(Instant::now() + Duration::from_millis(50));
        timer.disarm();
        assert!(printed.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn rearm_moves_deadline() {
        let (timer, printed) = timer();
        let armed = Instant::now();
        timer.arm(armed + Duration::from_millis(20));
        timer.arm(armed + Duration::from_millis(400));

        let msg = printed.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(msg, ERASE_BANNER);
        assert!(Instant::now() >= armed + Duration::from_millis(400));
    }
}
