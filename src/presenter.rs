//! The color presenter
//!
//! Owns everything the user sees: the current color, its two texts and the
//! copy confirmation. All of it lives in one [`ColorPresenter`] driven from a
//! single thread. Clipboard writes are the only thing that happens elsewhere.

use std::fmt::Display;
use std::time::{Duration, Instant};

use owo_colors::{DynColors, OwoColorize};
use rand::SeedableRng;

use crate::{
    banner::Banner,
    clipboard::{ClipboardError, ClipboardWorker, Completion, Request},
    color::{Color, Repr},
    Error, Pcg,
};

/// Default time the copy confirmation stays visible
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterConfig {
    /// How long the banner stays after a successful copy
    pub confirm_delay: Duration,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            confirm_delay: DEFAULT_CONFIRM_DELAY,
        }
    }
}

/// What is on screen
///
/// The [`Display`] impl draws the whole surface: a swatch of the background
/// color, both texts and the banner. The [alternate
/// modifier](std::fmt#sign0) only prints the two texts, one per line.
#[derive(Debug, Clone)]
pub struct DisplayState {
    color: Color,
    rgb_text: String,
    hex_text: String,
    banner: Banner,
    last_error: Option<Error>,
}

impl DisplayState {
    fn new(color: Color) -> Self {
        Self {
            color,
            rgb_text: color.to_rgb(),
            hex_text: color.to_hex(),
            banner: Banner::Hidden,
            last_error: None,
        }
    }

    /// Background color
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn rgb_text(&self) -> &str {
        &self.rgb_text
    }

    pub fn hex_text(&self) -> &str {
        &self.hex_text
    }

    /// Displayed text of the given kind
    pub fn text(&self, kind: Repr) -> &str {
        match kind {
            Repr::Rgb => &self.rgb_text,
            Repr::Hex => &self.hex_text,
        }
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    /// Last failed copy, cleared by the next successful one
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }
}

const SWATCH_WIDTH: usize = 32;
const SWATCH_ROWS: usize = 3;

impl Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "{}", self.rgb_text)?;
            return write!(f, "{}", self.hex_text);
        }

        let Color { r, g, b } = self.color;
        let bg = DynColors::Rgb(r, g, b);
        let blank = " ".repeat(SWATCH_WIDTH);
        for _ in 0..SWATCH_ROWS {
            writeln!(f, "{}", blank.on_color(bg))?;
        }
        writeln!(f, "{} {}", "rgb".dimmed(), self.rgb_text.bold())?;
        write!(f, "{} {}", "hex".dimmed(), self.hex_text.bold())?;
        if self.banner.is_visible() {
            write!(f, "\n{}", self.banner)?;
        }
        Ok(())
    }
}

/// Shows random colors and copies them
///
/// Building one is the initial load: the first color is already sampled and
/// rendered. Dropping it (or [`close`](Self::close)) stops the clipboard
/// worker.
#[derive(Debug)]
pub struct ColorPresenter {
    rng: Pcg,
    config: PresenterConfig,
    clipboard: ClipboardWorker,
    state: DisplayState,
    in_flight: usize,
}

impl ColorPresenter {
    /// Create a presenter
    ///
    /// Seed is autogenerated from entropy.
    pub fn new(clipboard: ClipboardWorker, config: PresenterConfig) -> Self {
        Self::from_rng(Pcg::from_entropy(), clipboard, config)
    }

    /// Create a presenter with a seed
    pub fn with_seed(seed: u64, clipboard: ClipboardWorker, config: PresenterConfig) -> Self {
        Self::from_rng(Pcg::seed_from_u64(seed), clipboard, config)
    }

    fn from_rng(mut rng: Pcg, clipboard: ClipboardWorker, config: PresenterConfig) -> Self {
        let color = Color::random(&mut rng);
        log::debug!("initial color {color:#}");
        Self {
            rng,
            config,
            clipboard,
            state: DisplayState::new(color),
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Writes dispatched and not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Sample a new color and display it
    pub fn generate(&mut self) -> Color {
        let color = Color::random(&mut self.rng);
        log::debug!("generated {color:#}");
        self.show(color);
        color
    }

    /// Display the given color
    ///
    /// Both texts are rebuilt, the banner is left alone.
    pub fn show(&mut self, color: Color) {
        self.state.color = color;
        self.state.rgb_text = color.to_rgb();
        self.state.hex_text = color.to_hex();
    }

    /// Copy the displayed text of `kind`
    ///
    /// Returns right away. The banner appears when the write completes, which
    /// is picked up by [`poll`](Self::poll) or [`flush`](Self::flush).
    pub fn copy(&mut self, kind: Repr) {
        let text = self.state.text(kind).to_string();
        log::debug!("copying {kind} {text:?}");
        match self.clipboard.write(Request { kind, text }) {
            Ok(()) => self.in_flight += 1,
            Err(e) => self.fail(kind, e),
        }
    }

    /// Apply finished writes and expire the banner, without blocking
    ///
    /// Returns true if anything visible changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Some(completion) = self.clipboard.try_completion() {
            changed |= self.complete(completion, now);
        }
        changed | self.state.banner.expire(now)
    }

    /// Like [`poll`](Self::poll), but waits for every pending write first
    ///
    /// Each completion is applied at the time it arrives, so the banner
    /// timer starts when the write lands, not when `flush` was called.
    pub fn flush(&mut self) -> bool {
        self.flush_with(Instant::now)
    }

    /// [`flush`](Self::flush) with a caller supplied clock
    ///
    /// `clock` is read after every completion is received and once more
    /// for the final expiry check.
    pub fn flush_with(&mut self, mut clock: impl FnMut() -> Instant) -> bool {
        let mut changed = false;
        while self.in_flight > 0 {
            match self.clipboard.wait_completion() {
                Some(completion) => changed |= self.complete(completion, clock()),
                None => {
                    log::warn!("{} clipboard writes lost", self.in_flight);
                    self.in_flight = 0;
                    self.state.last_error = Some(Error::ClipboardClosed);
                    changed = true;
                }
            }
        }
        changed | self.poll(clock())
    }

    /// When the banner has to be hidden, if it is shown
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.banner.deadline()
    }

    /// Take the last copy error, so it is reported once
    pub fn take_error(&mut self) -> Option<Error> {
        self.state.last_error.take()
    }

    /// Stop the clipboard worker
    ///
    /// Queued writes still finish, but their banners are not shown.
    pub fn close(mut self) {
        self.clipboard.shutdown();
    }

    fn complete(&mut self, completion: Completion, now: Instant) -> bool {
        let Completion { kind, result } = completion;
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(()) => {
                self.state.last_error = None;
                self.state.banner.show(kind, now, self.config.confirm_delay);
            }
            Err(e) => self.fail(kind, e),
        }
        true
    }

    fn fail(&mut self, kind: Repr, source: ClipboardError) {
        log::warn!("copying {kind} failed: {source}");
        self.state.last_error = Some(Error::Copy { kind, source });
    }
}
