//! Random colors, shown as a swatch and copied as text
//!
//! A [`ColorPresenter`] samples a color, keeps its `rgb(r, g, b)` and
//! `#rrggbb` texts on display and copies either one to a [`Clipboard`]
//! through a background [`ClipboardWorker`]. A successful copy shows a
//! confirmation [`Banner`] for a while.
//!
//! Time is passed in explicitly (see [`ColorPresenter::poll`]), so the
//! presenter never sleeps and can be driven by any event loop.
//!
//! All [`Display`](std::fmt::Display) implementations of the crate *may*
//! output ANSI color codes. Use something like
//! [anstream](https://docs.rs/anstream/) if you dont want colors.

pub mod banner;
pub mod clipboard;
pub mod color;
pub mod presenter;

pub(crate) use rand_pcg::Pcg64 as Pcg;

pub use banner::Banner;
pub use clipboard::{Clipboard, ClipboardError, ClipboardWorker};
pub use color::{Color, ColorParseError, Repr};
pub use presenter::{ColorPresenter, DisplayState, PresenterConfig};

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}
pub(crate) use regex;

/// Presenter error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A copy did not reach the clipboard
    #[error("copying {kind}: {source}")]
    Copy {
        kind: Repr,
        #[source]
        source: ClipboardError,
    },
    #[error("clipboard worker stopped before finishing")]
    ClipboardClosed,
}
