//! Copy confirmation banner
//!
//! There is a single hide timer. Showing the banner again replaces the
//! pending expiry instead of adding a second one, so the last copy wins.

use std::fmt::Display;
use std::time::{Duration, Instant};

use owo_colors::OwoColorize;

use crate::color::Repr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Banner {
    #[default]
    Hidden,
    Visible {
        kind: Repr,
        expires_at: Instant,
    },
}

impl Banner {
    /// Show the banner for `kind`, hiding it `delay` after `now`
    pub fn show(&mut self, kind: Repr, now: Instant, delay: Duration) {
        let expires_at = now + delay;
        if let Banner::Visible { kind: old, .. } = self {
            log::trace!("banner {old} -> {kind}, timer reset");
        } else {
            log::trace!("banner shown for {kind}");
        }
        *self = Banner::Visible { kind, expires_at };
    }

    /// Hide the banner if its timer elapsed. Returns true if it was hidden now.
    pub fn expire(&mut self, now: Instant) -> bool {
        match *self {
            Banner::Visible { expires_at, .. } if now >= expires_at => {
                log::trace!("banner hidden");
                *self = Banner::Hidden;
                true
            }
            _ => false,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, Banner::Visible { .. })
    }

    /// Representation named by the banner, if shown
    pub fn kind(&self) -> Option<Repr> {
        match self {
            Banner::Hidden => None,
            Banner::Visible { kind, .. } => Some(*kind),
        }
    }

    /// When the pending hide fires
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Banner::Hidden => None,
            Banner::Visible { expires_at, .. } => Some(*expires_at),
        }
    }
}

/// Empty when hidden
impl Display for Banner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Banner::Hidden => Ok(()),
            Banner::Visible { kind, .. } => {
                write!(f, "{} copied to clipboard", kind.label().green().bold())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(1000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn starts_hidden() {
        let b = Banner::default();
        assert!(!b.is_visible());
        assert_eq!(b.kind(), None);
        assert_eq!(b.deadline(), None);
        assert_eq!(b.to_string(), "");
    }

    #[test]
    fn hides_after_delay() {
        let t0 = Instant::now();
        let mut b = Banner::default();
        b.show(Repr::Rgb, t0, DELAY);
        assert_eq!(b.kind(), Some(Repr::Rgb));
        assert_eq!(b.deadline(), Some(t0 + DELAY));

        assert!(!b.expire(t0 + ms(999)));
        assert!(b.is_visible());
        assert!(b.expire(t0 + ms(1000)));
        assert!(!b.is_visible());
        assert!(!b.expire(t0 + ms(5000)));
    }

    #[test]
    fn last_show_wins() {
        let t0 = Instant::now();
        let mut b = Banner::default();
        b.show(Repr::Rgb, t0, DELAY);
        b.show(Repr::Hex, t0 + ms(400), DELAY);

        assert_eq!(b.kind(), Some(Repr::Hex));
        // the first timer would have fired here
        assert!(!b.expire(t0 + ms(1000)));
        assert_eq!(b.kind(), Some(Repr::Hex));
        assert!(b.expire(t0 + ms(1400)));
        assert_eq!(b.kind(), None);
    }

    #[test]
    fn text_names_kind() {
        let mut b = Banner::default();
        b.show(Repr::Hex, Instant::now(), DELAY);
        let s = b.to_string();
        assert!(s.contains("Hex"));
        assert!(s.ends_with("copied to clipboard"));
    }
}
