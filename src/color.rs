//! Color sampling and its text representations

use std::{fmt::Display, str::FromStr};

use owo_colors::{DynColors, OwoColorize};
use rand::Rng;

use crate::regex;

/// An opaque 8-bit RGB color
///
/// Channels are `u8`, so every value is in `0..=255` by construction. Colors
/// are never mutated, a new one is sampled instead.
///
/// The [`Display`] impl draws a swatch with the hex code on top. The
/// [alternate modifier](std::fmt#sign0) only prints the hex code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sample each channel independently and uniformly
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let r: u8 = rng.gen();
        let g: u8 = rng.gen();
        let b: u8 = rng.gen();
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// `#rrggbb`, lowercase
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(7);
        s.push('#');
        for c in self.channels() {
            let [h, l] = hex_digits(c);
            s.push(h as char);
            s.push(l as char);
        }
        s
    }

    /// `rgb(r, g, b)`, decimal
    pub fn to_rgb(&self) -> String {
        let Self { r, g, b } = self;
        format!("rgb({r}, {g}, {b})")
    }

    /// Text representation of the given kind
    pub fn repr(&self, kind: Repr) -> String {
        match kind {
            Repr::Rgb => self.to_rgb(),
            Repr::Hex => self.to_hex(),
        }
    }

    /// Whether dark text reads better than light text on this color
    pub fn is_light(&self) -> bool {
        let luma = 299 * self.r as u32 + 587 * self.g as u32 + 114 * self.b as u32;
        luma >= 128_000
    }
}

const HEX: [u8; 16] = *b"0123456789abcdef";

fn hex_digits(b: u8) -> [u8; 2] {
    [HEX[(b >> 4) as usize], HEX[(b & 0x0f) as usize]]
}

/// Two lowercase, zero padded hex digits for a channel
///
/// ```
/// use rng_color::color::channel_hex;
/// assert_eq!(channel_hex(5), "05");
/// assert_eq!(channel_hex(255), "ff");
/// ```
pub fn channel_hex(value: u8) -> String {
    let [h, l] = hex_digits(value);
    [h as char, l as char].iter().collect()
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = self.to_hex();
        if f.alternate() {
            return f.write_str(&hex);
        }
        let bg = DynColors::Rgb(self.r, self.g, self.b);
        let label = format!(" {hex} ");
        if self.is_light() {
            write!(f, "{}", label.black().on_color(bg))
        } else {
            write!(f, "{}", label.white().on_color(bg))
        }
    }
}

/// Error from [`Color::from_str`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("the input is not a color, expected #rrggbb or rgb(r, g, b)")]
    NoMatch,
    #[error("{channel} channel out of range: {value}")]
    OutOfRange { channel: &'static str, value: String },
}

const CHANNELS: [&str; 3] = ["red", "green", "blue"];

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match parse_hex(s) {
            Err(ColorParseError::NoMatch) => {}
            other => return other,
        }
        parse_rgb(s)
    }
}

fn parse_hex(s: &str) -> Result<Color, ColorParseError> {
    let re = regex!(r"\A#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})\z");
    let caps = re.captures(s).ok_or(ColorParseError::NoMatch)?;

    let mut channels = [0u8; 3];
    for (i, c) in channels.iter_mut().enumerate() {
        let digits = &caps[i + 1];
        *c = u8::from_str_radix(digits, 16).map_err(|_| ColorParseError::OutOfRange {
            channel: CHANNELS[i],
            value: digits.to_string(),
        })?;
    }
    let [r, g, b] = channels;
    Ok(Color { r, g, b })
}

fn parse_rgb(s: &str) -> Result<Color, ColorParseError> {
    let re = regex!(r"\A(?i:rgb)\s*\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*\)\z");
    let caps = re.captures(s).ok_or(ColorParseError::NoMatch)?;

    let mut channels = [0u8; 3];
    for (i, c) in channels.iter_mut().enumerate() {
        let digits = &caps[i + 1];
        *c = digits
            .parse::<u8>()
            .map_err(|_| ColorParseError::OutOfRange {
                channel: CHANNELS[i],
                value: digits.to_string(),
            })?;
    }
    let [r, g, b] = channels;
    Ok(Color { r, g, b })
}

/// Which text representation of a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repr {
    /// `rgb(r, g, b)`
    Rgb,
    /// `#rrggbb`
    Hex,
}

impl Repr {
    /// Name shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Repr::Rgb => "RGB",
            Repr::Hex => "Hex",
        }
    }
}

impl Display for Repr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error from [`Repr::from_str`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown representation {0:?}, expected 'rgb' or 'hex'")]
pub struct ReprParseError(String);

impl FromStr for Repr {
    type Err = ReprParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb" => Ok(Repr::Rgb),
            "hex" => Ok(Repr::Hex),
            _ => Err(ReprParseError(s.to_string())),
        }
    }
}
