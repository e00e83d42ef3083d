//! Video resolution tokens
//!
//! A resolution is given either as a named preset (`QVGA`, `VGA`, `HD`,
//! `FHD`, `4K`) or as `WIDTHxHEIGHT`. Two entry points exist:
//!
//! - [`resolve`] never fails. Unknown tokens fall back to the 16x16 safe
//!   minimum and every axis is clamped to at least 16.
//! - [`validate_token`] is the strict check the command line runs before
//!   a token is accepted at all.
//!
//! ```rust
//! use vidlink_client_core::resolution::{resolve, Resolution};
//!
//! assert_eq!(resolve("HD"), Resolution::new(1280, 720));
//! assert_eq!(resolve("800x600"), Resolution::new(800, 600));
//! assert_eq!(resolve("garbage"), Resolution::MIN);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Smallest edge the capture pipeline accepts
pub const MIN_EDGE: u32 = 16;

const PRESETS: &[(&str, Resolution)] = &[
    ("QVGA", Resolution::new(320, 240)),
    ("VGA", Resolution::new(640, 480)),
    ("HD", Resolution::new(1280, 720)),
    ("FHD", Resolution::new(1920, 1080)),
    ("4K", Resolution::new(3840, 2160)),
];

/// A concrete capture size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 16x16, returned for tokens that cannot be interpreted
    pub const MIN: Resolution = Resolution::new(MIN_EDGE, MIN_EDGE);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, resolution)| *resolution)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Map a resolution token to a concrete size.
///
/// Tokens without an `x` separator that are not presets resolve to
/// [`Resolution::MIN`]. Each side of `WxH` is parsed leniently (leading
/// digits only, anything else reads as 0) and clamped to [`MIN_EDGE`].
pub fn resolve(token: &str) -> Resolution {
    if let Some(resolution) = Resolution::preset(token) {
        return resolution;
    }

    let Some((width, height)) = token.split_once('x') else {
        return Resolution::MIN;
    };

    Resolution::new(
        leading_int(width).max(MIN_EDGE),
        leading_int(height).max(MIN_EDGE),
    )
}

/// Strict token check: a preset, or positive integers without leading
/// zeros on both sides of a single `x`.
pub fn validate_token(token: &str) -> ClientResult<()> {
    if Resolution::preset(token).is_some() {
        return Ok(());
    }

    let valid = token
        .split_once('x')
        .map(|(width, height)| is_positive_int(width) && is_positive_int(height))
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ClientError::config(format!(
            "invalid resolution '{}': Must be one of QVGA, VGA, HD, FHD, 4K, or [WIDTH]x[HEIGHT].",
            token
        )))
    }
}

fn is_positive_int(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some('1'..='9')) && chars.all(|c| c.is_ascii_digit())
}

// Leading whitespace and sign are accepted, parsing stops at the first
// non-digit. Negative values and overflow read as 0 so the clamp applies.
fn leading_int(s: &str) -> u32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative {
        return 0;
    }
    digits[..end].parse().unwrap_or(0)
}
