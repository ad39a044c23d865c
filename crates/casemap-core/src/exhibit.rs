use serde::Serialize;
use std::fmt;

/// Widening applied to the aerial view beyond a tight fit of the subject extent.
pub const AERIAL_SCALE_FACTOR: f64 = 2.5;
/// Widening applied to the overlay view beyond a tight fit of the buffer extent.
pub const OVERLAY_SCALE_FACTOR: f64 = 1.5;

/// The two exhibits produced per case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Exhibit {
    /// Aerial context, framed on the subject property.
    Aerial,
    /// Zoning/overlay, framed on the notification buffer.
    Overlay,
}

impl Exhibit {
    pub const ALL: [Exhibit; 2] = [Exhibit::Aerial, Exhibit::Overlay];

    pub const fn scale_factor(self) -> f64 {
        match self {
            Exhibit::Aerial => AERIAL_SCALE_FACTOR,
            Exhibit::Overlay => OVERLAY_SCALE_FACTOR,
        }
    }

    /// Artifact filename suffix, appended to the case token.
    pub const fn suffix(self) -> &'static str {
        match self {
            Exhibit::Aerial => "_Aerial",
            Exhibit::Overlay => "_Overlay",
        }
    }
}

impl fmt::Display for Exhibit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Exhibit::Aerial => "aerial",
            Exhibit::Overlay => "overlay",
        })
    }
}
