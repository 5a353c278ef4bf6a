//! Four-state status palette shared by order items, warehouse items and
//! warehouse tabs.

use serde::{Deserialize, Serialize};

/// A status marker toggled by the user. Serialized as the CSS color the
/// board paints it with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusColor {
    /// No status.
    #[default]
    #[serde(rename = "white")]
    Neutral,
    /// First status step.
    #[serde(rename = "#FF69B4")]
    Pink,
    /// Second status step.
    #[serde(rename = "#FFA500")]
    Orange,
    /// Final status step.
    #[serde(rename = "#90EE90")]
    Green,
    /// A stored value outside the palette.
    #[serde(other)]
    Unknown,
}

/// Palette in cycle order.
pub const PALETTE: [StatusColor; 4] = [
    StatusColor::Neutral,
    StatusColor::Pink,
    StatusColor::Orange,
    StatusColor::Green,
];

impl StatusColor {
    /// CSS color string.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Neutral => "white",
            Self::Pink => "#FF69B4",
            Self::Orange => "#FFA500",
            Self::Green => "#90EE90",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css())
    }
}

/// Next status in the cycle `neutral → pink → orange → green → neutral`.
///
/// Values outside the palette restart the cycle at neutral.
#[must_use]
pub fn cycle_color(current: StatusColor) -> StatusColor {
    PALETTE
        .iter()
        .position(|&c| c == current)
        .map_or(StatusColor::Neutral, |idx| PALETTE[(idx + 1) % PALETTE.len()])
}
