use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt;

/// Water Quality Index for a pH / turbidity (NTU) pair, in `0..=100`.
///
/// Total over every `f64`: out-of-domain and NaN inputs fall through to the
/// lowest sub-score of their band table. Range checks belong to the caller.
pub fn compute_wqi(ph: f64, turbidity: f64) -> u8 {
    let mean = (f64::from(ph_score(ph)) + f64::from(turbidity_score(turbidity))) / 2.0;
    // `f64::round` rounds half away from zero; the mean is never negative.
    mean.round().clamp(0.0, 100.0) as u8
}

pub fn ph_score(ph: f64) -> u8 {
    if (6.5..=8.5).contains(&ph) {
        100
    } else if (6.0..6.5).contains(&ph) || (ph > 8.5 && ph <= 9.0) {
        80
    } else if (5.5..6.0).contains(&ph) || (ph > 9.0 && ph <= 9.5) {
        60
    } else {
        40
    }
}

pub fn turbidity_score(turbidity: f64) -> u8 {
    if turbidity <= 1.0 {
        100
    } else if turbidity <= 5.0 {
        80
    } else if turbidity <= 10.0 {
        60
    } else if turbidity <= 25.0 {
        40
    } else {
        20
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl Band {
    pub const ALL: [Band; 5] = [
        Self::Excellent,
        Self::Good,
        Self::Fair,
        Self::Poor,
        Self::VeryPoor,
    ];

    pub fn for_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::Fair,
            25..=49 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }

    /// Marker color on the map.
    pub fn hex_color(self) -> &'static str {
        match self {
            Self::Excellent => "#22c55e",
            Self::Good => "#3b82f6",
            Self::Fair => "#eab308",
            Self::Poor => "#f97316",
            Self::VeryPoor => "#ef4444",
        }
    }

    pub fn colored(self) -> ColoredString {
        let label = self.label();
        match self {
            Self::Excellent => label.green().bold(),
            Self::Good => label.blue().bold(),
            Self::Fair => label.yellow().bold(),
            Self::Poor => label.truecolor(249, 115, 22).bold(),
            Self::VeryPoor => label.red().bold(),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Assessment {
    pub ph: f64,
    pub turbidity: f64,
    pub ph_score: u8,
    pub turbidity_score: u8,
    pub wqi: u8,
    pub band: Band,
    pub label: &'static str,
    pub color: &'static str,
}

impl Assessment {
    pub fn new(ph: f64, turbidity: f64) -> Self {
        let wqi = compute_wqi(ph, turbidity);
        let band = Band::for_score(wqi);
        Self {
            ph,
            turbidity,
            ph_score: ph_score(ph),
            turbidity_score: turbidity_score(turbidity),
            wqi,
            band,
            label: band.label(),
            color: band.hex_color(),
        }
    }
}
