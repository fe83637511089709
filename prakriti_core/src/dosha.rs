use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three constitutional categories.
///
/// Declaration order is the tie-break priority: vata > pitta > kapha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dosha {
    Vata,
    Pitta,
    Kapha,
}

impl Dosha {
    /// All categories in tie-break priority order.
    pub const ALL: [Dosha; 3] = [Dosha::Vata, Dosha::Pitta, Dosha::Kapha];

    pub fn as_str(self) -> &'static str {
        match self {
            Dosha::Vata => "vata",
            Dosha::Pitta => "pitta",
            Dosha::Kapha => "kapha",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Category named by a `*_vata` / `*_pitta` / `*_kapha` tag, if any.
    ///
    /// The bare category name is not a suffix tag; `"_vata"` alone is.
    pub fn from_suffix(trait_name: &str) -> Option<Dosha> {
        Dosha::ALL.into_iter().find(|d| {
            trait_name
                .strip_suffix(d.as_str())
                .is_some_and(|head| head.ends_with('_'))
        })
    }
}

impl fmt::Display for Dosha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dosha {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vata" => Ok(Dosha::Vata),
            "pitta" => Ok(Dosha::Pitta),
            "kapha" => Ok(Dosha::Kapha),
            _ => Err(()),
        }
    }
}

/// Per-category shares. Sums to 1.0 except where built from raw accumulators.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub vata: f64,
    pub pitta: f64,
    pub kapha: f64,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl Distribution {
    /// Fixed near-uniform distribution used when nothing usable was answered.
    pub const FALLBACK: Distribution = Distribution {
        vata: 0.33,
        pitta: 0.33,
        kapha: 0.34,
    };

    pub const ZERO: Distribution = Distribution {
        vata: 0.0,
        pitta: 0.0,
        kapha: 0.0,
    };

    pub fn new(vata: f64, pitta: f64, kapha: f64) -> Self {
        Self { vata, pitta, kapha }
    }

    #[inline]
    pub fn get(&self, d: Dosha) -> f64 {
        match d {
            Dosha::Vata => self.vata,
            Dosha::Pitta => self.pitta,
            Dosha::Kapha => self.kapha,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, d: Dosha) -> &mut f64 {
        match d {
            Dosha::Vata => &mut self.vata,
            Dosha::Pitta => &mut self.pitta,
            Dosha::Kapha => &mut self.kapha,
        }
    }

    #[inline]
    pub fn add(&mut self, d: Dosha, amount: f64) {
        *self.get_mut(d) += amount;
    }

    pub fn sum(&self) -> f64 {
        self.vata + self.pitta + self.kapha
    }

    /// True when every share is finite, non-negative, and the shares sum to 1.
    pub fn is_normalized(&self, eps: f64) -> bool {
        Dosha::ALL
            .iter()
            .all(|&d| self.get(d).is_finite() && self.get(d) >= 0.0)
            && (self.sum() - 1.0).abs() <= eps
    }

    /// Divide by `total`. Returns `None` when `total` is not a positive finite number.
    pub fn normalized_by(&self, total: f64) -> Option<Distribution> {
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some(Distribution {
            vata: self.vata / total,
            pitta: self.pitta / total,
            kapha: self.kapha / total,
        })
    }

    /// Normalize by the sum of the shares themselves.
    pub fn renormalized(&self) -> Option<Distribution> {
        if Dosha::ALL.iter().any(|&d| !self.get(d).is_finite() || self.get(d) < 0.0) {
            return None;
        }
        self.normalized_by(self.sum())
    }

    /// Categories sorted by score, descending. Equal scores keep priority order.
    pub fn ranked(&self) -> [(Dosha, f64); 3] {
        let mut out = Dosha::ALL.map(|d| (d, self.get(d)));
        // sort_by is stable, so ties stay in vata > pitta > kapha order.
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }

    pub fn dominant(&self) -> Dosha {
        self.ranked()[0].0
    }

    /// Shares scaled to percent and rounded to `decimals` places.
    pub fn percent(&self, decimals: u32) -> Distribution {
        let scale = 10f64.powi(decimals.min(6) as i32);
        let r = |x: f64| (x * 100.0 * scale).round() / scale;
        Distribution {
            vata: r(self.vata),
            pitta: r(self.pitta),
            kapha: r(self.kapha),
        }
    }
}
