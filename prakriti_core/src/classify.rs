use std::fmt;

use serde::{Serialize, Serializer};

use crate::cfg::ScoringCfg;
use crate::dosha::{Distribution, Dosha};

/// Constitution type derived from a distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constitution {
    Single(Dosha),
    /// Top two categories within `dual_gap`; highest first.
    Dual(Dosha, Dosha),
    /// All three within `tridoshic_gap`.
    Tridoshic,
}

impl Constitution {
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Constitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constitution::Single(d) => write!(f, "{d}"),
            Constitution::Dual(a, b) => write!(f, "{a}-{b}"),
            Constitution::Tridoshic => f.write_str("tridoshic"),
        }
    }
}

impl Serialize for Constitution {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Classification {
    pub dominant: Dosha,
    pub secondary: Dosha,
    pub constitution: Constitution,
    /// Dominant category's share.
    pub confidence: f64,
}

/// Label a distribution. Rules are checked in order: tridoshic, dual, single.
pub fn classify(dist: &Distribution, cfg: &ScoringCfg) -> Classification {
    let [(top, s1), (second, s2), (_, s3)] = dist.ranked();

    let constitution = if s1 - s3 < cfg.tridoshic_gap {
        Constitution::Tridoshic
    } else if s1 - s2 < cfg.dual_gap {
        Constitution::Dual(top, second)
    } else {
        Constitution::Single(top)
    };

    Classification {
        dominant: top,
        secondary: second,
        constitution,
        confidence: s1.clamp(0.0, 1.0),
    }
}
