use std::collections::HashMap;
use std::sync::OnceLock;

use crate::cfg::ScoringCfg;
use crate::dosha::{Distribution, Dosha};
use crate::error::ScoringError;

// ---------------------------------------------------------------------
// Affinity table: how a graded characteristic answer splits across the
// three categories, depending on which weight bucket it falls in.
// ---------------------------------------------------------------------

/// Weight bucket of a characteristic answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Low,
    Medium,
    High,
}

impl Bucket {
    /// Lower-inclusive thresholds: `[0, low)`, `[low, high)`, `[high, ..]`.
    #[inline]
    pub fn of(weight: f64, cfg: &ScoringCfg) -> Bucket {
        if weight < cfg.low_threshold {
            Bucket::Low
        } else if weight < cfg.high_threshold {
            Bucket::Medium
        } else {
            Bucket::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Low => "low",
            Bucket::Medium => "medium",
            Bucket::High => "high",
        }
    }
}

/// Share of one answer's weight that goes to each category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affinity {
    pub vata: f64,
    pub pitta: f64,
    pub kapha: f64,
}

impl Affinity {
    pub const fn new(vata: f64, pitta: f64, kapha: f64) -> Self {
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

    pub fn is_simplex(&self) -> bool {
        let v = [self.vata, self.pitta, self.kapha];
        v.iter().all(|x| x.is_finite() && *x >= 0.0) && (v.iter().sum::<f64>() - 1.0).abs() < 1e-9
    }

    pub fn as_distribution(&self) -> Distribution {
        Distribution::new(self.vata, self.pitta, self.kapha)
    }
}

/// Affinities for the three buckets of one characteristic trait.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraitAffinity {
    pub low: Affinity,
    pub medium: Affinity,
    pub high: Affinity,
}

impl TraitAffinity {
    pub const fn new(low: Affinity, medium: Affinity, high: Affinity) -> Self {
        Self { low, medium, high }
    }

    #[inline]
    pub fn for_bucket(&self, b: Bucket) -> &Affinity {
        match b {
            Bucket::Low => &self.low,
            Bucket::Medium => &self.medium,
            Bucket::High => &self.high,
        }
    }

    fn check(&self, trait_name: &str) -> Result<(), ScoringError> {
        for b in [Bucket::Low, Bucket::Medium, Bucket::High] {
            let a = self.for_bucket(b);
            if !a.is_simplex() {
                return Err(ScoringError::NotSimplex {
                    trait_name: trait_name.to_string(),
                    bucket: b.as_str(),
                    values: [a.vata, a.pitta, a.kapha],
                });
            }
        }
        Ok(())
    }
}

/// Characteristic trait name -> bucketed affinities.
#[derive(Clone, Debug, Default)]
pub struct AffinityTable {
    entries: HashMap<String, TraitAffinity>,
}

impl AffinityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide canonical table, built on first use.
    pub fn canonical() -> &'static AffinityTable {
        static TABLE: OnceLock<AffinityTable> = OnceLock::new();
        TABLE.get_or_init(default_affinity_table)
    }

    /// Add or replace an entry. Rejects non-simplex affinities and category names.
    pub fn insert(
        &mut self,
        trait_name: impl Into<String>,
        affinity: TraitAffinity,
    ) -> Result<(), ScoringError> {
        let name = trait_name.into().trim().to_ascii_lowercase();
        if name.parse::<Dosha>().is_ok() {
            return Err(ScoringError::ReservedTrait(name));
        }
        affinity.check(&name)?;
        self.entries.insert(name, affinity);
        Ok(())
    }

    pub fn get(&self, trait_name: &str) -> Option<&TraitAffinity> {
        self.entries.get(trait_name)
    }

    pub fn contains(&self, trait_name: &str) -> bool {
        self.entries.contains_key(trait_name)
    }

    /// Look up the affinity a `(trait, weight)` answer contributes with.
    pub fn lookup(&self, trait_name: &str, weight: f64, cfg: &ScoringCfg) -> Option<(Bucket, &Affinity)> {
        let entry = self.entries.get(trait_name)?;
        let bucket = Bucket::of(weight, cfg);
        Some((bucket, entry.for_bucket(bucket)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted trait names.
    pub fn traits(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        for (name, entry) in &self.entries {
            entry.check(name)?;
        }
        Ok(())
    }

    fn put(&mut self, trait_name: &str, affinity: TraitAffinity) {
        self.entries.insert(trait_name.to_string(), affinity);
    }
}

// Bucket flavors. Every characteristic question is phrased so that the low end
// of the answer scale describes the vata presentation, the middle the pitta
// presentation, and the high end the kapha presentation.
const VATA_LEANING: Affinity = Affinity::new(0.8, 0.1, 0.1);
const PITTA_LEANING: Affinity = Affinity::new(0.1, 0.8, 0.1);
const KAPHA_LEANING: Affinity = Affinity::new(0.1, 0.1, 0.8);

const GRADED: TraitAffinity = TraitAffinity::new(VATA_LEANING, PITTA_LEANING, KAPHA_LEANING);

/// Build the canonical characteristic table.
pub fn default_affinity_table() -> AffinityTable {
    let mut m = AffinityTable::new();

    // Physical characteristics.
    // body_frame: thin/light | medium/muscular | large/solid
    m.put("body_frame", GRADED);
    // weight_gain: difficult to gain | moderate gain/loss | gains easily
    m.put("weight_gain", GRADED);
    // skin: dry/rough | warm/reddish | oily/smooth
    m.put("skin", GRADED);

    // Mental characteristics.
    // mind_nature: quick/adaptable | sharp/focused | calm/steady
    m.put("mind_nature", GRADED);
    // memory: learns and forgets quickly | sharp and clear | slow to learn, never forgets
    m.put("memory", GRADED);

    // Physiological patterns.
    // sleep: light/interrupted | moderate | deep/long
    m.put("sleep", GRADED);
    // digestion: irregular | strong/sharp | slow but steady
    m.put("digestion", GRADED);
    // appetite: variable | strong | consistent
    m.put("appetite", GRADED);

    // Energy and activity.
    // energy: variable | intense | sustained
    m.put("energy", GRADED);
    // activity: quick/changing | focused/driven | slow/methodical
    m.put("activity", GRADED);

    // Response patterns.
    // stress_response: anxiety | irritation | withdrawal
    m.put("stress_response", GRADED);
    // climate_preference: prefers warm | prefers cool | prefers moderate
    m.put("climate_preference", GRADED);

    m
}
