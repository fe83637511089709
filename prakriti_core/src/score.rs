use serde::Serialize;
use tracing::{debug, trace};

use crate::affinity::{Affinity, AffinityTable, Bucket};
use crate::answer::TraitPair;
use crate::cfg::ScoringCfg;
use crate::dosha::{Distribution, Dosha};

/// How one trait contributes to the accumulator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraitRoute<'t> {
    /// `vata` / `pitta` / `kapha`: the whole weight goes to that category.
    Direct(Dosha),
    /// Known characteristic: the weight is split by the bucket's affinity.
    Characteristic(Bucket, &'t Affinity),
    /// `*_vata` / `*_pitta` / `*_kapha`: the whole weight goes to the tagged category.
    Tagged(Dosha),
    Unknown,
}

/// Decide how a normalized trait key is scored. Direct names win over table
/// entries, and table entries win over suffix tags.
pub fn route<'t>(trait_name: &str, weight: f64, table: &'t AffinityTable, cfg: &ScoringCfg) -> TraitRoute<'t> {
    if let Ok(d) = trait_name.parse::<Dosha>() {
        return TraitRoute::Direct(d);
    }
    if let Some((bucket, aff)) = table.lookup(trait_name, weight, cfg) {
        return TraitRoute::Characteristic(bucket, aff);
    }
    match Dosha::from_suffix(trait_name) {
        Some(d) => TraitRoute::Tagged(d),
        None => TraitRoute::Unknown,
    }
}

/// Heuristic scoring output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HeuristicScore {
    pub distribution: Distribution,
    /// Sum of the weights of every recognized pair.
    pub total_weight: f64,
    /// Number of recognized pairs with non-zero weight.
    pub usable: usize,
}

impl HeuristicScore {
    /// True when nothing usable was answered and `distribution` is the fixed fallback.
    pub fn is_fallback(&self) -> bool {
        self.total_weight <= 0.0
    }
}

/// Accumulate pairs into a normalized distribution.
///
/// Accumulation is commutative: pair order never changes the result.
pub fn score_pairs(pairs: &[TraitPair], table: &AffinityTable, cfg: &ScoringCfg) -> HeuristicScore {
    let mut acc = Distribution::ZERO;
    let mut total_weight = 0.0_f64;
    let mut usable = 0_usize;

    for p in pairs {
        let w = p.weight;
        if !w.is_finite() || w < 0.0 {
            continue;
        }
        match route(&p.trait_name, w, table, cfg) {
            TraitRoute::Direct(d) | TraitRoute::Tagged(d) => {
                acc.add(d, w);
                trace!(index = p.index, trait_name = %p.trait_name, weight = w, dosha = %d, "whole-weight vote");
            }
            TraitRoute::Characteristic(bucket, aff) => {
                for d in Dosha::ALL {
                    acc.add(d, aff.get(d) * w);
                }
                trace!(
                    index = p.index,
                    trait_name = %p.trait_name,
                    weight = w,
                    bucket = bucket.as_str(),
                    "characteristic contribution"
                );
            }
            TraitRoute::Unknown => {
                trace!(index = p.index, trait_name = %p.trait_name, "ignoring unrecognized trait");
                continue;
            }
        }
        total_weight += w;
        if w > 0.0 {
            usable += 1;
        }
    }

    let distribution = match acc.normalized_by(total_weight) {
        Some(d) => d,
        None => {
            debug!(pairs = pairs.len(), "no usable weight; using fallback distribution");
            Distribution::FALLBACK
        }
    };

    HeuristicScore {
        distribution,
        total_weight,
        usable,
    }
}
