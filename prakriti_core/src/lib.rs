pub mod dosha;
pub mod answer;

pub mod affinity;
pub mod score;
pub mod classify;
pub mod cfg;
pub mod error;
pub mod result;
pub mod report;

pub use dosha::{Dosha, Distribution};
pub use answer::{Answer, TraitPair, parse_answers, normalize_answers, trait_pairs};

pub use affinity::{Affinity, AffinityTable, Bucket, TraitAffinity, default_affinity_table};
pub use score::{HeuristicScore, TraitRoute, route, score_pairs};
pub use classify::{Classification, Constitution, classify};
pub use cfg::ScoringCfg;
pub use error::ScoringError;
pub use result::{ConstitutionResult, Method, ModelPrediction, assemble, predict_heuristic};
pub use report::{ConstitutionReport, FeaturesUsed, ModelBlock, PrakritiBlock};
