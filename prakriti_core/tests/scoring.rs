use prakriti_core::*;
use serde_json::json;

fn answers(v: &[(&str, f64)]) -> Vec<Answer> {
    v.iter().map(|(t, w)| Answer::new(*t, *w)).collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn dominant_single_type() {
    let cfg = ScoringCfg::default();
    let r = predict_heuristic(&answers(&[("vata", 0.8), ("pitta", 0.1), ("kapha", 0.1)]), &cfg);

    assert_eq!(r.dominant, Dosha::Vata);
    assert_eq!(r.composite_label, "vata");
    assert_eq!(r.method, Method::Heuristic);
    assert!(r.distribution.is_normalized(1e-6));
    assert!(approx(r.confidence, r.distribution.vata));
    assert!(r.model.is_none());
}

#[test]
fn primary_pitta_and_kapha() {
    let cfg = ScoringCfg::default();
    let p = predict_heuristic(&answers(&[("vata", 0.2), ("pitta", 0.6), ("kapha", 0.2)]), &cfg);
    assert_eq!(p.dominant, Dosha::Pitta);
    assert_eq!(p.composite_label, "pitta");

    let k = predict_heuristic(&answers(&[("vata", 0.1), ("pitta", 0.2), ("kapha", 0.7)]), &cfg);
    assert_eq!(k.dominant, Dosha::Kapha);
    assert_eq!(k.composite_label, "kapha");
}

#[test]
fn dual_type_joins_top_two() {
    let cfg = ScoringCfg::default();
    let r = predict_heuristic(&answers(&[("vata", 0.4), ("pitta", 0.4), ("kapha", 0.2)]), &cfg);

    assert!(approx(r.distribution.vata, 0.4));
    assert!(approx(r.distribution.pitta, 0.4));
    assert!(approx(r.distribution.kapha, 0.2));

    let tokens: Vec<&str> = r.composite_label.split('-').collect();
    assert_eq!(tokens.len(), 2);
    assert!(tokens.contains(&"vata"));
    assert!(tokens.contains(&"pitta"));
    // Exact tie: priority order puts vata first.
    assert_eq!(r.composite_label, "vata-pitta");
    assert_eq!(r.secondary, Dosha::Pitta);
}

#[test]
fn balanced_is_tridoshic() {
    let cfg = ScoringCfg::default();
    let r = predict_heuristic(&answers(&[("vata", 0.33), ("pitta", 0.33), ("kapha", 0.34)]), &cfg);
    assert_eq!(r.composite_label, "tridoshic");
    assert_eq!(r.dominant, Dosha::Kapha);
    assert_eq!(r.method, Method::Heuristic);
}

#[test]
fn empty_submission_falls_back() {
    let r = predict_heuristic(&[], &ScoringCfg::default());
    assert_eq!(r.distribution, Distribution::FALLBACK);
    assert_eq!(r.method, Method::Fallback);
    assert_eq!(r.dominant, Dosha::Kapha);
    assert_eq!(r.composite_label, "tridoshic");
    assert!(approx(r.confidence, 0.34));
    assert_eq!(r.usable_answers, 0);
    assert_eq!(r.total_questions, 0);
}

#[test]
fn only_unrecognized_traits_fall_back() {
    let r = predict_heuristic(&answers(&[("unknown_thing", 0.9), ("favourite_colour", 0.4)]), &ScoringCfg::default());
    assert_eq!(r.method, Method::Fallback);
    assert_eq!(r.distribution, Distribution::FALLBACK);
    assert_eq!(r.total_questions, 2);
}

#[test]
fn zero_weights_fall_back() {
    let r = predict_heuristic(&answers(&[("vata", 0.0), ("sleep", 0.0)]), &ScoringCfg::default());
    assert_eq!(r.method, Method::Fallback);
}

#[test]
fn unknown_trait_contributes_nothing() {
    let cfg = ScoringCfg::default();
    let base = answers(&[("vata", 0.5), ("sleep", 0.8), ("pitta", 0.3)]);
    let mut noisy = base.clone();
    noisy.insert(1, Answer::new("unknown_thing", 0.9));

    let a = predict_heuristic(&base, &cfg);
    let b = predict_heuristic(&noisy, &cfg);
    assert_eq!(a.distribution, b.distribution);
    assert!(approx(a.total_weight, b.total_weight));
    assert_eq!(a.usable_answers, b.usable_answers);
    assert_eq!(b.total_questions, 4);
}

#[test]
fn bucket_thresholds_are_lower_inclusive() {
    let cfg = ScoringCfg::default();
    assert_eq!(Bucket::of(0.0, &cfg), Bucket::Low);
    assert_eq!(Bucket::of(0.29, &cfg), Bucket::Low);
    assert_eq!(Bucket::of(0.3, &cfg), Bucket::Medium);
    assert_eq!(Bucket::of(0.69, &cfg), Bucket::Medium);
    assert_eq!(Bucket::of(0.7, &cfg), Bucket::High);
    assert_eq!(Bucket::of(1.0, &cfg), Bucket::High);
}

#[test]
fn characteristic_trait_uses_bucket_affinity() {
    let cfg = ScoringCfg::default();
    let table = AffinityTable::canonical();

    let low = score_pairs(&trait_pairs(&json!([{"trait": "sleep", "weight": 0.2}]), &cfg), table, &cfg);
    assert!(approx(low.distribution.vata, 0.8));
    assert!(approx(low.distribution.pitta, 0.1));
    assert!(approx(low.total_weight, 0.2));

    let medium = score_pairs(&trait_pairs(&json!([{"trait": "sleep", "weight": 0.3}]), &cfg), table, &cfg);
    assert!(approx(medium.distribution.pitta, 0.8));

    let high = score_pairs(&trait_pairs(&json!([{"trait": "sleep", "weight": 0.7}]), &cfg), table, &cfg);
    assert!(approx(high.distribution.kapha, 0.8));
}

#[test]
fn characteristic_contribution_is_weighted() {
    let cfg = ScoringCfg::default();
    // kapha 0.2 direct + skin 0.8 (high: 0.1/0.1/0.8)
    let s = score_pairs(
        &trait_pairs(&json!([{"trait": "kapha", "weight": 0.2}, {"trait": "skin", "weight": 0.8}]), &cfg),
        AffinityTable::canonical(),
        &cfg,
    );
    assert!(approx(s.total_weight, 1.0));
    assert!(approx(s.distribution.vata, 0.08));
    assert!(approx(s.distribution.pitta, 0.08));
    assert!(approx(s.distribution.kapha, 0.84));
    assert_eq!(s.usable, 2);
}

#[test]
fn suffix_tagged_traits_vote_whole_weight() {
    let cfg = ScoringCfg::default();
    let r = predict_heuristic(&answers(&[("body_vata", 0.6), ("mind_pitta", 0.2)]), &cfg);
    assert!(approx(r.distribution.vata, 0.75));
    assert!(approx(r.distribution.pitta, 0.25));
    assert!(approx(r.distribution.kapha, 0.0));
}

#[test]
fn routing_precedence() {
    let cfg = ScoringCfg::default();
    let table = AffinityTable::canonical();
    assert_eq!(route("vata", 0.5, table, &cfg), TraitRoute::Direct(Dosha::Vata));
    assert!(matches!(route("sleep", 0.5, table, &cfg), TraitRoute::Characteristic(Bucket::Medium, _)));
    assert_eq!(route("sleep_kapha", 0.5, table, &cfg), TraitRoute::Tagged(Dosha::Kapha));
    assert_eq!(route("kaphavata", 0.5, table, &cfg), TraitRoute::Unknown);
    assert_eq!(route("unknown_thing", 0.5, table, &cfg), TraitRoute::Unknown);

    assert_eq!(Dosha::from_suffix("vata"), None);
    assert_eq!(Dosha::from_suffix("kapha_pitta"), Some(Dosha::Pitta));
}

#[test]
fn ties_follow_priority_order() {
    let cfg = ScoringCfg::default();

    let d = Distribution::new(0.4, 0.2, 0.4);
    let ranked = d.ranked();
    assert_eq!(ranked.map(|(d, _)| d), [Dosha::Vata, Dosha::Kapha, Dosha::Pitta]);
    assert_eq!(classify(&d, &cfg).constitution, Constitution::Dual(Dosha::Vata, Dosha::Kapha));

    let d = Distribution::new(0.25, 0.375, 0.375);
    let c = classify(&d, &cfg);
    assert_eq!(c.dominant, Dosha::Pitta);
    assert_eq!(c.constitution, Constitution::Dual(Dosha::Pitta, Dosha::Kapha));

    let d = Distribution::new(0.3, 0.35, 0.35);
    assert_eq!(classify(&d, &cfg).constitution, Constitution::Tridoshic);
}

#[test]
fn composite_rules_in_order() {
    let cfg = ScoringCfg::default();
    assert_eq!(classify(&Distribution::new(0.5, 0.3, 0.2), &cfg).constitution.label(), "vata");
    assert_eq!(classify(&Distribution::new(0.2, 0.42, 0.38), &cfg).constitution.label(), "pitta-kapha");
    assert_eq!(classify(&Distribution::new(0.36, 0.3, 0.34), &cfg).constitution.label(), "tridoshic");
}

#[test]
fn parse_accepts_all_shapes() {
    let list = json!([{"trait": "vata", "weight": 0.8}, {"trait": "pitta"}]);
    let envelope = json!({"answers": [{"trait": "vata", "weight": 0.8}, {"trait": "pitta"}]});
    assert_eq!(parse_answers(&list), parse_answers(&envelope));

    let mapping = json!({
        "q1": "Thin, light, and narrow",
        "q2": {"trait": "skin", "weight": 0.2},
        "q3": null
    });
    let parsed = parse_answers(&mapping);
    assert_eq!(parsed.len(), 2);
    let q1 = parsed.iter().find(|a| a.question_id.as_deref() == Some("q1")).unwrap();
    assert_eq!(q1.trait_name, None);
    assert_eq!(q1.value, Some(json!("Thin, light, and narrow")));
    let q2 = parsed.iter().find(|a| a.question_id.as_deref() == Some("q2")).unwrap();
    assert_eq!(q2.trait_key().as_deref(), Some("skin"));

    let cfg = ScoringCfg::default();
    let pairs = trait_pairs(&mapping, &cfg);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].trait_name, "skin");
}

#[test]
fn mapping_keeps_submission_order() {
    let cfg = ScoringCfg::default();
    let payload = json!({
        "q2": {"trait": "sleep", "weight": 0.2},
        "q10": {"trait": "vata", "weight": 0.9},
        "q1": {"trait": "kapha", "weight": 0.4}
    });

    let ids: Vec<String> = parse_answers(&payload)
        .into_iter()
        .filter_map(|a| a.question_id)
        .collect();
    assert_eq!(ids, ["q2", "q10", "q1"]);

    let pairs = trait_pairs(&payload, &cfg);
    let order: Vec<(usize, &str)> = pairs.iter().map(|p| (p.index, p.trait_name.as_str())).collect();
    assert_eq!(order, vec![(0, "sleep"), (1, "vata"), (2, "kapha")]);
}

#[test]
fn normalizer_defaults_and_drops() {
    let cfg = ScoringCfg::default();
    let payload = json!([
        {"trait": " Vata ", "weight": "0.7"},
        {"trait": "pitta", "weight": "abc"},
        {"weight": 0.9},
        {"trait": "", "weight": 0.9},
        {"trait": 7, "weight": 0.9},
        {"trait": "kapha", "weight": 1.5},
        {"trait": "sleep", "weight": -2},
        "not a record",
        42
    ]);
    let pairs = trait_pairs(&payload, &cfg);
    let got: Vec<(&str, f64, usize)> = pairs.iter().map(|p| (p.trait_name.as_str(), p.weight, p.index)).collect();
    assert_eq!(
        got,
        vec![("vata", 0.7, 0), ("pitta", 0.5, 1), ("kapha", 1.0, 5), ("sleep", 0.0, 6)]
    );
}

#[test]
fn garbage_payloads_yield_nothing() {
    let cfg = ScoringCfg::default();
    for payload in [json!(null), json!(3), json!("vata"), json!(true), json!({"answers": 5}), json!([])] {
        assert!(trait_pairs(&payload, &cfg).is_empty(), "payload {payload}");
    }
}

#[test]
fn canonical_table_is_valid() {
    let table = AffinityTable::canonical();
    assert!(table.validate().is_ok());
    assert_eq!(table.len(), 12);
    for name in ["sleep", "appetite", "skin", "stress_response", "body_frame", "climate_preference"] {
        assert!(table.contains(name), "{name}");
    }
    assert!(!table.contains("vata"));
}

#[test]
fn table_insert_rejects_bad_entries() {
    let mut table = AffinityTable::new();
    let ok = TraitAffinity::new(
        Affinity::new(0.6, 0.2, 0.2),
        Affinity::new(0.2, 0.6, 0.2),
        Affinity::new(0.2, 0.2, 0.6),
    );
    assert!(table.insert("Hair", ok).is_ok());
    assert!(table.contains("hair"));

    let bad = TraitAffinity::new(ok.low, Affinity::new(0.5, 0.5, 0.5), ok.high);
    assert!(matches!(
        table.insert("voice", bad),
        Err(ScoringError::NotSimplex { bucket: "medium", .. })
    ));
    assert_eq!(table.insert("pitta", ok), Err(ScoringError::ReservedTrait("pitta".to_string())));
}

#[test]
fn custom_table_changes_scoring() {
    let cfg = ScoringCfg::default();
    let mut table = AffinityTable::new();
    table
        .insert(
            "hair",
            TraitAffinity::new(
                Affinity::new(1.0, 0.0, 0.0),
                Affinity::new(0.0, 1.0, 0.0),
                Affinity::new(0.0, 0.0, 1.0),
            ),
        )
        .unwrap();
    let s = score_pairs(&trait_pairs(&json!([{"trait": "hair", "weight": 0.9}, {"trait": "sleep", "weight": 0.9}]), &cfg), &table, &cfg);
    // `sleep` is not in this table.
    assert!(approx(s.total_weight, 0.9));
    assert!(approx(s.distribution.kapha, 1.0));
}

#[test]
fn cfg_validation() {
    assert!(ScoringCfg::default().validate().is_ok());
    let bad = ScoringCfg {
        low_threshold: 0.8,
        high_threshold: 0.7,
        ..ScoringCfg::default()
    };
    assert!(matches!(bad.validate(), Err(ScoringError::Thresholds { .. })));
    let bad = ScoringCfg {
        default_weight: 2.0,
        ..ScoringCfg::default()
    };
    assert!(matches!(bad.validate(), Err(ScoringError::OutOfRange { name: "default_weight", .. })));
}

#[test]
fn model_result_is_authoritative() {
    let cfg = ScoringCfg::default();
    let score = score_pairs(&trait_pairs(&json!([{"trait": "vata", "weight": 0.9}]), &cfg), AffinityTable::canonical(), &cfg);
    let model = ModelPrediction {
        predicted: Dosha::Pitta,
        confidence: 0.7,
        distribution: Distribution::new(0.2, 0.7, 0.1),
        calibrated: true,
    };
    let r = assemble(&score, Some(model.clone()), 1, &cfg);
    assert_eq!(r.method, Method::Hybrid);
    assert_eq!(r.dominant, Dosha::Pitta);
    assert_eq!(r.composite_label, "pitta");
    assert_eq!(r.distribution, model.distribution);
    assert!(approx(r.heuristic.vata, 1.0));
    assert!(approx(r.confidence, 0.7));
    assert_eq!(r.model, Some(model));
}

#[test]
fn model_output_ignored_without_usable_answers() {
    let cfg = ScoringCfg::default();
    let score = score_pairs(&[], AffinityTable::canonical(), &cfg);
    let model = ModelPrediction {
        predicted: Dosha::Kapha,
        confidence: 0.9,
        distribution: Distribution::new(0.05, 0.05, 0.9),
        calibrated: true,
    };
    let r = assemble(&score, Some(model), 3, &cfg);
    assert_eq!(r.method, Method::Fallback);
    assert_eq!(r.distribution, Distribution::FALLBACK);
    assert_eq!(r.dominant, Dosha::Kapha);
    assert_eq!(r.composite_label, "tridoshic");
    assert!(r.model.is_none());
    assert_eq!(r.total_questions, 3);
}

#[test]
fn label_only_model_overrides_dominant() {
    let cfg = ScoringCfg::default();
    let score = score_pairs(
        &trait_pairs(&json!([{"trait": "vata", "weight": 0.6}, {"trait": "pitta", "weight": 0.4}]), &cfg),
        AffinityTable::canonical(),
        &cfg,
    );
    let model = ModelPrediction {
        predicted: Dosha::Pitta,
        confidence: 0.75,
        distribution: score.distribution,
        calibrated: false,
    };
    let r = assemble(&score, Some(model), 2, &cfg);
    assert_eq!(r.method, Method::Hybrid);
    assert_eq!(r.dominant, Dosha::Pitta);
    assert_eq!(r.secondary, Dosha::Vata);
    assert_eq!(r.composite_label, "pitta");
    assert!(approx(r.confidence, 0.75));
    assert_eq!(r.distribution, score.distribution);
}

#[test]
fn report_scales_and_rounds_once() {
    let cfg = ScoringCfg::default();
    let r = predict_heuristic(&answers(&[("vata", 0.4), ("pitta", 0.4), ("kapha", 0.2)]), &cfg);
    let rep = r.report(1);
    assert!(approx(rep.prakriti.percent.vata, 40.0));
    assert!(approx(rep.prakriti.percent.kapha, 20.0));
    assert_eq!(rep.features_used.calculation_method, Method::Heuristic);

    let v = rep.to_json();
    assert_eq!(v["prakriti"]["type"], "vata-pitta");
    assert_eq!(v["prakriti"]["dominant"], "vata");
    assert_eq!(v["features_used"]["calculation_method"], "heuristic");
    assert!(v["prakriti"]["ml_prediction"].is_null());

    let third = Distribution::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0);
    assert_eq!(third.percent(0).vata, 33.0);
    assert!(approx(third.percent(2).vata, 33.33));
}

#[test]
fn fallback_report_is_complete() {
    let v = ConstitutionResult::fallback(4).report(0).to_json();
    assert_eq!(v["prakriti"]["percent"], json!({"vata": 33.0, "pitta": 33.0, "kapha": 34.0}));
    assert_eq!(v["features_used"]["calculation_method"], "fallback");
    assert_eq!(v["features_used"]["total_questions"], 4);
    assert_eq!(v["confidence"], 0.34);
}
