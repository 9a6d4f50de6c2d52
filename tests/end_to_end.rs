//! Full-pipeline scenarios: bank file → form → answered session → analysis.

mod common;

use std::fs;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};

use integrity_inventory::analysis::contradictions::{ContradictionKind, detect};
use integrity_inventory::analysis::fit::{FitStatus, TargetProfile, TraitRange};
use integrity_inventory::analysis::reliability::ReliabilityBand;
use integrity_inventory::analysis::report::Analyzer;
use integrity_inventory::bank::item::{ControlKind, ItemDefinition, MetaSubtype};
use integrity_inventory::bank::registry::ItemBank;
use integrity_inventory::core::config::Config;
use integrity_inventory::sampler::form::TestForm;
use integrity_inventory::sampler::stratify::FormSampler;
use integrity_inventory::scoring::aggregate::aggregate;
use integrity_inventory::scoring::response::{ItemResponse, load_responses};

fn load_hexaco_bank(dir: &tempfile::TempDir) -> ItemBank {
    let path = common::write_bank(dir.path(), &common::hexaco_bank(20, 2));
    ItemBank::load(&path).expect("bank loads")
}

fn build(bank: &ItemBank, size: usize, seed: u64) -> TestForm {
    FormSampler::from_config(&Config::default()).build_form(bank, size, &mut StdRng::seed_from_u64(seed))
}

/// Answer so each trait's running mean tracks its ideal midpoint: the k-th
/// item scores `round(m*(k+1)) - round(m*k)`, then reverse coding is undone
/// to recover the raw answer. Controls and meta items get a steady 4.
fn answer_at_midpoints(form: &TestForm, profile: &TargetProfile) -> Vec<ItemResponse> {
    let mut seen = std::collections::HashMap::<&str, u32>::new();
    form.items()
        .map(|item| {
            let raw = match (item.control_kind, profile.get(&item.category)) {
                (ControlKind::None, Some(range)) => {
                    let k = seen.entry(item.category.as_str()).or_default();
                    let m = range.midpoint();
                    let score = (m * f64::from(*k + 1)).round() - (m * f64::from(*k)).round();
                    *k += 1;
                    #[allow(clippy::cast_possible_truncation)]
                    let score = score as i64;
                    if item.reverse { 6 - score } else { score }
                }
                _ => 4,
            };
            ItemResponse::answer(item, raw, 4.0)
        })
        .collect()
}

#[test]
fn form_from_bank_file_is_stratified_and_complete() {
    let dir = tempfile::tempdir().expect("temp dir");
    let bank = load_hexaco_bank(&dir);
    assert_eq!(bank.len(), 120 + 3 + 6);

    let form = build(&bank, 120, 42);
    for name in common::TRAITS {
        assert!(form.count_in(name) >= 120 / 6 - 2, "{name}: {}", form.count_in(name));
    }
    let mut controls: Vec<&str> = form
        .of_kind(ControlKind::MainControl)
        .map(|item| item.id.as_str())
        .collect();
    controls.sort_unstable();
    assert_eq!(controls, vec!["control-0", "control-1", "control-2"]);

    let regular = form.of_kind(ControlKind::None).count();
    assert_eq!(form.meta_injection_count(), regular / 15);
    assert_eq!(form.len(), regular + regular / 15 + 3);
}

#[test]
fn long_form_injects_ten_meta_items_over_150_regulars() {
    let items: Vec<ItemDefinition> = common::hexaco_bank(30, 2)
        .into_iter()
        .filter(|item| item.control_kind != ControlKind::MainControl)
        .collect();
    let bank = ItemBank::from_items(items).expect("bank");
    let form = build(&bank, 160, 8);
    assert_eq!(form.of_kind(ControlKind::None).count(), 150);
    assert_eq!(form.meta_injection_count(), 10);
}

#[test]
fn midpoint_answers_fit_the_profile_and_leave_reliability_independent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let bank = load_hexaco_bank(&dir);
    let form = build(&bank, 120, 17);
    let config = Config::default();
    let responses = answer_at_midpoints(&form, &config.profile);

    let report = Analyzer::from_config(&config).analyze(&responses);
    assert_eq!(report.fit.score, 100);
    assert_eq!(report.fit.traits.len(), 6);
    assert!(report.fit.traits.iter().all(|t| t.status == FitStatus::Green));
    assert!(report.reliability.contradictions.is_empty());
    assert_eq!(report.latency.normal, responses.len());

    let total: usize = report.summaries.iter().map(|s| s.sample_count).sum();
    assert_eq!(total, responses.len());

    // Same answers against an unreachable profile: fit collapses, reliability does not move.
    let mut harsh = config.clone();
    harsh.profile = TargetProfile::new(
        common::TRAITS.map(|name| (name, TraitRange::new(5.0, 5.0))),
    );
    let harsh_report = Analyzer::from_config(&harsh).analyze(&responses);
    assert!(harsh_report.fit.score < report.fit.score);
    assert_eq!(harsh_report.reliability, report.reliability);
}

#[test]
fn careless_fast_straight_lining_floors_reliability() {
    let dir = tempfile::tempdir().expect("temp dir");
    let bank = load_hexaco_bank(&dir);
    let form = build(&bank, 120, 99);
    let responses: Vec<ItemResponse> = form
        .items()
        .map(|item| ItemResponse::answer(item, 5, 0.6))
        .collect();

    let report = Analyzer::default().analyze(&responses);
    assert_eq!(report.reliability.score, 0);
    assert_eq!(report.reliability.band, ReliabilityBand::VeryLow);
    assert_eq!(report.latency.too_fast, responses.len());
    assert!(
        report
            .reliability
            .contradictions
            .iter()
            .any(|record| record.kind == ContradictionKind::CategoryPair)
    );
    let names: Vec<&str> = report.reliability.penalties.iter().map(|t| t.name).collect();
    assert!(names.contains(&"fast_latency"));
    assert!(names.contains(&"extreme_responding"));
}

#[test]
fn control_breach_with_fast_answers_scores_zero() {
    let mut responses: Vec<ItemResponse> = (0..12)
        .map(|n| {
            ItemResponse::new(
                format!("q{n}"),
                common::TRAITS[n % 6],
                ControlKind::None,
                3 + i64::from(n % 2 == 0),
                false,
                0.5,
            )
        })
        .collect();
    for (id, raw) in [("control-0", 5), ("control-1", 5), ("control-2", 2)] {
        responses.push(ItemResponse::new(id, "control", ControlKind::MainControl, raw, false, 0.5));
    }
    let report = Analyzer::default().analyze(&responses);
    assert_eq!(report.reliability.score, 0);
    assert!(
        report
            .reliability
            .contradictions
            .iter()
            .any(|record| record.kind == ContradictionKind::ControlBreach)
    );
}

#[test]
fn exported_session_file_round_trips_through_analysis() {
    let dir = tempfile::tempdir().expect("temp dir");
    let rows: Vec<Value> = (0..10)
        .map(|n| {
            json!({
                "id": n,
                "trait": "openness",
                "question": format!("openness statement {n}"),
                "original_answer": if n % 2 == 0 { "4" } else { "5" },
                "reverse": if n == 3 { "yes" } else { "0" },
                "time_taken": 3.5,
            })
        })
        .chain(std::iter::once(json!({
            "id": "m1",
            "trait": "polygraph",
            "control_type": "meta",
            "original_answer": 1,
            "time_taken": "n/a",
        })))
        .collect();
    let path = dir.path().join("session.json");
    fs::write(&path, serde_json::to_string(&json!({ "responses": rows })).expect("json"))
        .expect("write session");

    let responses = load_responses(&path).expect("load session");
    assert_eq!(responses.len(), 11);
    assert_eq!(responses[3].score(), 1);
    assert!(responses[10].latency_seconds.abs() < f64::EPSILON);

    let summaries = aggregate(&responses);
    assert_eq!(summaries[0].category, "openness");
    assert_eq!(summaries[0].sample_count, 10);

    let report = Analyzer::default().analyze(&responses);
    let names: Vec<&str> = report.reliability.penalties.iter().map(|t| t.name).collect();
    assert!(names.contains(&"low_willingness_to_verify"));
    assert_eq!(report.latency.too_fast, 1);
}

#[test]
fn meta_rows_are_recognized_by_category_alone() {
    let dir = tempfile::tempdir().expect("temp dir");
    let rows: Vec<Value> = [5, 1, 1]
        .iter()
        .enumerate()
        .map(|(n, answer)| json!({ "id": n, "trait": "polygraph", "original_answer": answer, "time_taken": 3.0 }))
        .collect();
    let path = dir.path().join("meta_only.json");
    fs::write(&path, serde_json::to_string(&rows).expect("json")).expect("write session");

    let responses = load_responses(&path).expect("load session");
    assert!(responses.iter().all(|r| r.control_kind == ControlKind::Meta));
    assert!(
        responses
            .iter()
            .all(|r| r.meta_subtype == Some(MetaSubtype::WillingnessToVerify))
    );

    let records = detect(&responses);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ContradictionKind::MetaInconsistency);
    assert_eq!(records[0].category, "willingness_to_verify");
    assert!((records[0].spread.value() - (4.0f64 / 3.0).sqrt() * 2.0).abs() < 1e-12);

    // One high-severity record: 100 - 15. Willingness mean 7/3 stays above the cutoff.
    let report = Analyzer::default().analyze(&responses);
    assert_eq!(report.reliability.score, 85);
    let names: Vec<&str> = report.reliability.penalties.iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["contradictions"]);
}
