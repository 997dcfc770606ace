//! Whole runs: identical seeds and answers give identical runs, and saved runs resume.

use chrono::NaiveDate;
use turnstile::game::autopilot::{Answer, Autopilot, ChestPolicy};
use turnstile::game::effects::Effect;
use turnstile::game::rules::RunConfig;
use turnstile::game::run::{GameRun, RunOptions};
use turnstile::game::session::{GameMode, SessionSnapshot};
use turnstile::gate::ExternalFailure;
use turnstile::rng::{RunSeed, SeededRng};

fn options(max_waves: u32) -> RunOptions {
    let rules = RunConfig {
        max_waves,
        ..RunConfig::default()
    };
    RunOptions::new(rules, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
}

fn play(seed: &str, pilot: &Autopilot) -> (GameRun, Vec<turnstile::game::TranscriptEntry>) {
    let mut run = GameRun::new(options(30), SeededRng::new(RunSeed::new(seed))).unwrap();
    run.start().unwrap();
    let transcript = pilot.drive(&mut run).unwrap();
    (run, transcript)
}

/// Answer requests until the session reaches `wave`.
fn play_until_wave(run: &mut GameRun, pilot: &Autopilot, wave: u32) {
    while run.session().wave < wave {
        let requests = run.take_effects();
        assert!(!requests.is_empty(), "run stopped before wave {}", wave);
        for request in requests {
            let Some(gate) = request.gate else { continue };
            match pilot.answer(&request.effect, run.session()) {
                Answer::Resolve { value } => {
                    run.resolve(gate, value).unwrap();
                }
                Answer::Reject { reason } => {
                    run.reject(gate, ExternalFailure(reason)).unwrap();
                }
                Answer::None => {}
            }
        }
    }
}

#[test]
fn test_same_seed_same_run() {
    let pilot = Autopilot::default();
    let (first, first_transcript) = play("determinism", &pilot);
    let (second, second_transcript) = play("determinism", &pilot);

    assert!(!first_transcript.is_empty());
    assert_eq!(first_transcript, second_transcript);
    assert_eq!(first.session().summary, second.session().summary);
    assert_eq!(
        first.scheduler().journal().events(),
        second.scheduler().journal().events()
    );
}

#[test]
fn test_different_seeds_diverge() {
    let pilot = Autopilot {
        chest: ChestPolicy::Open,
        ..Autopilot::default()
    };
    let runs: Vec<_> = ["left", "right", "middle"]
        .iter()
        .map(|seed| play(seed, &pilot).1)
        .collect();
    assert!(runs.windows(2).any(|pair| pair[0] != pair[1]));
}

#[test]
fn test_every_run_reaches_a_summary() {
    let pilot = Autopilot::default();
    let (run, transcript) = play("summary", &pilot);
    assert!(run.is_finished());
    let summary = run.session().summary.as_ref().unwrap();
    assert_eq!(summary.seed, "summary");
    assert_eq!(summary.mode, GameMode::Classic);
    let last = transcript.last().unwrap();
    assert!(matches!(&last.effect, Effect::Text { key, .. } if key == "game_over.summary"));
    assert_eq!(last.answer, Answer::None);
}

#[test]
fn test_daily_run_uses_answered_seed() {
    let pilot = Autopilot {
        title_choice: 1,
        daily_seed: Some("daily-2024-02-29".to_string()),
        ..Autopilot::default()
    };
    let (run, _) = play("menu", &pilot);
    let summary = run.session().summary.as_ref().unwrap();
    assert_eq!(summary.mode, GameMode::Daily);
    assert_eq!(summary.seed, "daily-2024-02-29");
}

#[test]
fn test_daily_run_falls_back_to_date_seed() {
    let pilot = Autopilot {
        title_choice: 1,
        daily_seed: None,
        ..Autopilot::default()
    };
    let (run, transcript) = play("menu", &pilot);
    let expected = RunSeed::daily(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    assert_eq!(run.session().summary.as_ref().unwrap().seed, expected.as_str());
    assert!(transcript
        .iter()
        .any(|entry| matches!(entry.answer, Answer::Reject { .. })));
}

#[test]
fn test_snapshot_round_trips_and_resumes_deterministically() {
    let pilot = Autopilot::default();
    let mut run = GameRun::new(options(30), SeededRng::new(RunSeed::new("save"))).unwrap();
    run.start().unwrap();
    play_until_wave(&mut run, &pilot, 4);

    let snapshot = run.snapshot().unwrap();
    assert_eq!(snapshot.wave, 4);
    let text = snapshot.to_json().unwrap();
    assert_eq!(SessionSnapshot::from_json(&text).unwrap(), snapshot);

    let mut first = GameRun::resume(options(30), snapshot.clone()).unwrap();
    let mut second = GameRun::resume(options(30), snapshot).unwrap();
    let first_effects = first.session().pending_effects().to_vec();
    assert!(first_effects.iter().any(|request| {
        request.effect == Effect::text("wave.start").with_token("wave", 4)
    }));

    let a = pilot.drive(&mut first).unwrap();
    let b = pilot.drive(&mut second).unwrap();
    assert_eq!(a, b);
    assert_eq!(first.session().summary, second.session().summary);
}
