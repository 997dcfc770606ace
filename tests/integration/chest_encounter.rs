//! The mysterious chest: branch selection, reward hand-off and the trap's reset.

use chrono::NaiveDate;
use turnstile::game::effects::{Effect, EffectRequest};
use turnstile::game::party::{Member, Party, Species};
use turnstile::game::phases::GamePhase;
use turnstile::game::rewards::{ChestOutcome, RewardTier};
use turnstile::game::rules::RunConfig;
use turnstile::game::run::{GameRun, RunOptions};
use turnstile::game::session::RunOutcome;
use turnstile::gate::{ExternalFailure, GateHandle, GateValue};
use turnstile::phase::Phase;
use turnstile::rng::{ScriptedRng, SessionRng};
use turnstile::scheduler::Progress;

const OPEN: GateValue = GateValue::Choice(0);
const LEAVE: GateValue = GateValue::Choice(1);

fn chest_run(script: Vec<u32>, members: Vec<Member>) -> GameRun {
    let rules = RunConfig {
        min_party: 1,
        ..RunConfig::default()
    };
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut run = GameRun::new(RunOptions::new(rules, today), ScriptedRng::new(script)).unwrap();
    let session = run.session_mut();
    session.wave = 10;
    session.party = Party::new(members);

    let progress = run
        .begin_with(vec![GamePhase::mystery_encounter(), GamePhase::new_wave()])
        .unwrap();
    assert!(matches!(progress, Progress::Suspended { .. }));
    run
}

/// The one gated request among the pending effects.
fn gated(requests: &[EffectRequest]) -> (GateHandle, Effect) {
    let gated: Vec<_> = requests
        .iter()
        .filter_map(|request| request.gate.map(|gate| (gate, request.effect.clone())))
        .collect();
    assert_eq!(gated.len(), 1, "expected one gated effect in {:?}", requests);
    gated[0].clone()
}

fn draws(run: &GameRun) -> usize {
    match &run.session().rng {
        SessionRng::Scripted(rng) => rng.consumed(),
        SessionRng::Seeded(_) => unreachable!("chest tests use scripted draws"),
    }
}

fn open_chest(run: &mut GameRun) -> Vec<EffectRequest> {
    let (gate, prompt) = gated(&run.take_effects());
    assert!(matches!(prompt, Effect::Prompt { ref key, .. } if key == "chest.query"));
    run.resolve(gate, OPEN).unwrap();
    run.take_effects()
}

fn two_members() -> Vec<Member> {
    vec![
        Member::new(Species::Ripplet, 8),
        Member::new(Species::Pebblit, 12),
    ]
}

#[test]
fn test_trap_with_last_member_resets_to_single_game_over() {
    let mut run = chest_run(vec![0], vec![Member::new(Species::Pebblit, 12)]);
    let requests = open_chest(&mut run);
    assert_eq!(draws(&run), 1);
    assert!(requests
        .iter()
        .any(|request| request.effect == Effect::animation("chest.open.red")));

    let (gate, text) = gated(&requests);
    assert_eq!(
        text,
        Effect::text("chest.open.bad").with_token("member", Species::Pebblit)
    );
    assert_eq!(run.session().encounter, Some(ChestOutcome::Trap));
    assert_eq!(run.session().party.allowed_in_battle(), 0);

    run.resolve(gate, GateValue::Ack).unwrap();

    let scheduler = run.scheduler();
    assert_eq!(scheduler.stats().clears, 1);
    assert!(scheduler.is_empty(), "queue still holds {:?}", scheduler.queued().collect::<Vec<_>>());
    let current = scheduler.current().unwrap();
    assert_eq!(current.phase, &GamePhase::game_over(false));

    let started = scheduler.journal().started_names();
    assert_eq!(started.iter().filter(|name| **name == "game_over").count(), 1);
    assert!(!started.iter().any(|name| name.starts_with("battle")));
    assert!(!started.contains(&"new_wave"));

    let (fade, effect) = gated(&run.take_effects());
    assert_eq!(effect, Effect::Fade { millis: 5_000 });
    run.resolve(fade, GateValue::Ack).unwrap();
    assert!(run.is_finished());
    let summary = run.session().summary.clone().unwrap();
    assert_eq!(summary.outcome, RunOutcome::Defeat);
    assert_eq!(summary.wave, 10);
}

#[test]
fn test_trap_with_members_left_starts_boss_battle() {
    let mut run = chest_run(vec![0], two_members());
    let requests = open_chest(&mut run);
    let (gate, text) = gated(&requests);
    assert_eq!(
        text,
        Effect::text("chest.open.bad").with_token("member", Species::Pebblit)
    );
    assert!(run.session().party.members()[1].fainted);

    run.resolve(gate, GateValue::Ack).unwrap();
    let requests = run.take_effects();
    // The summon animation is gated too, but detached: nothing waits on it.
    let battle = requests
        .iter()
        .find(|request| matches!(request.effect, Effect::Battle { .. }))
        .unwrap();
    assert!(battle.gate.is_some());
    assert_eq!(
        battle.effect,
        Effect::Battle {
            wave: 10,
            boss: Some(Species::Chestling),
            double: false,
        }
    );

    let scheduler = run.scheduler();
    assert_eq!(scheduler.stats().clears, 0);
    assert_eq!(
        scheduler.journal().started_names(),
        vec!["mystery_encounter", "battle_init", "summon", "battle"]
    );
    assert_eq!(
        scheduler.queued().cloned().collect::<Vec<_>>(),
        vec![GamePhase::new_wave()]
    );
}

#[test]
fn test_common_reward_queues_exactly_one_reward_phase() {
    let mut run = chest_run(vec![80], two_members());
    let requests = open_chest(&mut run);
    assert!(requests
        .iter()
        .any(|request| request.effect == Effect::animation("chest.open.blue")));
    let (gate, text) = gated(&requests);
    assert_eq!(text, Effect::text("chest.open.normal"));
    assert_eq!(run.session().encounter, Some(ChestOutcome::CommonReward));

    run.resolve(gate, GateValue::Ack).unwrap();
    let (offer_gate, offer) = gated(&run.take_effects());
    assert_eq!(
        offer,
        Effect::RewardOffer {
            tiers: vec![
                RewardTier::Common,
                RewardTier::Common,
                RewardTier::Great,
                RewardTier::Great
            ],
        }
    );

    let scheduler = run.scheduler();
    assert_eq!(scheduler.current().unwrap().phase.name(), "reward");
    assert_eq!(
        scheduler.queued().cloned().collect::<Vec<_>>(),
        vec![GamePhase::new_wave()]
    );
    assert!(!scheduler
        .journal()
        .started_names()
        .iter()
        .any(|name| name.starts_with("battle")));
    assert_eq!(draws(&run), 1);

    run.resolve(offer_gate, GateValue::Choice(2)).unwrap();
    assert_eq!(run.session().inventory.count(RewardTier::Great), 1);
    assert_eq!(run.session().wave, 11);
}

#[test]
fn test_leaving_draws_nothing() {
    let mut run = chest_run(vec![], two_members());
    let (gate, _) = gated(&run.take_effects());
    run.resolve(gate, LEAVE).unwrap();

    assert_eq!(draws(&run), 0);
    assert!(run
        .take_effects()
        .iter()
        .any(|request| request.effect == Effect::text("chest.leave")));
    assert_eq!(run.session().wave, 11);
    assert!(run.session().party.members().iter().all(|m| !m.fainted));
}

#[test]
fn test_failed_prompt_falls_back_to_leaving() {
    let mut run = chest_run(vec![], two_members());
    let (gate, _) = gated(&run.take_effects());
    run.reject(gate, ExternalFailure("ui closed".to_string()))
        .unwrap();

    assert_eq!(draws(&run), 0);
    assert!(run
        .take_effects()
        .iter()
        .any(|request| request.effect == Effect::text("chest.leave")));
}

#[test]
fn test_chest_outside_encounter_range_is_skipped() {
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut run = GameRun::new(
        RunOptions::new(RunConfig::default(), today),
        ScriptedRng::new(vec![]),
    )
    .unwrap();
    run.session_mut().wave = 9;
    run.session_mut().party = Party::new(two_members());
    run.begin_with(vec![GamePhase::mystery_encounter()]).unwrap();

    assert_eq!(run.scheduler().stats().skipped, 1);
    assert_eq!(run.scheduler().stats().started, 0);
    assert!(run.take_effects().is_empty());
}
