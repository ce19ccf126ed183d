use hashbrown::HashSet;
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use drawlog::{
    config::SessionConfig,
    core::ledger::WinnerLedger,
    import::SheetRow,
    persist::{PersistenceStore, memory::MemoryStore},
    session::machine::DrawSession,
    types::{AwardTier, Phase},
    winner::Winner,
};

#[derive(Debug, Clone)]
enum Action {
    Import { count: u8 },
    Select { tier: u8 },
    Override,
    Start,
    Tick,
    Stop,
    Delete { target: u8 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..8).prop_map(|count| Action::Import { count }),
        (0u8..4).prop_map(|tier| Action::Select { tier }),
        Just(Action::Override),
        Just(Action::Start),
        Just(Action::Tick),
        Just(Action::Stop),
        (0u8..16).prop_map(|target| Action::Delete { target }),
    ]
}

fn rows(count: u8) -> Vec<SheetRow> {
    (0..count)
        .map(|i| SheetRow::new().with_field("name", format!("P{i}")))
        .collect()
}

fn persisted(session: &DrawSession) -> Vec<Winner> {
    let key = session.ledger().key();
    match session.ledger().store().get(key).expect("get") {
        Some(raw) => serde_json::from_str(&raw).expect("decode"),
        None => Vec::new(),
    }
}

proptest! {
    #[test]
    fn random_sessions_keep_roster_and_ledger_consistent(
        tiered in any::<bool>(),
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 1..120),
    ) {
        let cfg = if tiered { SessionConfig::tiered() } else { SessionConfig::default() };
        let ledger = WinnerLedger::load(Box::new(MemoryStore::new()), cfg.storage_key.clone());
        let mut session = DrawSession::with_rng(ledger, &cfg, StdRng::seed_from_u64(seed));
        let mut expected_ledger_len = 0usize;

        for action in actions {
            let roster_before = session.roster().len();
            match action {
                Action::Import { count } => {
                    let res = session.import_rows(&rows(count));
                    if session.is_running() {
                        prop_assert!(res.is_err());
                    } else {
                        prop_assert_eq!(session.roster().len(), usize::from(count));
                    }
                }
                Action::Select { tier } => session.select_award(AwardTier::ALL[usize::from(tier)]),
                Action::Override => {
                    let _ = session.set_special_override("Z");
                }
                Action::Start => {
                    let was_ready = session.can_start();
                    prop_assert_eq!(session.start(), was_ready);
                }
                Action::Tick => {
                    let running = session.is_running();
                    prop_assert_eq!(session.tick().is_some(), running);
                    if running {
                        prop_assert!(session.current_index() < session.roster().len());
                    }
                }
                Action::Stop => {
                    let running = session.is_running();
                    let override_path = running
                        && session.selected_award() == Some(AwardTier::Special)
                        && tiered
                        && session.special_override().is_some();
                    match session.stop() {
                        Some(w) => {
                            prop_assert!(running);
                            expected_ledger_len += 1;
                            let expected_roster = if override_path { roster_before } else { roster_before - 1 };
                            prop_assert_eq!(session.roster().len(), expected_roster);
                            if override_path {
                                prop_assert_eq!(w.name.as_str(), "Z");
                            }
                        }
                        None => prop_assert!(!running),
                    }
                }
                Action::Delete { target } => {
                    let ids: Vec<_> = session.ledger().all().iter().map(|w| w.id).collect();
                    if !ids.is_empty() {
                        let id = ids[usize::from(target) % ids.len()];
                        prop_assert!(session.delete_winner(id));
                        expected_ledger_len -= 1;
                    }
                }
            }

            prop_assert_eq!(session.ledger().len(), expected_ledger_len);
            let ids: HashSet<_> = session.ledger().all().iter().map(|w| w.id).collect();
            prop_assert_eq!(ids.len(), expected_ledger_len);
            prop_assert_eq!(persisted(&session), session.ledger().all().to_vec());
            if session.roster().is_empty() {
                prop_assert!(!session.can_start());
            }
            prop_assert_eq!(session.is_running(), session.phase() == Phase::Spinning);
        }
    }
}
