use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rand::{SeedableRng, rngs::StdRng};

use drawlog::{
    config::SessionConfig,
    core::ledger::WinnerLedger,
    import::{ImportError, SheetRow, SpreadsheetAdapter},
    persist::memory::MemoryStore,
    session::machine::{DrawSession, OverrideError, StatusLine},
    types::{AwardTier, Phase},
    winner::ExportRow,
};

fn rows(names: &[&str]) -> Vec<SheetRow> {
    names
        .iter()
        .map(|n| SheetRow::new().with_field("姓名", *n))
        .collect()
}

fn session(cfg: &SessionConfig, seed: u64) -> DrawSession {
    let ledger = WinnerLedger::load(Box::new(MemoryStore::new()), cfg.storage_key.clone());
    DrawSession::with_rng(ledger, cfg, StdRng::seed_from_u64(seed))
}

struct FakeWorkbooks {
    rows: Result<Vec<SheetRow>, ImportError>,
    written: Arc<Mutex<Vec<ExportRow>>>,
}

impl FakeWorkbooks {
    fn parsing(rows: Result<Vec<SheetRow>, ImportError>) -> Self {
        Self {
            rows,
            written: Arc::default(),
        }
    }
}

impl SpreadsheetAdapter for FakeWorkbooks {
    fn parse_rows(&self, _bytes: &[u8]) -> Result<Vec<SheetRow>, ImportError> {
        self.rows.clone()
    }

    fn write_workbook(&self, rows: &[ExportRow]) -> Result<Vec<u8>, ImportError> {
        self.written.lock().expect("lock").extend_from_slice(rows);
        Ok(b"xlsx".to_vec())
    }
}

#[test]
fn plain_draw_records_winner_and_removes_from_roster() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 1);
    assert_eq!(s.import_rows(&rows(&["甲", "乙", "丙"])), Ok(3));
    assert_eq!(s.roster().len(), 3);

    assert!(s.start());
    assert_eq!(s.phase(), Phase::Spinning);
    for _ in 0..5 {
        let tick = s.tick().expect("tick");
        assert!(!tick.from_override);
    }
    let landed = s.roster().get(s.current_index()).expect("index").to_string();
    let winner = s.stop().expect("winner");

    assert_eq!(winner.name, landed);
    assert!(["甲", "乙", "丙"].contains(&winner.name.as_str()));
    assert_eq!(winner.award, None);
    assert_eq!(s.ledger().len(), 1);
    assert_eq!(s.roster().len(), 2);
    assert!(!s.roster().names().contains(&winner.name));
    assert_eq!(s.phase(), Phase::Idle);
    assert_eq!(s.status_line(), StatusLine::Ready { remaining: 2 });
}

#[test]
fn stop_without_tick_uses_initial_pick() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 9);
    s.import_rows(&rows(&["甲", "乙"])).expect("import");
    assert!(s.start());
    assert!(s.stop().is_some());
    assert_eq!(s.roster().len(), 1);
}

#[test]
fn special_override_wins_and_roster_is_untouched() {
    let cfg = SessionConfig::tiered();
    let mut s = session(&cfg, 2);
    s.import_rows(&rows(&["甲", "乙", "丙"])).expect("import");

    s.select_award("特等奖".parse().expect("tier"));
    assert_eq!(s.phase(), Phase::AwardSelected);
    s.set_special_override(" 张三 ").expect("override");

    assert!(s.start());
    let ticks: Vec<_> = (0..64).map(|_| s.tick().expect("tick")).collect();
    assert!(ticks.iter().any(|t| t.from_override && t.name == "张三"));
    assert!(ticks.iter().any(|t| !t.from_override));

    let winner = s.stop().expect("winner");
    assert_eq!(winner.name, "张三");
    assert_eq!(winner.award, Some(AwardTier::Special));
    assert_eq!(s.roster().len(), 3);
    assert_eq!(s.phase(), Phase::AwardSelected);
}

#[test]
fn override_is_ignored_for_other_tiers() {
    let cfg = SessionConfig::tiered();
    let mut s = session(&cfg, 3);
    s.import_rows(&rows(&["甲", "乙", "丙"])).expect("import");
    s.set_special_override("张三").expect("override");
    s.select_award(AwardTier::Second);

    assert!(s.start());
    assert!((0..32).all(|_| !s.tick().expect("tick").from_override));
    let winner = s.stop().expect("winner");
    assert_ne!(winner.name, "张三");
    assert_eq!(winner.award, Some(AwardTier::Second));
    assert_eq!(s.roster().len(), 2);
}

#[test]
fn non_finite_override_probability_falls_back_to_even_odds() {
    for p in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let cfg = SessionConfig {
            override_probability: p,
            ..SessionConfig::tiered()
        };
        let mut s = session(&cfg, 7);
        s.import_rows(&rows(&["甲", "乙"])).expect("import");
        s.select_award(AwardTier::Special);
        s.set_special_override("张三").expect("override");

        assert!(s.start());
        let ticks: Vec<_> = (0..64).map(|_| s.tick().expect("tick")).collect();
        assert!(ticks.iter().any(|t| t.from_override));
        assert!(ticks.iter().any(|t| !t.from_override));
        assert_eq!(s.stop().expect("winner").name, "张三");
    }
}

#[test]
fn override_is_one_shot() {
    let cfg = SessionConfig::tiered();
    let mut s = session(&cfg, 4);
    assert_eq!(s.set_special_override("  "), Err(OverrideError::Empty));
    s.set_special_override("张三").expect("first");
    assert_eq!(
        s.set_special_override("李四"),
        Err(OverrideError::Locked("张三".to_string()))
    );
    assert_eq!(s.special_override(), Some("张三"));
}

#[test]
fn tiered_start_requires_award() {
    let cfg = SessionConfig::tiered();
    let mut s = session(&cfg, 5);
    s.import_rows(&rows(&["甲"])).expect("import");
    assert_eq!(s.status_line(), StatusLine::AwaitingAward { remaining: 1 });
    assert!(!s.can_start());
    assert!(!s.start());
    assert_eq!(s.phase(), Phase::Idle);

    s.select_award(AwardTier::Third);
    assert!(s.start());
}

#[test]
fn invalid_import_disarms_start() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 6);
    s.import_rows(&rows(&["甲", "乙"])).expect("import");

    assert_eq!(
        s.import_rows(&rows(&["", "   "])),
        Err(ImportError::NoValidNames)
    );
    assert_eq!(s.roster().len(), 0);
    assert!(!s.start());
    assert_ne!(s.phase(), Phase::Spinning);
    assert_eq!(s.status_line(), StatusLine::AwaitingImport);
}

#[test]
fn draining_the_roster_disarms_start() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 7);
    let names = ["甲", "乙", "丙", "丁", "戊"];
    s.import_rows(&rows(&names)).expect("import");

    for drawn in 1..=names.len() {
        assert!(s.start());
        s.tick();
        s.stop().expect("winner");
        assert_eq!(s.roster().len(), names.len() - drawn);
    }

    assert!(!s.can_start());
    assert!(!s.start());
    assert_eq!(s.status_line(), StatusLine::Exhausted);
    let mut won: Vec<_> = s.ledger().all().iter().map(|w| w.name.clone()).collect();
    won.sort();
    let mut expected: Vec<_> = names.iter().map(|n| n.to_string()).collect();
    expected.sort();
    assert_eq!(won, expected);
}

#[test]
fn precondition_violations_are_no_ops() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 8);
    assert!(s.stop().is_none());
    assert!(s.tick().is_none());
    assert!(!s.start());

    s.import_rows(&rows(&["甲", "乙"])).expect("import");
    assert!(s.start());
    assert!(!s.start());
    assert_eq!(s.import_rows(&rows(&["丙"])), Err(ImportError::DrawInProgress));
    assert_eq!(s.roster().len(), 2);
    s.stop().expect("winner");
    assert!(s.stop().is_none());
    assert_eq!(s.ledger().len(), 1);
}

#[test]
fn delete_winner_leaves_roster_alone() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 10);
    s.import_rows(&rows(&["甲", "乙", "丙"])).expect("import");
    s.start();
    let w = s.stop().expect("winner");

    assert!(s.delete_winner(w.id));
    assert!(!s.delete_winner(w.id));
    assert!(s.ledger().is_empty());
    assert_eq!(s.roster().len(), 2);
}

#[test]
fn import_file_validates_before_parsing() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 11);
    let good = FakeWorkbooks::parsing(Ok(rows(&["甲", "乙"])));

    assert_eq!(s.import_file(&good, None, b""), Err(ImportError::NoFile));
    assert_eq!(s.import_file(&good, Some("names.XLSX"), b""), Ok(2));

    assert_eq!(
        s.import_file(&good, Some("names.csv"), b""),
        Err(ImportError::UnsupportedExtension("names.csv".to_string()))
    );
    assert_eq!(s.roster().len(), 2);

    let broken = FakeWorkbooks::parsing(Err(ImportError::Parse("bad zip".to_string())));
    assert_eq!(
        s.import_file(&broken, Some("names.xls"), b"junk"),
        Err(ImportError::Parse("bad zip".to_string()))
    );
    assert!(s.roster().is_empty());
}

#[test]
fn export_names_file_by_date_and_writes_rows_newest_first() {
    let cfg = SessionConfig::default();
    let mut s = session(&cfg, 12);
    s.import_rows(&rows(&["甲", "乙"])).expect("import");
    s.start();
    let first = s.stop().expect("first");
    s.start();
    let second = s.stop().expect("second");

    let workbooks = FakeWorkbooks::parsing(Ok(Vec::new()));
    let today = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");
    let export = s.export(&workbooks, today).expect("export");

    assert_eq!(export.file_name, "中奖名单_20240305.xlsx");
    assert_eq!(export.bytes, b"xlsx");
    let written = workbooks.written.lock().expect("lock");
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].index, 1);
    assert_eq!(written[0].name, second.name);
    assert_eq!(written[1].name, first.name);
    assert_eq!(written[1].award, None);
}
