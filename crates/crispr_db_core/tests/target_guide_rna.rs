use crispr_db_core::{
    Entity, EntityRepository, GuideRna, OffTargetInfo, Plate, RepoError, Session, Status,
    StoreConfig, Strand, Target, ValidationError,
};
use rusqlite::Connection;
use std::rc::Rc;

fn target(name: &str) -> Rc<Target> {
    let mut target = Target::new(name, 2_000, 2_400, Strand::Forward, "crispr");
    target.chr = Some("11".to_string());
    target.gene_id = Some("ENSDARG00000013477".to_string());
    target.species = Some("zebrafish".to_string());
    Rc::new(target)
}

fn guide(name: &str, target: &Rc<Target>) -> GuideRna {
    GuideRna::new(
        name,
        "GGTCACGTACGTACGTACGTAGG",
        2_010,
        2_032,
        Strand::Forward,
        target.clone(),
    )
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn target_round_trip_preserves_scalars() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::for_path(dir.path().join("targets.db"));
    let session = Session::open(&config).unwrap();
    let target = target("slc24a5");
    session.targets().store(&target).unwrap();

    let fresh = Session::open(&config).unwrap();
    let loaded = fresh.targets().fetch_by_name("slc24a5").unwrap();
    assert_eq!(loaded.id(), target.id());
    assert_eq!(loaded.chr.as_deref(), Some("11"));
    assert_eq!(loaded.start, 2_000);
    assert_eq!(loaded.end, 2_400);
    assert_eq!(loaded.strand, Strand::Forward);
    assert_eq!(loaded.gene_id.as_deref(), Some("ENSDARG00000013477"));
    assert_eq!(loaded.requestor, "crispr");
    assert_eq!(loaded.status, Status::Requested);
}

#[test]
fn storing_guide_creates_missing_target_first() {
    let session = Session::open_in_memory().unwrap();
    let target = target("tyr");
    let mut guide = guide("tyr_A", &target);
    guide.score = Some(0.82);
    guide.plate = Some(Rc::new(Plate::new("CR_000001", "96")));
    guide.well_id = Some("A01".to_string());
    let guide = Rc::new(guide);

    session.guide_rnas().store(&guide).unwrap();

    let target_id = target.id().expect("target gains an id");
    let stored_fk: i64 = session
        .connection()
        .query_row(
            "SELECT target_id FROM guide_rna WHERE guide_rna_id = ?1",
            [guide.id().unwrap()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_fk, target_id);
    assert!(guide.plate.as_ref().unwrap().id().is_some());

    let fetched = session.guide_rnas().fetch_by_name("tyr_A").unwrap();
    assert!(Rc::ptr_eq(&fetched, &guide));
    assert!(Rc::ptr_eq(&session.targets().fetch_by_id(target_id).unwrap(), &target));
}

#[test]
fn existing_target_is_resolved_by_name() {
    let session = Session::open_in_memory().unwrap();
    session
        .connection()
        .execute(
            "INSERT INTO target (target_id, target_name, target_start, target_end, target_strand, requestor, status_id)
             VALUES (21, 'mitfa', 2000, 2400, 1, 'crispr', 1)",
            [],
        )
        .unwrap();

    let unsaved = target("mitfa");
    let guide = Rc::new(guide("mitfa_A", &unsaved));
    session.guide_rnas().store(&guide).unwrap();

    assert_eq!(unsaved.id(), Some(21));
    assert_eq!(row_count(session.connection(), "target"), 1);
}

#[test]
fn fetch_by_unknown_name_is_not_found() {
    let session = Session::open_in_memory().unwrap();
    let err = session.targets().fetch_by_name("missing").unwrap_err();
    match err {
        RepoError::NotFound { entity, key } => {
            assert_eq!(entity, "target");
            assert_eq!(key, "missing");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(session.targets().fetch_all_by_gene_id("none").unwrap().is_empty());
}

#[test]
fn status_filter_uses_status_codes() {
    let session = Session::open_in_memory().unwrap();
    let requested = target("gata2a");
    session.targets().store(&requested).unwrap();

    let mut injected = Target::new("gata2b", 1, 50, Strand::Reverse, "crispr");
    injected.status = Status::Injected;
    let injected = Rc::new(injected);
    session.targets().store(&injected).unwrap();

    let stored_code: i64 = session
        .connection()
        .query_row(
            "SELECT status_id FROM target WHERE target_name = 'gata2b'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_code, 5);

    let found = session.targets().fetch_all_by_status(Status::Injected).unwrap();
    assert_eq!(found.len(), 1);
    assert!(Rc::ptr_eq(&found[0], &injected));
}

#[test]
fn invalid_guide_is_rejected_before_any_write() {
    let session = Session::open_in_memory().unwrap();
    let target = target("sox10");
    let guide = Rc::new(GuideRna::new(
        "sox10_A",
        "GGTXACGT",
        10,
        30,
        Strand::Forward,
        target.clone(),
    ));

    let err = session.guide_rnas().store(&guide).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidSequence { .. })
    ));
    assert_eq!(row_count(session.connection(), "target"), 0);
    assert_eq!(target.id(), None);
}

#[test]
fn storing_twice_is_rejected() {
    let session = Session::open_in_memory().unwrap();
    let target = target("pax2a");
    session.targets().store(&target).unwrap();

    let err = session.targets().store(&target).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::AlreadyStored { entity: "target", .. })
    ));
}

#[test]
fn off_target_info_without_hits_is_a_no_op() {
    let session = Session::open_in_memory().unwrap();
    let guide = Rc::new(guide("shha_A", &target("shha")));
    session.guide_rnas().store(&guide).unwrap();

    let written = session
        .guide_rnas()
        .store_off_target_info(&guide, &OffTargetInfo::default())
        .unwrap();
    assert_eq!(written, 0);
    assert_eq!(row_count(session.connection(), "guide_rna_off_target"), 0);
}

#[test]
fn off_target_info_round_trips() {
    let session = Session::open_in_memory().unwrap();
    let guide = Rc::new(guide("fgf8a_A", &target("fgf8a")));
    session.guide_rnas().store(&guide).unwrap();

    let info = OffTargetInfo {
        exon: vec!["5:1200:1".to_string()],
        intron: vec!["7:300:-1".to_string(), "7:900:1".to_string()],
        nongenic: Vec::new(),
    };
    let written = session.guide_rnas().store_off_target_info(&guide, &info).unwrap();
    assert_eq!(written, 3);

    let loaded = session.guide_rnas().fetch_off_target_info(&guide).unwrap();
    assert_eq!(loaded, info);
    assert_eq!(loaded.total_hits(), 3);
}

#[test]
fn off_target_info_requires_stored_guide() {
    let session = Session::open_in_memory().unwrap();
    let guide = guide("wnt5b_A", &target("wnt5b"));
    let info = OffTargetInfo {
        exon: vec!["1:1:1".to_string()],
        ..OffTargetInfo::default()
    };

    let err = session
        .guide_rnas()
        .store_off_target_info(&guide, &info)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NotStored("guide_rna"))
    ));
}
