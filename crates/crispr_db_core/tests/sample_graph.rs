use crispr_db_core::{
    Entity, EntityRepository, Generation, GuideRna, InjectionPool, PairType, Primer, PrimerPair,
    RepoError, Sample, Session, StoreConfig, Strand, Subplex, Target, ValidationError,
};
use rusqlite::Connection;
use std::rc::Rc;

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}

struct Graph {
    target: Rc<Target>,
    guides: Vec<Rc<GuideRna>>,
    pool: Rc<InjectionPool>,
    pair: Rc<PrimerPair>,
    subplex: Rc<Subplex>,
}

fn unsaved_graph() -> Graph {
    let target = Rc::new(Target::new("nacre", 4_000, 4_600, Strand::Forward, "crispr"));
    let guides: Vec<Rc<GuideRna>> = ["nacre_A", "nacre_B"]
        .iter()
        .enumerate()
        .map(|(offset, name)| {
            let start = 4_100 + offset as i64 * 100;
            Rc::new(GuideRna::new(
                *name,
                "GGTCACGTACGTACGTACGTAGG",
                start,
                start + 22,
                Strand::Forward,
                target.clone(),
            ))
        })
        .collect();

    let mut pool = InjectionPool::new("20240611_nacre", "protein", "sgRNA", "2024-06-11");
    pool.cas9_concentration = Some(200.0);
    pool.line_injected = Some("AB".to_string());
    for guide in &guides {
        pool.add_guide_rna(guide.clone(), 50.0);
    }
    let pool = Rc::new(pool);

    let left = Rc::new(Primer::new("6", 4_050, 4_070, Strand::Forward, "ACGTTGCAACGTTGCAACGT"));
    let right = Rc::new(Primer::new("6", 4_380, 4_400, Strand::Reverse, "TTGCAACGTTGCAACGTTGC"));
    let pair = Rc::new(PrimerPair::new(PairType::Int, left, right, 350));
    let subplex = Rc::new(Subplex::new("plex_7", 3, 1, pair.clone()));

    Graph {
        target,
        guides,
        pool,
        pair,
        subplex,
    }
}

fn store_pair(session: &Session, graph: &Graph) {
    session
        .primer_pairs()
        .store_with_guide_rnas(&graph.pair, &graph.guides)
        .unwrap();
}

fn sample(graph: &Graph, number: i64) -> Rc<Sample> {
    let mut sample = Sample::new(graph.pool.clone(), number, Generation::G0, "embryo", "zebrafish");
    sample.subplex = Some(graph.subplex.clone());
    sample.well_id = Some(format!("A{number:02}"));
    Rc::new(sample)
}

#[test]
fn storing_sample_creates_pool_and_subplex_rows() {
    let session = Session::open_in_memory().unwrap();
    let graph = unsaved_graph();
    store_pair(&session, &graph);
    let first = sample(&graph, 1);

    session.samples().store(&first).unwrap();

    assert!(first.id().is_some());
    assert!(graph.pool.id().is_some());
    assert!(graph.subplex.id().is_some());
    assert!(graph.pair.id().is_some());
    assert!(graph.pair.left_primer.id().is_some());
    assert!(graph.target.id().is_some());
    for guide in &graph.guides {
        assert!(guide.id().is_some());
    }

    let conn = session.connection();
    assert_eq!(row_count(conn, "target"), 1);
    assert_eq!(row_count(conn, "guide_rna"), 2);
    assert_eq!(row_count(conn, "injection_guide_rna"), 2);
    assert_eq!(row_count(conn, "primer"), 2);
    assert_eq!(row_count(conn, "primer_pair"), 1);
    assert_eq!(row_count(conn, "amplicon_guide_rna"), 2);
    assert_eq!(row_count(conn, "subplex"), 1);
    assert_eq!(row_count(conn, "sample"), 1);

    let second = sample(&graph, 2);
    session.samples().store(&second).unwrap();
    assert_eq!(row_count(conn, "injection"), 1);
    assert_eq!(row_count(conn, "subplex"), 1);
    assert_eq!(row_count(conn, "sample"), 2);
}

#[test]
fn hydrated_graph_shares_instances_across_paths() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::for_path(dir.path().join("samples.db"));
    let writer = Session::open(&config).unwrap();
    let graph = unsaved_graph();
    store_pair(&writer, &graph);
    writer.samples().store(&sample(&graph, 1)).unwrap();
    writer.samples().store(&sample(&graph, 2)).unwrap();

    let reader = Session::open(&config).unwrap();
    let pool = reader.injection_pools().fetch_by_name("20240611_nacre").unwrap();
    assert_eq!(pool.cas9_concentration, Some(200.0));
    assert_eq!(pool.line_injected.as_deref(), Some("AB"));
    assert_eq!(pool.guide_rnas.len(), 2);
    assert_eq!(pool.guide_rnas[0].concentration, 50.0);

    let samples = reader.samples().fetch_all_by_injection_pool(&pool).unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].name, "20240611_nacre_1");
    assert_eq!(samples[1].well_id.as_deref(), Some("A02"));
    for sample in &samples {
        assert!(Rc::ptr_eq(&sample.injection_pool, &pool));
        assert_eq!(sample.generation, Generation::G0);
    }

    let subplex_first = samples[0].subplex.as_ref().unwrap();
    let subplex_second = samples[1].subplex.as_ref().unwrap();
    assert!(Rc::ptr_eq(subplex_first, subplex_second));
    let by_plex = reader.subplexes().fetch_all_by_plex_name("plex_7").unwrap();
    assert!(Rc::ptr_eq(&by_plex[0], subplex_first));
    assert_eq!(reader.samples().fetch_all_by_subplex(subplex_first).unwrap().len(), 2);

    let guide = reader.guide_rnas().fetch_by_name("nacre_B").unwrap();
    assert!(Rc::ptr_eq(&pool.guide_rnas[1].guide_rna, &guide));
    let target = reader.targets().fetch_by_name("nacre").unwrap();
    assert!(Rc::ptr_eq(&pool.guide_rnas[0].guide_rna.target, &target));
    assert!(Rc::ptr_eq(&guide.target, &target));

    let by_date = reader.injection_pools().fetch_all_by_date("2024-06-11").unwrap();
    assert!(Rc::ptr_eq(&by_date[0], &pool));
}

#[test]
fn pool_without_guides_is_rejected() {
    let session = Session::open_in_memory().unwrap();
    let pool = Rc::new(InjectionPool::new("empty", "protein", "sgRNA", "2024-06-11"));

    let err = session.injection_pools().store(&pool).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingAssociation {
            entity: "injection_pool",
            association: "guide_rna"
        })
    ));
}

#[test]
fn subplex_with_unstored_pair_is_rejected() {
    let session = Session::open_in_memory().unwrap();
    let graph = unsaved_graph();

    let err = session.samples().store(&sample(&graph, 1)).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::MissingAssociation {
            entity: "primer_pair",
            association: "guide_rna"
        })
    ));
    assert_eq!(graph.pair.id(), None);
    assert_eq!(graph.pool.id(), None);
    assert_eq!(row_count(session.connection(), "target"), 0);
    assert_eq!(row_count(session.connection(), "primer_pair"), 0);

    store_pair(&session, &graph);
    session.samples().store(&sample(&graph, 1)).unwrap();
    let pairs = session
        .primer_pairs()
        .fetch_all_by_guide_rna(&graph.guides[0])
        .unwrap();
    assert_eq!(pairs.len(), 1);
    assert!(Rc::ptr_eq(&pairs[0], &graph.pair));
}

#[test]
fn invalid_dependency_blocks_sample_store() {
    let session = Session::open_in_memory().unwrap();
    let graph = unsaved_graph();
    let mut pool = InjectionPool::new("bad_date", "protein", "sgRNA", "11/06/2024");
    pool.add_guide_rna(graph.guides[0].clone(), 25.0);
    let sample = Rc::new(Sample::new(Rc::new(pool), 1, Generation::F1, "fin_clip", "zebrafish"));

    let err = session.samples().store(&sample).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidDate(_))
    ));
    assert_eq!(row_count(session.connection(), "target"), 0);
}

#[test]
fn existing_subplex_is_resolved_by_natural_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::for_path(dir.path().join("subplex.db"));
    let writer = Session::open(&config).unwrap();
    let graph = unsaved_graph();
    store_pair(&writer, &graph);
    writer.samples().store(&sample(&graph, 1)).unwrap();
    let subplex_id = graph.subplex.id().unwrap();

    let reader = Session::open(&config).unwrap();
    let pair = reader.primer_pairs().fetch_by_id(graph.pair.id().unwrap()).unwrap();
    let pool = reader.injection_pools().fetch_by_name("20240611_nacre").unwrap();
    let same_key = Rc::new(Subplex::new("plex_7", 3, 1, pair));
    let mut other = Sample::new(pool, 9, Generation::G0, "embryo", "zebrafish");
    other.subplex = Some(same_key.clone());
    reader.samples().store(&Rc::new(other)).unwrap();

    assert_eq!(same_key.id(), Some(subplex_id));
    assert_eq!(row_count(reader.connection(), "subplex"), 1);
    assert_eq!(
        reader.subplexes().fetch_id_by_natural_key(&same_key).unwrap(),
        Some(subplex_id)
    );
    let by_plex = reader.subplexes().fetch_all_by_plex_name("plex_7").unwrap();
    assert!(Rc::ptr_eq(&by_plex[0], &same_key));
}
