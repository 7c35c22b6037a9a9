use std::collections::HashSet;
use std::thread;

use conta::config::GeneratorConfig;
use conta::db;
use conta::generator::PrefixedIdGenerator;
use rusqlite::Connection;
use tempfile::TempDir;

const THREADS: usize = 4;
const PER_THREAD: usize = 25;

fn open_worker_conn(path: &std::path::Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.pragma_update(None, "busy_timeout", 10_000).unwrap();
    conn
}

fn run_workers(config: &GeneratorConfig, shared_generator: bool) -> Vec<Vec<i64>> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conta.db");
    {
        let conn = Connection::open(&path).unwrap();
        db::ensure_table(&conn, config).unwrap();
    }

    let shared = if shared_generator {
        Some(std::sync::Arc::new(
            PrefixedIdGenerator::new(config.clone()).unwrap(),
        ))
    } else {
        None
    };

    let mut handles = Vec::new();
    for _ in 0..THREADS {
        let path = path.clone();
        let config = config.clone();
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            let conn = open_worker_conn(&path);
            let own;
            let generator = match &shared {
                Some(g) => g.as_ref(),
                None => {
                    own = PrefixedIdGenerator::new(config).unwrap();
                    &own
                }
            };
            (0..PER_THREAD)
                .map(|_| generator.next_raw(&conn, "JOB").unwrap())
                .collect::<Vec<i64>>()
        }));
    }

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn direct_concurrent_allocations_are_unique_and_gap_free() {
    // raised retry cap: every thread contends on one segment
    let config = GeneratorConfig::default().max_retries(10_000);
    let per_thread = run_workers(&config, true);

    for values in &per_thread {
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "thread sequence not increasing: {values:?}");
        }
    }

    let all: HashSet<i64> = per_thread.iter().flatten().copied().collect();
    assert_eq!(all.len(), THREADS * PER_THREAD, "duplicate values handed out");

    let expected: HashSet<i64> = (1..=(THREADS * PER_THREAD) as i64).collect();
    assert_eq!(all, expected, "direct strategy must be gap-free");
}

#[test]
fn pooled_concurrent_allocations_are_unique() {
    // one generator per thread: separate in-memory pools, like separate
    // processes sharing the table
    let config = GeneratorConfig::default()
        .increment_size(7)
        .max_retries(10_000);
    let per_thread = run_workers(&config, false);

    for values in &per_thread {
        for pair in values.windows(2) {
            assert!(pair[0] < pair[1], "thread sequence not increasing: {values:?}");
        }
    }

    let all: HashSet<i64> = per_thread.iter().flatten().copied().collect();
    assert_eq!(all.len(), THREADS * PER_THREAD, "duplicate values handed out");
}

#[test]
fn pooled_shared_generator_is_thread_safe() {
    // threads also contend on the in-process block pool
    let config = GeneratorConfig::default()
        .increment_size(5)
        .max_retries(10_000);
    let per_thread = run_workers(&config, true);

    let all: Vec<i64> = per_thread.iter().flatten().copied().collect();
    let unique: HashSet<i64> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len(), "duplicate values handed out");
}
