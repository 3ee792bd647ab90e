// Concurrent audit writer integration tests
//
// Exercises the writer the way a request pipeline does: one record per
// transaction, many transactions completing at once, no coordination
// between callers beyond sharing the writer.

use super::test_harness::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use std::sync::Barrier;
use tempfile::TempDir;
use waf_auditlog::audit::path::local_time;
use waf_auditlog::id::random_string;
use waf_auditlog::{AuditError, AuditLog, ConcurrentWriter, JsonFormatter, Writer, WriterConfig};

const BASE_NANOS: i64 = 1_705_314_642_000_000_000;

#[test]
fn test_writer_without_init_closes_without_side_effects() {
    let tmp = TempDir::new().unwrap();
    let mut writer = ConcurrentWriter::default();

    assert!(writer.close().is_ok());
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn test_init_fails_on_missing_audit_file_parent_with_valid_dir() {
    let tmp = TempDir::new().unwrap();
    let config = WriterConfig::new(tmp.path(), tmp.path().join("nope").join("audit.log"))
        .with_modes(0o777, 0o777);

    let mut writer = ConcurrentWriter::new();
    let err = writer.init(config).unwrap_err();

    assert!(matches!(err, AuditError::Config(_)), "got: {:?}", err);
    assert!(err.to_string().contains("audit.log"));
}

#[test]
fn test_record_lands_at_time_bucketed_path_and_round_trips() {
    let tree = AuditTree::new();
    let writer = tree.writer();
    let now = AuditLog::new("123").unix_timestamp();
    let log = sample_log("123", now);

    writer.write(&log).unwrap();

    let ts = local_time(now);
    let expected = tree
        .records_dir()
        .join(ts.format("%Y%m%d").to_string())
        .join(ts.format("%Y%m%d-%H%M").to_string())
        .join(format!("{}-123", ts.format("%Y%m%d-%H%M%S")));
    let data = fs::read(&expected).expect("record file should exist");
    assert_eq!(JsonFormatter::parse(&data).unwrap(), log);
}

#[test]
fn test_records_in_same_minute_share_bucket() {
    let tree = AuditTree::new();
    let writer = tree.writer();

    writer.write(&sample_log("a", BASE_NANOS)).unwrap();
    writer
        .write(&sample_log("b", BASE_NANOS + 10_000_000_000))
        .unwrap();

    let files = files_under(&tree.records_dir());
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].parent(), files[1].parent());
}

#[test]
fn test_same_id_and_second_is_rejected() {
    let tree = AuditTree::new();
    let writer = tree.writer();
    let first = sample_log("same", BASE_NANOS);
    let second = sample_log("same", BASE_NANOS + 250_000_000).with_server_id("second");

    writer.write(&first).unwrap();
    let err = writer.write(&second).unwrap_err();
    assert!(matches!(err, AuditError::Collision { .. }), "got: {:?}", err);

    let files = files_under(&tree.records_dir());
    assert_eq!(files.len(), 1);
    assert_eq!(
        JsonFormatter::parse(&fs::read(&files[0]).unwrap()).unwrap(),
        first
    );
}

#[test]
fn test_concurrent_writes_from_threads_stay_isolated() {
    const WRITERS: usize = 64;

    let tree = AuditTree::new();
    let writer = Arc::new(tree.writer());
    let barrier = Arc::new(Barrier::new(WRITERS));

    // Same second for every record so all threads race on the same buckets
    let logs: Vec<AuditLog> = (0..WRITERS)
        .map(|_| sample_log(&random_string(32), BASE_NANOS))
        .collect();

    std::thread::scope(|s| {
        for log in &logs {
            let writer = Arc::clone(&writer);
            let barrier = Arc::clone(&barrier);
            s.spawn(move || {
                barrier.wait();
                writer.write(log).expect("concurrent write failed");
            });
        }
    });

    for log in &logs {
        let data = fs::read(writer.record_path(log).unwrap()).unwrap();
        assert_eq!(&JsonFormatter::parse(&data).unwrap(), log);
    }
    assert_eq!(files_under(&tree.records_dir()).len(), WRITERS);
}

#[test]
fn test_parallel_writes_across_buckets() {
    const RECORDS: usize = 2_000;

    let tree = AuditTree::new();
    let writer = tree.writer();

    // Spread over several minutes so bucket directories are created concurrently
    let logs: Vec<AuditLog> = (0..RECORDS)
        .map(|i| sample_log(&random_string(24), BASE_NANOS + (i as i64 % 300) * 1_000_000_000))
        .collect();

    logs.par_iter()
        .try_for_each(|log| writer.write(log))
        .expect("parallel writes failed");

    let files = files_under(&tree.records_dir());
    assert_eq!(files.len(), RECORDS);

    let ids: HashSet<String> = files
        .par_iter()
        .map(|path| {
            let log = JsonFormatter::parse(&fs::read(path).unwrap()).unwrap();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.ends_with(&format!("-{}", log.id())));
            log.id().to_string()
        })
        .collect();
    assert_eq!(ids.len(), RECORDS);
}

#[test]
fn test_duplicate_submissions_race_exactly_one_winner() {
    const ATTEMPTS: usize = 16;

    let tree = AuditTree::new();
    let writer = tree.writer();
    let barrier = Barrier::new(ATTEMPTS);
    let log = sample_log("contended", BASE_NANOS);

    let results: Vec<Result<(), AuditError>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    writer.write(&log)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let collisions = results
        .iter()
        .filter(|r| matches!(r, Err(AuditError::Collision { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(collisions, ATTEMPTS - 1);
}
