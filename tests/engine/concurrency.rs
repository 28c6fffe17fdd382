//! Concurrency Tests
//!
//! Parallel opens, writers and readers sharing one connection.

use crate::common::*;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

#[test]
fn parallel_opens_share_one_connection() {
    init_tracing();
    let (_dir, path) = fresh_path("shared.redb");
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                barrier.wait();
                Connection::open(&path).unwrap()
            })
        })
        .collect();

    let conns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for conn in &conns[1..] {
        assert!(Arc::ptr_eq(&conns[0], conn));
    }
    conns[0].close().unwrap();
}

#[test]
fn concurrent_writers_to_distinct_keys() {
    let test_conn = TestConn::new();
    let per_thread = 50;

    thread::scope(|s| {
        for t in 0..THREADS {
            let conn = &test_conn.conn;
            s.spawn(move || {
                for i in 0..per_thread {
                    let key = format!("{t}:{i}");
                    conn.put(b"bucket", key.as_bytes(), key.as_bytes()).unwrap();
                }
            });
        }
    });

    for t in 0..THREADS {
        for i in 0..per_thread {
            let key = format!("{t}:{i}");
            assert_value(&test_conn.conn, b"bucket", key.as_bytes(), key.as_bytes());
        }
    }
}

#[test]
fn concurrent_writers_same_key_last_write_visible() {
    let test_conn = TestConn::new();

    thread::scope(|s| {
        for t in 0..THREADS {
            let conn = &test_conn.conn;
            s.spawn(move || {
                for _ in 0..20 {
                    conn.put(b"bucket", b"contended", format!("{t}").as_bytes()).unwrap();
                }
            });
        }
    });

    let value = test_conn.conn.get(b"bucket", b"contended").unwrap();
    let writer: usize = String::from_utf8(value).unwrap().parse().unwrap();
    assert!(writer < THREADS);
}

#[test]
fn readers_never_see_partial_values() {
    let test_conn = TestConn::new();
    let old = vec![b'o'; 4096];
    let new = vec![b'n'; 4096];
    test_conn.conn.put(b"bucket", b"blob", &old).unwrap();

    thread::scope(|s| {
        let conn = &test_conn.conn;
        let (old, new) = (&old, &new);

        s.spawn(move || {
            for i in 0..100 {
                let value = if i % 2 == 0 { new } else { old };
                conn.put(b"bucket", b"blob", value).unwrap();
            }
        });

        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..200 {
                    let value = conn.get(b"bucket", b"blob").unwrap();
                    assert!(value == *old || value == *new, "torn read");
                }
            });
        }
    });
}

#[test]
fn opens_through_shared_handle_see_writes() {
    let (_dir, path) = fresh_path("visible.redb");
    let writer = open(&path);

    let reader = thread::spawn({
        let path = path.clone();
        move || {
            let conn = Connection::open(&path).unwrap();
            conn.put(b"bucket", b"from_thread", b"yes").unwrap();
            conn
        }
    })
    .join()
    .unwrap();

    assert!(Arc::ptr_eq(&writer, &reader));
    assert_value(&writer, b"bucket", b"from_thread", b"yes");
    writer.close().unwrap();
}

#[test]
fn close_during_reads_fails_cleanly() {
    let (_dir, path) = fresh_path("closing.redb");
    let conn = open(&path);
    conn.put(b"bucket", b"key", b"value").unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            let conn = &conn;
            s.spawn(move || {
                for _ in 0..100 {
                    match conn.get(b"bucket", b"key") {
                        Ok(value) => assert_eq!(value, b"value"),
                        Err(Error::Closed { .. }) => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            });
        }
        s.spawn(|| conn.close().unwrap());
    });

    assert!(conn.is_closed());
}
