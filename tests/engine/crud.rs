//! Bucket CRUD Tests
//!
//! Get, put, delete and delete-bucket behavior through a shared connection.

use crate::common::*;

// ============================================================================
// Put / Get
// ============================================================================

#[test]
fn put_then_get_returns_value() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"a", b"val_a").unwrap();
    conn.put(b"bucket", b"b", b"val_b").unwrap();
    conn.put(b"bucket", b"c", b"val_c").unwrap();

    assert_value(conn, b"bucket", b"a", b"val_a");
    assert_value(conn, b"bucket", b"b", b"val_b");
    assert_value(conn, b"bucket", b"c", b"val_c");
}

#[test]
fn put_overwrites_existing_value() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"key", b"first").unwrap();
    conn.put(b"bucket", b"key", b"second").unwrap();

    assert_value(conn, b"bucket", b"key", b"second");
}

#[test]
fn put_creates_bucket_implicitly() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    assert_bucket_not_found(conn, b"fresh", b"key");
    conn.put(b"fresh", b"key", b"value").unwrap();
    assert_value(conn, b"fresh", b"key", b"value");
}

#[test]
fn empty_value_is_stored_as_present() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"key", b"").unwrap();

    assert_eq!(conn.get(b"bucket", b"key").unwrap(), Vec::<u8>::new());
}

#[test]
fn binary_bucket_and_key_names() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;
    let bucket = [0u8, 0xff, b':', b'/'];
    let key = [0xde, 0xad, 0xbe, 0xef];

    conn.put(&bucket, &key, &[1, 2, 3]).unwrap();

    assert_value(conn, &bucket, &key, &[1, 2, 3]);
    assert_bucket_not_found(conn, &bucket[..2], &key);
}

#[test]
fn buckets_are_isolated() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"one", b"key", b"from_one").unwrap();
    conn.put(b"two", b"key", b"from_two").unwrap();

    assert_value(conn, b"one", b"key", b"from_one");
    assert_value(conn, b"two", b"key", b"from_two");
}

// ============================================================================
// Not Found
// ============================================================================

#[test]
fn get_missing_bucket_is_not_found() {
    let test_conn = TestConn::new();
    test_conn.conn.put(b"bucket", b"a", b"val_a").unwrap();

    assert_bucket_not_found(&test_conn.conn, b"not_found_bucket", b"a");
}

#[test]
fn get_missing_key_is_not_found() {
    let test_conn = TestConn::new();
    test_conn.conn.put(b"bucket", b"a", b"val_a").unwrap();

    assert_key_not_found(&test_conn.conn, b"bucket", b"not_found_key");
}

#[test]
fn other_errors_are_not_not_found() {
    let (_dir, path) = fresh_path("a.redb");
    let conn = open(&path);
    conn.close().unwrap();

    let err = conn.put(b"bucket", b"key", b"value").unwrap_err();
    assert!(!is_not_found(&err));
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn delete_removes_key() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"a", b"val_a").unwrap();
    conn.put(b"bucket", b"b", b"val_b").unwrap();
    conn.delete(b"bucket", b"a").unwrap();

    assert_key_not_found(conn, b"bucket", b"a");
    assert_value(conn, b"bucket", b"b", b"val_b");
}

#[test]
fn delete_missing_key_succeeds() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"a", b"val_a").unwrap();
    conn.delete(b"bucket", b"never_written").unwrap();

    assert_value(conn, b"bucket", b"a", b"val_a");
}

#[test]
fn delete_in_missing_bucket_succeeds_without_creating_it() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.delete(b"ghost", b"key").unwrap();

    assert_bucket_not_found(conn, b"ghost", b"key");
    let err = conn.delete_bucket(b"ghost").unwrap_err();
    assert!(matches!(err, Error::BucketNotFound));
}

#[test]
fn delete_is_persisted() {
    let mut test_conn = TestConn::new();
    test_conn.conn.put(b"bucket", b"a", b"val_a").unwrap();
    test_conn.conn.delete(b"bucket", b"a").unwrap();

    test_conn.reopen();

    assert_key_not_found(&test_conn.conn, b"bucket", b"a");
}

// ============================================================================
// Delete Bucket
// ============================================================================

#[test]
fn delete_bucket_removes_all_keys() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"a", b"val_a").unwrap();
    conn.put(b"bucket", b"b", b"val_b").unwrap();
    conn.put(b"other", b"a", b"kept").unwrap();
    conn.delete_bucket(b"bucket").unwrap();

    assert_bucket_not_found(conn, b"bucket", b"a");
    assert_bucket_not_found(conn, b"bucket", b"b");
    assert_value(conn, b"other", b"a", b"kept");
}

#[test]
fn delete_missing_bucket_is_not_found() {
    let test_conn = TestConn::new();

    let err = test_conn.conn.delete_bucket(b"not_found_bucket").unwrap_err();

    assert!(matches!(err, Error::BucketNotFound));
    assert!(is_not_found(&err));
}

#[test]
fn bucket_can_be_recreated_after_delete() {
    let test_conn = TestConn::new();
    let conn = &test_conn.conn;

    conn.put(b"bucket", b"a", b"old").unwrap();
    conn.delete_bucket(b"bucket").unwrap();
    conn.put(b"bucket", b"b", b"new").unwrap();

    assert_key_not_found(conn, b"bucket", b"a");
    assert_value(conn, b"bucket", b"b", b"new");
}

// ============================================================================
// Full Scenario
// ============================================================================

#[test]
fn full_bucket_scenario() {
    let (_dir, path) = fresh_path("scenario.redb");
    let conn = open(&path);

    conn.put(b"bucket", b"a", b"val_a").unwrap();
    conn.put(b"bucket", b"b", b"val_b").unwrap();
    conn.put(b"bucket", b"c", b"val_c").unwrap();

    assert_value(&conn, b"bucket", b"a", b"val_a");
    assert_value(&conn, b"bucket", b"b", b"val_b");
    assert_value(&conn, b"bucket", b"c", b"val_c");

    assert_bucket_not_found(&conn, b"not_found_bucket", b"a");
    assert_key_not_found(&conn, b"bucket", b"not_found_key");

    conn.delete(b"bucket", b"a").unwrap();
    assert_key_not_found(&conn, b"bucket", b"a");
    assert_value(&conn, b"bucket", b"b", b"val_b");

    conn.delete_bucket(b"bucket").unwrap();
    assert_bucket_not_found(&conn, b"bucket", b"b");
    assert_bucket_not_found(&conn, b"bucket", b"c");

    conn.close().unwrap();
}
