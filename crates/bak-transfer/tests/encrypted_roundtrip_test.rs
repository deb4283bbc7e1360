//! Integration tests for the store → retrieve pipeline with envelopes.
//!
//! Uses OpenDAL's in-memory backend so no live object store is required.

use bak_storage::Gateway;
use bak_transfer::TransferError;
use opendal::Operator;
use secrecy::SecretString;
use std::path::Path;
use tempfile::TempDir;

fn memory_gateway() -> Gateway {
    let op = Operator::new(opendal::services::Memory::default())
        .expect("memory operator")
        .finish();
    Gateway::new(op)
}

fn write_test_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

#[tokio::test]
async fn encrypted_upload_download_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let gw = memory_gateway();
    let secret = SecretString::from("s3cr3t");

    let src = write_test_file(tmp.path(), "hello.txt", b"hello world");
    let dst = tmp.path().join("out/hello.txt");

    let stored = bak_transfer::store_file(&gw, &src, "docs/hello.txt", Some(&secret), None)
        .await
        .expect("encrypted upload should succeed");

    assert!(stored.encrypted);
    assert_eq!(stored.bytes_read, 11);
    // prefix (10) + nonce (12) + plaintext (11) + tag (16)
    assert_eq!(stored.bytes_stored, 10 + 12 + 11 + 16);

    // The stored object is an envelope, not the plaintext
    let raw = gw.get("docs/hello.txt", None).await.unwrap();
    assert_eq!(&raw[..10], b"ENCRYPTED:");
    assert!(!raw.windows(11).any(|w| w == b"hello world"));

    let retrieved = bak_transfer::retrieve_file(&gw, "docs/hello.txt", &dst, Some(&secret), None)
        .await
        .expect("decrypting download should succeed");

    assert!(retrieved.decrypted);
    assert_eq!(retrieved.bytes, 11);
    assert_eq!(std::fs::read(&dst).unwrap(), b"hello world");
}

#[tokio::test]
async fn wrong_secret_fails_without_writing() {
    let tmp = TempDir::new().unwrap();
    let gw = memory_gateway();

    let src = write_test_file(tmp.path(), "hello.txt", b"hello world");
    bak_transfer::store_file(
        &gw,
        &src,
        "hello.txt",
        Some(&SecretString::from("s3cr3t")),
        None,
    )
    .await
    .unwrap();

    let dst = tmp.path().join("out/hello.txt");
    let err = bak_transfer::retrieve_file(
        &gw,
        "hello.txt",
        &dst,
        Some(&SecretString::from("wrong")),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_authentication(), "expected authentication failure, got: {err}");
    assert!(!dst.exists(), "no output may be written on decrypt failure");
}

#[tokio::test]
async fn failed_retrieve_leaves_existing_destination_untouched() {
    let tmp = TempDir::new().unwrap();
    let gw = memory_gateway();

    bak_transfer::store_bytes(
        &gw,
        b"new contents".to_vec(),
        "report.txt",
        Some(&SecretString::from("right")),
        None,
    )
    .await
    .unwrap();

    let dst = write_test_file(tmp.path(), "report.txt", b"previous contents");
    let err = bak_transfer::retrieve_file(
        &gw,
        "report.txt",
        &dst,
        Some(&SecretString::from("wrong")),
        None,
    )
    .await
    .unwrap_err();

    assert!(err.is_authentication());
    assert_eq!(std::fs::read(&dst).unwrap(), b"previous contents");
}

#[tokio::test]
async fn tampered_object_is_rejected() {
    let gw = memory_gateway();
    let secret = SecretString::from("s3cr3t");

    bak_transfer::store_bytes(&gw, b"ledger".to_vec(), "ledger.db", Some(&secret), None)
        .await
        .unwrap();

    let mut raw = gw.get("ledger.db", None).await.unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    gw.put("ledger.db", raw, None).await.unwrap();

    let err = bak_transfer::retrieve_bytes(&gw, "ledger.db", Some(&secret), None)
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn mixed_bucket_plain_and_encrypted() {
    let gw = memory_gateway();
    let secret = SecretString::from("s3cr3t");

    bak_transfer::store_bytes(&gw, b"public notes".to_vec(), "plain.txt", None, None)
        .await
        .unwrap();
    bak_transfer::store_bytes(&gw, b"private notes".to_vec(), "secret.txt", Some(&secret), None)
        .await
        .unwrap();

    let plain = bak_transfer::retrieve_bytes(&gw, "plain.txt", Some(&secret), None)
        .await
        .unwrap();
    assert!(!plain.decrypted);
    assert_eq!(plain.data, b"public notes");

    let private = bak_transfer::retrieve_bytes(&gw, "secret.txt", Some(&secret), None)
        .await
        .unwrap();
    assert!(private.decrypted);
    assert_eq!(private.data, b"private notes");

    let mut keys: Vec<String> = bak_transfer::list_objects(&gw, "")
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    keys.sort();
    assert_eq!(keys, vec!["plain.txt", "secret.txt"]);
}

#[tokio::test]
async fn plaintext_needs_no_secret() {
    let gw = memory_gateway();
    bak_transfer::store_bytes(&gw, b"open".to_vec(), "open.txt", None, None)
        .await
        .unwrap();

    let got = bak_transfer::retrieve_bytes(&gw, "open.txt", None, None)
        .await
        .unwrap();
    assert_eq!(got.data, b"open");
}

#[tokio::test]
async fn envelope_without_secret_is_config_error() {
    let gw = memory_gateway();
    bak_transfer::store_bytes(
        &gw,
        b"sealed".to_vec(),
        "sealed.bin",
        Some(&SecretString::from("k")),
        None,
    )
    .await
    .unwrap();

    let err = bak_transfer::retrieve_bytes(&gw, "sealed.bin", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Config(_)), "got: {err}");
}

#[tokio::test]
async fn plaintext_that_looks_encrypted_is_misdetected() {
    // Known ambiguity: unencrypted content starting with the prefix
    let gw = memory_gateway();
    let secret = SecretString::from("s3cr3t");
    let content = b"ENCRYPTED: not really, just a text file".to_vec();

    bak_transfer::store_bytes(&gw, content.clone(), "tricky.txt", None, None)
        .await
        .unwrap();

    // stored verbatim
    assert_eq!(gw.get("tricky.txt", None).await.unwrap(), content);

    let err = bak_transfer::retrieve_bytes(&gw, "tricky.txt", Some(&secret), None)
        .await
        .unwrap_err();
    assert!(err.is_authentication());
}
