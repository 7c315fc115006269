mod common;

use common::write_bytes;
use std::path::PathBuf;
use tempfile::tempdir;
use webarc::adapters::Crc32Checksummer;
use webarc::ports::ChecksumPort;

#[test]
fn tree_keys_are_relative_to_root() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("page_files");
    write_bytes(&root.join("a.css"), b"body{}");
    write_bytes(&root.join("img/deep/b.png"), b"png");
    write_bytes(&root.join("empty.txt"), b"");

    let sums = Crc32Checksummer::new().checksum_tree(&root, None).unwrap();

    let keys: Vec<PathBuf> = sums.keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            PathBuf::from("a.css"),
            PathBuf::from("empty.txt"),
            PathBuf::from("img").join("deep").join("b.png"),
        ]
    );
    assert_eq!(sums[&PathBuf::from("a.css")], crc32fast::hash(b"body{}"));
    assert_eq!(sums[&PathBuf::from("empty.txt")], 0);
}

#[test]
fn checksum_is_deterministic_and_sensitive_to_one_byte() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("data.bin");
    let mut data: Vec<u8> = (0..3_000_000u32).map(|i| (i % 251) as u8).collect();
    write_bytes(&path, &data);

    let engine = Crc32Checksummer::new();
    let first = engine.checksum_file(&path).unwrap();
    assert_eq!(first, engine.checksum_file(&path).unwrap());
    assert_eq!(first, crc32fast::hash(&data));

    data[1_500_000] ^= 0x01;
    write_bytes(&path, &data);
    assert_ne!(first, engine.checksum_file(&path).unwrap());
}

#[test]
fn missing_tree_is_empty() {
    let tmp = tempdir().unwrap();
    let sums = Crc32Checksummer::new()
        .checksum_tree(&tmp.path().join("gone"), None)
        .unwrap();
    assert!(sums.is_empty());
}

#[cfg(unix)]
#[test]
fn dangling_link_is_left_out_of_tree() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("page_files");
    write_bytes(&root.join("a.css"), b"body{}");
    std::os::unix::fs::symlink(tmp.path().join("gone.js"), root.join("b.js")).unwrap();

    let sums = Crc32Checksummer::new().checksum_tree(&root, None).unwrap();

    assert_eq!(sums.len(), 1);
    assert_eq!(sums[&PathBuf::from("a.css")], crc32fast::hash(b"body{}"));
}

#[cfg(unix)]
#[test]
fn unreadable_entries_are_skipped_not_fatal() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let root = tmp.path().join("page_files");
    write_bytes(&root.join("a.css"), b"body{}");
    write_bytes(&root.join("secret.js"), b"js");
    write_bytes(&root.join("locked/inner.png"), b"png");
    let secret = root.join("secret.js");
    let locked = root.join("locked");
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users bypass mode bits; nothing is unreadable for them.
    let bypassed = fs::File::open(&secret).is_ok() || fs::read_dir(&locked).is_ok();
    let result = Crc32Checksummer::new().checksum_tree(&root, None);
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o644)).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    if bypassed {
        return;
    }

    let sums = result.unwrap();
    let keys: Vec<PathBuf> = sums.keys().cloned().collect();
    assert_eq!(keys, vec![PathBuf::from("a.css")]);
}
