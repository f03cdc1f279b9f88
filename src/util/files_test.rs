use super::*;

#[test]
fn test_create_write_read() {
    let mut dir = std::env::temp_dir();
    dir.push("sift-util-files-test");
    std::fs::remove_dir_all(&dir).ok();

    let loc = dir.join("blob.bin");
    let mut fd = create_file_w(loc.as_os_str()).unwrap();
    sync_write(&mut fd, b"hello world").unwrap();

    let got = std::fs::read(&loc).unwrap();
    assert_eq!(got, b"hello world");

    // create again purges the old content
    let mut fd = create_file_w(loc.as_os_str()).unwrap();
    sync_write(&mut fd, b"fresh").unwrap();
    let got = std::fs::read(&loc).unwrap();
    assert_eq!(got, b"fresh");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_open_missing() {
    let loc = std::env::temp_dir().join("sift-no-such-file");
    assert!(open_file_r(loc.as_os_str()).is_err());
}
