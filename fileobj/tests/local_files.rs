use std::path::Path;

use fileobj::{FileError, FileHandle, LocalClient, LocalFsStorage};
use quickcheck::{QuickCheck, TestResult};

const TEXT: &str = "1) This is a test file!\n2) With multiple lines of data...\n3) Third line\n4) Fourth line\n5) Fifth line\n6) Sixth line\n";

fn setup() -> (tempfile::TempDir, LocalFsStorage) {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("test.txt"), TEXT).unwrap();
    let storage = LocalFsStorage::new(tmp.path());
    (tmp, storage)
}

fn read_back(root: &Path, name: &str) -> Vec<u8> {
    std::fs::read(root.join(name)).unwrap()
}

#[test]
fn test_scoped_handle_reports_name_and_mode() {
    let (_tmp, storage) = setup();
    let client = LocalClient::new(storage);
    let mut seen_open = false;
    client
        .with_open("test.txt", "r", |f| -> fileobj::Result<()> {
            assert_eq!(f.name(), Path::new("test.txt"));
            f.set_mode("w");
            assert_eq!(f.mode(), "w");
            seen_open = !f.closed();
            Ok(())
        })
        .unwrap();
    assert!(seen_open);
}

#[test]
fn test_three_ways_to_read_lines() {
    let (_tmp, storage) = setup();

    let mut f = FileHandle::open(&storage, "test.txt", "r").unwrap();
    let first: Vec<String> = (0..3).map(|_| f.read_line().unwrap()).collect();
    assert_eq!(first.concat(), TEXT.lines().take(3).map(|l| format!("{l}\n")).collect::<String>());

    let mut f = FileHandle::open(&storage, "test.txt", "r").unwrap();
    assert_eq!(f.read_lines().unwrap().len(), 6);

    let mut f = FileHandle::open(&storage, "test.txt", "r").unwrap();
    let mut joined = String::new();
    for line in f.lines() {
        joined.push_str(&line.unwrap());
    }
    assert_eq!(joined, TEXT);
}

#[test]
fn test_read_in_small_counts_until_empty() {
    let (_tmp, storage) = setup();
    let mut f = FileHandle::open(&storage, "test.txt", "r").unwrap();
    let mut pieces = Vec::new();
    loop {
        let piece = f.read_text(3).unwrap();
        if piece.is_empty() {
            break;
        }
        assert!(piece.chars().count() <= 3);
        pieces.push(piece);
    }
    assert_eq!(pieces.concat(), TEXT);
    assert_eq!(pieces.len(), TEXT.len().div_ceil(3));
}

#[test]
fn test_write_mode_overwrite_sequence() {
    let (tmp, storage) = setup();
    std::fs::write(tmp.path().join("test2.txt"), "stale data from a previous run").unwrap();
    {
        let mut f = FileHandle::open(&storage, "test2.txt", "w").unwrap();
        f.write_str("Test").unwrap();
        f.write_str("Test_").unwrap();
        f.seek(0).unwrap();
        f.write_str("777").unwrap();
        f.seek(10).unwrap();
        f.write_str("\n  bruh").unwrap();
    }
    assert_eq!(read_back(tmp.path(), "test2.txt"), b"777tTest_\0\n  bruh");
}

#[test]
fn test_copy_with_two_handles_and_seeks() {
    let (tmp, storage) = setup();
    {
        let mut rf = FileHandle::open(&storage, "test.txt", "r").unwrap();
        let mut wf = FileHandle::open(&storage, "test3.txt", "w").unwrap();
        for line in rf.read_lines().unwrap() {
            wf.write_str(&line).unwrap();
        }
        rf.seek(1).unwrap();
        wf.seek(10).unwrap();
        for line in rf.lines() {
            wf.write_str(&line.unwrap()).unwrap();
        }
    }
    let expected = format!("{}{}", &TEXT[..10], &TEXT[1..]);
    assert_eq!(read_back(tmp.path(), "test3.txt"), expected.as_bytes());
}

#[test]
fn test_open_errors_on_disk() {
    let (_tmp, storage) = setup();
    let err = FileHandle::open(&storage, "missing.txt", "r").err().unwrap();
    assert!(matches!(err, FileError::NotFound { .. }));
    let err = FileHandle::open(&storage, "missing.txt", "r+").err().unwrap();
    assert!(matches!(err, FileError::NotFound { .. }));

    let mut f = FileHandle::open(&storage, "test.txt", "r").unwrap();
    assert!(matches!(f.write_str("x"), Err(FileError::ReadOnly)));
    f.close().unwrap();
    assert!(f.closed());
    assert!(matches!(f.read(1), Err(FileError::Closed)));
    assert!(matches!(f.write(b"x"), Err(FileError::Closed)));
}

#[test]
fn test_truncating_open_then_close_empties_file() {
    let (tmp, storage) = setup();
    let mut f = FileHandle::open(&storage, "test.txt", "w+").unwrap();
    f.close().unwrap();
    assert!(read_back(tmp.path(), "test.txt").is_empty());
}

#[test]
fn test_append_on_disk() {
    let (tmp, storage) = setup();
    let mut f = FileHandle::open(&storage, "test.txt", "a").unwrap();
    f.seek(0).unwrap();
    f.write_str("7) Seventh line\n").unwrap();
    drop(f);
    assert_eq!(
        read_back(tmp.path(), "test.txt"),
        format!("{TEXT}7) Seventh line\n").as_bytes()
    );
}

#[test]
fn test_first_chunk_only_copy_is_partial() {
    let (tmp, _storage) = setup();
    let image: Vec<u8> = (0..20_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
    std::fs::write(tmp.path().join("rasta-banana.jpg"), &image).unwrap();
    let client = LocalClient::new_local(tmp.path());

    client
        .with_open("rasta-banana.jpg", "rb", |rf| {
            client.with_open("rasta-banana_COPY.jpg", "wb", |wf| {
                let chunk = rf.read(9000)?;
                wf.write(&chunk).map(|_| ())
            })
        })
        .unwrap();
    assert_eq!(read_back(tmp.path(), "rasta-banana_COPY.jpg"), &image[..9000]);

    let copied = client
        .copy_chunked("rasta-banana.jpg", "rasta-banana_COPY_2.jpg", 4096)
        .unwrap();
    assert_eq!(copied, image.len() as u64);
    assert_eq!(read_back(tmp.path(), "rasta-banana_COPY_2.jpg"), image);
}

#[test]
fn test_chunked_copy_is_identical_for_any_chunk_size() {
    fn prop(data: Vec<u8>, chunk: u16) -> TestResult {
        if chunk == 0 {
            return TestResult::discard();
        }
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("src.bin"), &data).unwrap();
        let client = LocalClient::new_local(tmp.path());
        let copied = client
            .copy_chunked("src.bin", "dst.bin", chunk as usize)
            .unwrap();
        TestResult::from_bool(
            copied == data.len() as u64 && read_back(tmp.path(), "dst.bin") == data,
        )
    }
    QuickCheck::new()
        .tests(50)
        .quickcheck(prop as fn(Vec<u8>, u16) -> TestResult);
}
