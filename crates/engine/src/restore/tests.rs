use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::sync::Arc;

use compress::zlib::{CompressionLevel, compress_to_vec};
use protocol::packet::PacketWriter;
use protocol::{RecordHeader, push_sparse_offset};
use test_support::{SavedRecord, StorageRelay};

use super::*;
use crate::config::{FileOptions, JobConfig};
use crate::save::{FileEntry, SaveSession};

type Session = RestoreSession<Vec<u8>>;

fn session(root: &Path) -> Session {
    let config = JobConfig::new().restore_location(Some(root));
    RestoreSession::new(JobContext::new(config, Vec::new()), Backends::none())
}

fn messages(session: Session) -> String {
    String::from_utf8(session.into_job().into_messages()).expect("utf8")
}

fn record(file_index: u32, stream: StreamType, payload: &[u8]) -> SavedRecord {
    SavedRecord {
        header: RecordHeader::new(file_index, stream.as_i32()),
        payloads: vec![payload.to_vec()],
    }
}

fn regular(file_index: u32, name: &str, size: i64, data_stream: StreamType) -> SavedRecord {
    let attrs = AttributesRecord {
        file_index,
        file_type: FileType::Regular,
        name: name.as_bytes().to_vec(),
        stat: StatRecord {
            mode: 0o100_640,
            nlink: 1,
            size,
            mtime: 1_600_000_000,
            atime: 1_600_000_000,
            data_stream: data_stream.as_i32(),
            ..StatRecord::default()
        },
        link: Vec::new(),
        extra: Vec::new(),
    };
    record(file_index, StreamType::UnixAttributes, &attrs.encode())
}

fn wire(records: &[SavedRecord]) -> Vec<u8> {
    StorageRelay::default().replay(records).expect("replay")
}

fn restore<P: CreationPolicy>(
    session: &mut RestoreSession<Vec<u8>, P>,
    records: &[SavedRecord],
) -> EngineResult<RestoreSummary> {
    session.run(wire(records).as_slice())
}

#[test]
fn restores_file_content_and_attributes() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = restore(
        &mut session,
        &[
            regular(1, "/data/notes.txt", 11, StreamType::FileData),
            record(1, StreamType::FileData, b"hello "),
            record(1, StreamType::FileData, b"world"),
            record(1, StreamType::Md5Digest, &[0; 16]),
        ],
    )
    .expect("restore");

    let target = root.path().join("data/notes.txt");
    assert_eq!(fs::read(&target).expect("read"), b"hello world");
    let meta = fs::metadata(&target).expect("metadata");
    assert_eq!(meta.permissions().mode() & 0o7777, 0o640);
    assert_eq!(meta.mtime(), 1_600_000_000);
    assert_eq!(summary.files, 1);
    assert_eq!(summary.bytes, 11);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.status, JobStatus::Terminated);
    assert_eq!(session.state(), RestoreState::Done);
}

#[test]
fn sparse_compressed_records_seek_and_inflate() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut first = Vec::new();
    push_sparse_offset(&mut first, 0);
    first.extend(compress_to_vec(b"head", CompressionLevel::Default).expect("compress"));
    let mut second = Vec::new();
    push_sparse_offset(&mut second, 8192);
    second.extend(compress_to_vec(b"tail", CompressionLevel::Default).expect("compress"));

    let mut session = session(root.path());
    restore(
        &mut session,
        &[
            regular(1, "/sparse.img", 8196, StreamType::SparseGzipData),
            record(1, StreamType::SparseGzipData, &first),
            record(1, StreamType::SparseGzipData, &second),
        ],
    )
    .expect("restore");

    let content = fs::read(root.path().join("sparse.img")).expect("read");
    assert_eq!(content.len(), 8196);
    assert_eq!(&content[..4], b"head");
    assert!(content[4..8192].iter().all(|&byte| byte == 0));
    assert_eq!(&content[8192..], b"tail");
}

#[test]
fn data_record_before_any_attributes_resynchronizes() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = restore(
        &mut session,
        &[
            record(1, StreamType::FileData, b"stray"),
            regular(2, "/after.txt", 2, StreamType::FileData),
            record(2, StreamType::FileData, b"ok"),
        ],
    )
    .expect("restore");

    assert_eq!(summary.protocol_warnings, 1);
    assert_eq!(summary.status, JobStatus::Terminated);
    assert_eq!(fs::read(root.path().join("after.txt")).expect("read"), b"ok");
    let text = messages(session);
    assert!(text.contains("Unexpected FILE_DATA record for file index 1 ignored"));
}

#[test]
fn family_mismatch_abandons_the_file() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = restore(
        &mut session,
        &[
            regular(1, "/plain.txt", 4, StreamType::FileData),
            record(1, StreamType::GzipData, b"junk"),
            record(1, StreamType::FileData, b"late"),
            regular(2, "/next.txt", 4, StreamType::FileData),
            record(2, StreamType::FileData, b"next"),
        ],
    )
    .expect("restore");

    assert_eq!(summary.protocol_warnings, 1);
    assert_eq!(fs::read(root.path().join("plain.txt")).expect("read"), b"");
    assert_eq!(fs::read(root.path().join("next.txt")).expect("read"), b"next");
}

#[test]
fn corrupt_compressed_block_is_a_file_error() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = restore(
        &mut session,
        &[
            regular(1, "/broken.gz", 4, StreamType::GzipData),
            record(1, StreamType::GzipData, b"not zlib"),
            regular(2, "/fine.txt", 4, StreamType::FileData),
            record(2, StreamType::FileData, b"fine"),
        ],
    )
    .expect("restore");

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.status, JobStatus::Terminated);
    assert_eq!(fs::read(root.path().join("fine.txt")).expect("read"), b"fine");
    let text = messages(session);
    assert!(text.contains("Uncompression error on file"));
}

#[test]
fn unsupported_data_stream_skips_the_file() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = restore(
        &mut session,
        &[
            regular(1, "/win.dat", 3, StreamType::Win32Data),
            record(1, StreamType::Win32Data, b"abc"),
            regular(2, "/win2.dat", 3, StreamType::Win32Data),
        ],
    )
    .expect("restore");

    assert_eq!(summary.non_support_data, 2);
    assert_eq!(summary.protocol_warnings, 0);
    assert!(!root.path().join("win.dat").exists());
    let text = messages(session);
    assert_eq!(text.matches("WIN32_DATA stream not supported on this Client.").count(), 1);
    assert!(text.contains("2 non-supported data streams and 0 non-supported attrib streams ignored."));
}

#[test]
fn unknown_and_program_streams_are_reported() {
    let root = tempfile::tempdir().expect("tempdir");
    let unknown = SavedRecord {
        header: RecordHeader::new(1, 777),
        payloads: vec![b"?".to_vec()],
    };
    let mut session = session(root.path());
    restore(
        &mut session,
        &[
            unknown,
            record(1, StreamType::ProgramNames, b"prog"),
            record(1, StreamType::ProgramData, b"data"),
        ],
    )
    .expect("restore");

    let text = messages(session);
    assert!(text.contains("Unknown stream=777 ignored. This shouldn't happen!"));
    assert_eq!(text.matches("Got Program Name or Data Stream. Ignored.").count(), 1);
}

#[cfg(target_os = "linux")]
#[test]
fn foreign_metadata_streams_are_counted() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = restore(
        &mut session,
        &[
            regular(1, "/f", 1, StreamType::FileData),
            record(1, StreamType::FileData, b"x"),
            record(1, StreamType::AclFreeBsdAccess, b"user::rw-\n"),
            record(1, StreamType::XattrDarwin, b"blob"),
        ],
    )
    .expect("restore");

    assert_eq!(summary.non_support_acl, 1);
    assert_eq!(summary.non_support_xattr, 1);
    assert_eq!(summary.errors, 0);
    let text = messages(session);
    assert!(text.contains("incompatible acl stream encountered - ACL_FREEBSD_ACCESS_ACL"));
    assert!(text.contains("1 non-supported xattr streams ignored."));
}

#[test]
fn payload_length_mismatch_is_fatal() {
    let mut writer = PacketWriter::new(Vec::new());
    writer
        .send(b"rechdr 1 1 1 2 10")
        .expect("header");
    writer.send(b"abc").expect("payload");
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());

    let error = session.run(writer.into_inner().as_slice()).expect_err("fatal");
    assert!(matches!(
        error,
        EngineError::PayloadSizeMismatch {
            expected: 10,
            actual: 3
        }
    ));
    assert_eq!(session.job().status(), JobStatus::ErrorTerminated);
}

#[test]
fn file_index_mismatch_is_fatal() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut attrs = regular(5, "/x", 0, StreamType::FileData);
    attrs.header.file_index = 6;
    let mut session = session(root.path());

    let error = restore(&mut session, &[attrs]).expect_err("fatal");
    assert!(matches!(
        error,
        EngineError::FileIndexMismatch {
            header: 6,
            record: 5
        }
    ));
}

#[derive(Debug, Default)]
struct SkipEverything {
    seen: Vec<Vec<u8>>,
}

impl CreationPolicy for SkipEverything {
    fn create(&mut self, attrs: &AttributesRecord, _target: &Path) -> io::Result<CreateOutcome> {
        self.seen.push(attrs.name.clone());
        Ok(CreateOutcome::Skip)
    }
}

#[test]
fn skipped_file_content_is_discarded_quietly() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = JobConfig::new().restore_location(Some(root.path()));
    let mut session = RestoreSession::with_policy(
        JobContext::new(config, Vec::new()),
        Backends::none(),
        SkipEverything::default(),
    );
    let summary = restore(
        &mut session,
        &[
            regular(1, "/skip.txt", 3, StreamType::FileData),
            record(1, StreamType::FileData, b"abc"),
        ],
    )
    .expect("restore");

    assert_eq!(summary.protocol_warnings, 0);
    assert_eq!(summary.files, 0);
    assert_eq!(session.policy.seen, vec![b"/skip.txt".to_vec()]);
}

#[test]
fn canceled_restore_stops_before_the_next_record() {
    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    session.cancel_handle().cancel();

    let error = restore(&mut session, &[regular(1, "/never", 0, StreamType::FileData)])
        .expect_err("canceled");
    assert!(error.is_canceled());
    assert_eq!(session.job().status(), JobStatus::Canceled);
    assert!(!root.path().join("never").exists());
}

#[test]
fn saved_tree_restores_identically() {
    let source = test_support::scratch_tree(&[
        ("etc/hosts", &b"127.0.0.1 localhost\n"[..]),
        ("etc/empty", &b""[..]),
        ("var/log/big.log", &[b'x'; 200_000][..]),
    ])
    .expect("tree");
    std::os::unix::fs::symlink("hosts", source.path().join("etc/alias")).expect("symlink");
    let sparse = source.path().join("var/holes.img");
    test_support::write_sparse_file(&sparse, 1 << 20, &[(0, b"start"), (900_000, b"middle")])
        .expect("sparse");

    let mut save = SaveSession::new(
        JobContext::new(JobConfig::new(), Vec::new()),
        Vec::new(),
        Backends::none(),
    );
    let options = FileOptions::new()
        .sparse(true)
        .compression(Some(CompressionLevel::Fast))
        .checksum(checksums::ChecksumKind::Sha1);
    save.save_tree(source.path(), &options).expect("save");
    save.finish_backup().expect("finish");
    let (_, saved) = save.into_parts();

    let root = tempfile::tempdir().expect("tempdir");
    let mut session = session(root.path());
    let summary = session
        .run(StorageRelay::default().relay(&saved).expect("relay").as_slice())
        .expect("restore");
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.protocol_warnings, 0);

    let relocated = |relative: &str| {
        let absolute = source.path().join(relative);
        root.path().join(absolute.strip_prefix("/").expect("absolute"))
    };
    for file in ["etc/hosts", "etc/empty", "var/log/big.log", "var/holes.img"] {
        assert_eq!(
            fs::read(relocated(file)).expect("restored"),
            fs::read(source.path().join(file)).expect("source"),
            "{file}"
        );
    }
    assert_eq!(
        fs::read_link(relocated("etc/alias")).expect("link"),
        Path::new("hosts")
    );
}

#[cfg(target_os = "linux")]
#[test]
fn xattr_blob_split_across_records_is_applied_whole() {
    use crate::test_backends::{FixedXattr, oversized_blob};
    use metadata::NoAclBackend;

    let source = tempfile::tempdir().expect("tempdir");
    let path = source.path().join("tagged");
    fs::write(&path, b"content").expect("write");
    let blob = oversized_blob();

    let mut save = SaveSession::new(
        JobContext::new(JobConfig::new(), Vec::new()),
        Vec::new(),
        Backends::new(Box::new(NoAclBackend), Box::new(FixedXattr::new(blob.clone()))),
    );
    save.save_file(&FileEntry::classify(&path), &FileOptions::new().xattr(true))
        .expect("save");
    save.finish_backup().expect("finish");
    let (_, saved) = save.into_parts();

    let root = tempfile::tempdir().expect("tempdir");
    let receiver = FixedXattr::new(Vec::new());
    let applied = Arc::clone(&receiver.applied);
    let config = JobConfig::new().restore_location(Some(root.path()));
    let mut session = RestoreSession::new(
        JobContext::new(config, Vec::new()),
        Backends::new(Box::new(NoAclBackend), Box::new(receiver)),
    );
    let summary = session
        .run(StorageRelay::default().relay(&saved).expect("relay").as_slice())
        .expect("restore");

    assert_eq!(summary.files, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.protocol_warnings, 0);
    assert_eq!(*applied.lock().expect("lock"), vec![blob]);
}

#[cfg(target_os = "linux")]
#[test]
fn unsupported_metadata_is_reported_once_per_filesystem() {
    use crate::test_backends::{UnsupportedAcl, UnsupportedXattr};

    let root = tempfile::tempdir().expect("tempdir");
    let acl = UnsupportedAcl::default();
    let xattr = UnsupportedXattr::default();
    let (acl_calls, xattr_calls) = (acl.applies.clone(), xattr.applies.clone());
    let config = JobConfig::new().restore_location(Some(root.path()));
    let mut session = RestoreSession::new(
        JobContext::new(config, Vec::new()),
        Backends::new(Box::new(acl), Box::new(xattr)),
    );
    let summary = restore(
        &mut session,
        &[
            regular(1, "/one", 1, StreamType::FileData),
            record(1, StreamType::FileData, b"1"),
            record(1, StreamType::AclLinuxAccess, b"user::rw-\ngroup::r--\nother::---\n"),
            record(1, StreamType::XattrLinux, b"first"),
            regular(2, "/two", 1, StreamType::FileData),
            record(2, StreamType::FileData, b"2"),
            record(2, StreamType::AclLinuxAccess, b"user::rw-\ngroup::r--\nother::---\n"),
            record(2, StreamType::XattrLinux, b"second"),
        ],
    )
    .expect("restore");

    assert_eq!(summary.files, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(acl_calls.count(), 1);
    assert_eq!(xattr_calls.count(), 1);
    assert_eq!(fs::read(root.path().join("two")).expect("read"), b"2");
    let text = messages(session);
    assert_eq!(text.matches("ACL support not enabled on the filesystem of").count(), 1);
    assert_eq!(
        text.matches("Extended attribute support not enabled on the filesystem of").count(),
        1
    );
}
