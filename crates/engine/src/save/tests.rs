use std::fs;
use std::io;
use std::os::unix::net::UnixListener;
use std::path::Path;

use checksums::ChecksumKind;
use protocol::{AttributesRecord, StreamType};
use test_support::{SavedRecord, split_records};

use super::*;
use crate::config::{JobConfig, JobLevel};

type Session = SaveSession<Vec<u8>, Vec<u8>>;

fn session(config: JobConfig) -> Session {
    SaveSession::new(JobContext::new(config, Vec::new()), Vec::new(), Backends::none())
}

fn finish(mut session: Session) -> (Vec<SavedRecord>, JobContext<Vec<u8>>) {
    session.finish_backup().expect("finish");
    let (job, wire) = session.into_parts();
    (split_records(&wire).expect("records"), job)
}

fn messages(job: JobContext<Vec<u8>>) -> String {
    String::from_utf8(job.into_messages()).expect("utf8")
}

fn attributes(record: &SavedRecord) -> AttributesRecord {
    assert_eq!(record.header.stream, StreamType::UnixAttributes.as_i32());
    AttributesRecord::decode(&record.joined()).expect("attributes")
}

fn streams(records: &[SavedRecord]) -> Vec<i32> {
    records.iter().map(|record| record.header.stream).collect()
}

#[test]
fn regular_file_sends_attributes_data_and_signature() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hosts");
    fs::write(&path, b"127.0.0.1 localhost\n").expect("write");

    let mut session = session(JobConfig::new());
    let options = FileOptions::new().checksum(ChecksumKind::Md5);
    let outcome = session
        .save_file(&FileEntry::classify(&path), &options)
        .expect("save");
    assert_eq!(outcome, SaveOutcome::Sent(1));
    let (records, job) = finish(session);

    assert_eq!(
        streams(&records),
        vec![
            StreamType::UnixAttributes.as_i32(),
            StreamType::FileData.as_i32(),
            StreamType::Md5Digest.as_i32(),
        ]
    );
    assert!(records.iter().all(|record| record.header.file_index == 1));
    let attrs = attributes(&records[0]);
    assert_eq!(attrs.file_type, FileType::Regular);
    assert_eq!(attrs.name, path.to_str().expect("utf8").as_bytes());
    assert_eq!(attrs.data_stream(), StreamType::FileData.as_i32());
    assert_eq!(records[1].joined(), b"127.0.0.1 localhost\n");
    assert_eq!(records[2].joined().len(), 16);

    let counters = job.counters();
    assert_eq!(counters.files, 1);
    assert_eq!(counters.errors, 0);
    assert_eq!(counters.read_bytes, 20);
    assert_eq!(job.status(), JobStatus::Terminated);
}

#[test]
fn empty_file_sends_signature_without_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty");
    fs::write(&path, b"").expect("write");

    let mut session = session(JobConfig::new());
    let options = FileOptions::new().checksum(ChecksumKind::Sha1);
    session
        .save_file(&FileEntry::classify(&path), &options)
        .expect("save");
    let (records, _) = finish(session);
    assert_eq!(
        streams(&records),
        vec![StreamType::UnixAttributes.as_i32(), StreamType::Sha1Digest.as_i32()]
    );
    assert_eq!(records[1].joined().len(), 20);
}

#[test]
fn directory_is_named_with_trailing_separator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(JobConfig::new());
    session
        .save_file(&FileEntry::classify(dir.path()), &FileOptions::new())
        .expect("save");
    let (records, _) = finish(session);
    assert_eq!(records.len(), 1);
    let attrs = attributes(&records[0]);
    assert_eq!(attrs.file_type, FileType::DirectoryEnd);
    assert_eq!(attrs.name.last(), Some(&b'/'));
    assert!(attrs.link.is_empty());
}

#[test]
fn symlink_target_travels_unstripped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let link = dir.path().join("link");
    std::os::unix::fs::symlink("/usr/share/zoneinfo/UTC", &link).expect("symlink");

    let mut session = session(JobConfig::new());
    session
        .save_file(&FileEntry::classify(&link), &FileOptions::new().strip_path(1))
        .expect("save");
    let (records, _) = finish(session);
    let attrs = attributes(&records[0]);
    assert_eq!(attrs.file_type, FileType::Symlink);
    assert_eq!(attrs.link, b"/usr/share/zoneinfo/UTC");
    assert!(!attrs.name.starts_with(dir.path().to_str().expect("utf8").as_bytes()));
}

#[test]
fn strip_path_rewrites_record_names() {
    let entry = FileEntry::new(
        FileType::RegularEmpty,
        "/snap/2024/etc/motd",
        StatRecord::default(),
    );
    let mut session = session(JobConfig::new());
    session
        .save_file(&entry, &FileOptions::new().strip_path(2))
        .expect("save");
    let (records, job) = finish(session);
    assert_eq!(attributes(&records[0]).name, b"/etc/motd");
    assert_eq!(job.last_fname(), "/etc/motd");
}

#[test]
fn unsavable_entries_are_reported_and_counted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = session(JobConfig::new());
    let outcome = session
        .save_file(
            &FileEntry::classify(dir.path().join("vanished")),
            &FileOptions::new(),
        )
        .expect("not fatal");
    assert_eq!(outcome, SaveOutcome::NotSent);
    let denied = FileEntry::new(FileType::NoAccess, "/root/secret", StatRecord::default())
        .with_error(io::Error::from(io::ErrorKind::PermissionDenied));
    session
        .save_file(&denied, &FileOptions::new())
        .expect("not fatal");

    let (records, job) = finish(session);
    assert!(records.is_empty());
    assert_eq!(job.counters().errors, 2);
    assert_eq!(job.counters().files, 0);
    let text = messages(job);
    assert!(text.contains("Could not stat"));
    assert!(text.contains("Could not access \"/root/secret\""));
}

#[test]
fn unchanged_and_archive_entries_are_skipped_without_errors() {
    let mut session = session(JobConfig::new());
    for file_type in [FileType::NoChange, FileType::DirNoChange, FileType::IsArchive] {
        let entry = FileEntry::new(file_type, "/var/backup.tar", StatRecord::default());
        assert_eq!(
            session.save_file(&entry, &FileOptions::new()).expect("save"),
            SaveOutcome::NotSent
        );
    }
    let (records, job) = finish(session);
    assert!(records.is_empty());
    assert_eq!(job.counters().errors, 0);
    assert_eq!(job.messages().counts().get(MessageKind::Skipped), 3);
    assert!(messages(job).contains("Archive file not saved: /var/backup.tar"));
}

#[test]
fn recursion_stop_is_saved_as_directory_end() {
    let entry = FileEntry::new(
        FileType::NoRecurse,
        "/mnt/data",
        StatRecord {
            mode: 0o040_755,
            ..StatRecord::default()
        },
    )
    .with_top_level("/mnt");
    let mut session = session(JobConfig::new());
    assert_eq!(
        session.save_file(&entry, &FileOptions::new()).expect("save"),
        SaveOutcome::Sent(1)
    );
    let (records, job) = finish(session);
    let attrs = attributes(&records[0]);
    assert_eq!(attrs.file_type, FileType::DirectoryEnd);
    assert_eq!(attrs.name, b"/mnt/data/");
    assert!(messages(job).contains("Will not descend from /mnt into /mnt/data"));
}

#[test]
fn sockets_and_directory_begins_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let socket = dir.path().join("control.sock");
    let _listener = UnixListener::bind(&socket).expect("bind");

    let mut session = session(JobConfig::new());
    let entry = FileEntry::classify(&socket);
    assert_eq!(entry.file_type(), FileType::Special);
    assert_eq!(
        session.save_file(&entry, &FileOptions::new()).expect("save"),
        SaveOutcome::Ignored
    );
    let begin = FileEntry::new(FileType::DirectoryBegin, dir.path(), StatRecord::default());
    assert_eq!(
        session.save_file(&begin, &FileOptions::new()).expect("save"),
        SaveOutcome::Ignored
    );
    let (records, job) = finish(session);
    assert!(records.is_empty());
    assert_eq!(job.counters().errors, 0);
    assert!(messages(job).is_empty());
}

#[test]
fn open_failure_keeps_attributes_and_skips_the_rest() {
    let entry = FileEntry::new(
        FileType::Regular,
        "/nonexistent/filed-test/file",
        StatRecord {
            mode: 0o100_644,
            size: 10,
            ..StatRecord::default()
        },
    );
    let mut session = session(JobConfig::new());
    let options = FileOptions::new().checksum(ChecksumKind::Md5);
    assert_eq!(
        session.save_file(&entry, &options).expect("save"),
        SaveOutcome::Sent(1)
    );
    let (records, job) = finish(session);
    assert_eq!(streams(&records), vec![StreamType::UnixAttributes.as_i32()]);
    assert_eq!(job.counters().errors, 1);
    assert!(messages(job).contains("Cannot open \"/nonexistent/filed-test/file\""));
}

#[test]
fn compressed_sparse_family_is_announced_in_attributes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("disk.img");
    test_support::write_sparse_file(&path, 256 * 1024, &[(0, b"boot")]).expect("sparse");

    let mut session = session(JobConfig::new());
    let options = FileOptions::new()
        .sparse(true)
        .compression(Some(compress::zlib::CompressionLevel::Default));
    session
        .save_file(&FileEntry::classify(&path), &options)
        .expect("save");
    let (records, job) = finish(session);
    assert_eq!(
        attributes(&records[0]).data_stream(),
        StreamType::SparseGzipData.as_i32()
    );
    assert_eq!(records[1].header.stream, StreamType::SparseGzipData.as_i32());
    assert_eq!(records[1].payloads.len(), 2);
    assert_eq!(job.counters().read_bytes, 256 * 1024);
}

fn accurate_session(level: JobLevel, root: &Path) -> Session {
    let mut table = AccurateTable::init(3).expect("table");
    for name in ["a", "b", "c"] {
        let stat = fs::symlink_metadata(root.join(name))
            .map(|metadata| StatRecord::from_metadata(&metadata))
            .unwrap_or_default();
        let key = root.join(name);
        table.insert(
            key.to_str().expect("utf8").as_bytes(),
            stat.mtime,
            stat.ctime,
        );
    }
    session(JobConfig::new().level(level).accurate(true)).with_accurate_table(table)
}

#[test]
fn unvisited_paths_are_sent_as_deleted_notices() {
    let dir = test_support::scratch_tree(&[("a", &b"1"[..]), ("c", &b"3"[..])]).expect("tree");
    let mut session = accurate_session(JobLevel::Incremental, dir.path());
    for name in ["a", "c"] {
        let outcome = session
            .save_file(&FileEntry::classify(dir.path().join(name)), &FileOptions::new())
            .expect("save");
        assert_eq!(outcome, SaveOutcome::NotSent);
    }
    let deleted = session.finish_backup().expect("finish");
    assert_eq!(deleted, 1);
    let (job, wire) = session.into_parts();
    let records = split_records(&wire).expect("records");

    assert_eq!(records.len(), 1);
    let notice = attributes(&records[0]);
    assert_eq!(notice.file_type, FileType::Deleted);
    assert_eq!(notice.name, dir.path().join("b").to_str().expect("utf8").as_bytes());
    assert_eq!(notice.file_index, 1);
    assert_eq!(job.messages().counts().get(MessageKind::Skipped), 2);
}

#[test]
fn changed_files_are_saved_in_accurate_jobs() {
    let dir = test_support::scratch_tree(&[("a", &b"1"[..])]).expect("tree");
    let mut session = accurate_session(JobLevel::Differential, dir.path());
    fs::write(dir.path().join("new"), b"fresh").expect("write");
    let outcome = session
        .save_file(&FileEntry::classify(dir.path().join("new")), &FileOptions::new())
        .expect("save");
    assert_eq!(outcome, SaveOutcome::Sent(1));
}

#[test]
fn full_jobs_never_send_deleted_notices() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut session = accurate_session(JobLevel::Full, dir.path());
    assert_eq!(session.finish_backup().expect("finish"), 0);
    let (_, wire) = session.into_parts();
    assert!(split_records(&wire).expect("records").is_empty());
}

#[test]
fn plugin_owned_paths_are_not_deleted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let owned = dir.path().join("b");
    let owned = owned.to_str().expect("utf8").as_bytes().to_vec();
    let mut session = accurate_session(JobLevel::Incremental, dir.path())
        .with_plugin_ownership(move |path: &[u8]| path == owned.as_slice());
    assert_eq!(session.finish_backup().expect("finish"), 2);
}

#[test]
fn canceled_job_sends_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("file");
    fs::write(&path, b"data").expect("write");

    let mut session = accurate_session(JobLevel::Incremental, dir.path());
    session.cancel_handle().cancel();
    let err = session
        .save_file(&FileEntry::classify(&path), &FileOptions::new())
        .expect_err("canceled");
    assert!(err.is_canceled());
    assert_eq!(session.finish_backup().expect("finish"), 0);
    assert_eq!(session.status(), JobStatus::Canceled);
    let (_, wire) = session.into_parts();
    assert!(split_records(&wire).expect("records").is_empty());
}

#[test]
fn save_tree_sends_every_entry_once() {
    let dir = test_support::scratch_tree(&[
        ("etc/hosts", &b"hosts"[..]),
        ("etc/motd", &b""[..]),
        ("var/log/syslog", &b"log line"[..]),
    ])
    .expect("tree");
    let mut session = session(JobConfig::new());
    let sent = session
        .save_tree(dir.path(), &FileOptions::new())
        .expect("walk");
    assert_eq!(sent, 7);
    let (records, job) = finish(session);
    let names: Vec<Vec<u8>> = records
        .iter()
        .filter(|record| record.header.stream == StreamType::UnixAttributes.as_i32())
        .map(|record| attributes(record).name)
        .collect();
    assert_eq!(names.len(), 7);
    assert_eq!(
        names.last().map(Vec::as_slice),
        Some(format!("{}/", dir.path().display()).as_bytes())
    );
    assert_eq!(job.counters().files, 7);
}

#[test]
fn heartbeat_requires_an_interval() {
    let mut session = session(JobConfig::new());
    assert!(
        !session
            .start_heartbeat(SharedWriter::new(Vec::<u8>::new()))
            .expect("start")
    );

    let mut session = self::session(
        JobConfig::new().heartbeat_interval(Some(std::time::Duration::from_secs(60))),
    );
    assert!(
        session
            .start_heartbeat(SharedWriter::new(Vec::<u8>::new()))
            .expect("start")
    );
    session.finish_backup().expect("finish");
}

#[cfg(target_os = "linux")]
#[test]
fn xattr_blob_larger_than_a_packet_is_split() {
    use crate::test_backends::{FixedXattr, oversized_blob};
    use metadata::NoAclBackend;
    use protocol::packet::MAX_PACKET_LEN;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tagged");
    fs::write(&path, b"x").expect("write");
    let blob = oversized_blob();

    let backends = Backends::new(Box::new(NoAclBackend), Box::new(FixedXattr::new(blob.clone())));
    let mut session = SaveSession::new(JobContext::new(JobConfig::new(), Vec::new()), Vec::new(), backends);
    let outcome = session
        .save_file(&FileEntry::classify(&path), &FileOptions::new().xattr(true))
        .expect("save");
    assert_eq!(outcome, SaveOutcome::Sent(1));
    let (records, job) = finish(session);

    let xattr = records
        .iter()
        .find(|record| record.header.stream == StreamType::XattrLinux.as_i32())
        .expect("xattr record");
    assert_eq!(xattr.payloads.len(), 2);
    assert_eq!(xattr.payloads[0].len(), MAX_PACKET_LEN);
    assert_eq!(xattr.joined(), blob);
    assert_eq!(job.counters().errors, 0);
    assert_eq!(job.status(), JobStatus::Terminated);
}

#[cfg(target_os = "linux")]
#[test]
fn unsupported_metadata_is_not_asked_again_on_the_same_filesystem() {
    use crate::test_backends::{UnsupportedAcl, UnsupportedXattr};

    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    fs::write(&first, b"1").expect("write");
    fs::write(&second, b"2").expect("write");

    let acl = UnsupportedAcl::default();
    let xattr = UnsupportedXattr::default();
    let (acl_calls, xattr_calls) = (acl.captures.clone(), xattr.captures.clone());
    let backends = Backends::new(Box::new(acl), Box::new(xattr));
    let mut session = SaveSession::new(JobContext::new(JobConfig::new(), Vec::new()), Vec::new(), backends);
    let options = FileOptions::new().acl(true).xattr(true);

    session.save_file(&FileEntry::classify(&first), &options).expect("save");
    session.save_file(&FileEntry::classify(&second), &options).expect("save");
    assert_eq!(acl_calls.count(), 1);
    assert_eq!(xattr_calls.count(), 1);

    let seen = FileEntry::classify(&second);
    let elsewhere = FileEntry::new(
        FileType::Regular,
        &second,
        StatRecord {
            dev: seen.stat().dev + 1,
            ..*seen.stat()
        },
    );
    session.save_file(&elsewhere, &options).expect("save");
    assert_eq!(acl_calls.count(), 2);
    assert_eq!(xattr_calls.count(), 2);

    let (records, job) = finish(session);
    assert!(records.iter().all(|record| {
        record.header.stream != StreamType::AclLinuxAccess.as_i32()
            && record.header.stream != StreamType::XattrLinux.as_i32()
    }));
    assert_eq!(job.counters().files, 3);
    assert_eq!(job.counters().errors, 0);
}
