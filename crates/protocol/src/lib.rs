#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Wire formats of the backup data stream.
//!
//! The crate covers everything that crosses the connection between the file
//! daemon and the storage agent, independent of the filesystem:
//!
//! - [`packet`]: four-byte length-prefixed packets and the negative-length
//!   signals such as end-of-data.
//! - [`StreamType`] and [`FileType`]: the numeric taxonomies every record is
//!   tagged with, plus the classification the restore path dispatches on.
//! - [`StatRecord`] and [`AttributesRecord`]: the textual attributes record
//!   that opens every file entry.
//! - [`RecordHeader`] and [`StoredRecordHeader`]: the per-record headers in
//!   the save and restore direction, and the sparse offset prefix.
//! - [`XattrBlobBuilder`] and [`parse_xattr_blob`]: the portable
//!   extended-attribute blob.
//!
//! # Examples
//!
//! Frame an attributes record the way the save path sends it: header packet,
//! payload packet, end-of-data signal.
//!
//! ```
//! use protocol::packet::{PacketKind, PacketReader, PacketWriter, Signal};
//! use protocol::{AttributesRecord, FileType, RecordHeader, StatRecord, StreamType};
//!
//! # fn main() -> std::io::Result<()> {
//! let record = AttributesRecord {
//!     file_index: 1,
//!     file_type: FileType::Regular,
//!     name: b"/etc/hosts".to_vec(),
//!     stat: StatRecord { mode: 0o100644, size: 220, ..StatRecord::default() },
//!     link: Vec::new(),
//!     extra: Vec::new(),
//! };
//!
//! let mut writer = PacketWriter::new(Vec::new());
//! let header = RecordHeader::new(record.file_index, StreamType::UnixAttributes.as_i32());
//! writer.send(header.encode().as_bytes())?;
//! writer.send(&record.encode())?;
//! writer.signal(Signal::EndOfData)?;
//!
//! let wire = writer.into_inner();
//! let mut reader = PacketReader::new(wire.as_slice());
//! reader.recv()?;
//! assert_eq!(RecordHeader::parse(reader.payload())?, header);
//! reader.recv()?;
//! assert_eq!(AttributesRecord::decode(reader.payload())?, record);
//! assert_eq!(reader.recv()?, Some(PacketKind::Signal(Signal::EndOfData)));
//! # Ok(())
//! # }
//! ```

mod attributes;
pub mod base64;
mod command;
mod error;
mod file_type;
pub mod packet;
mod record;
mod stat;
mod stream;
mod xattr_blob;

pub use attributes::AttributesRecord;
pub use command::{BAD_ACCURATE_REPLY, format_accurate_command, parse_accurate_command};
pub use error::ProtocolError;
pub use file_type::{AR_DATA_STREAM, FT_MASK, FileType};
pub use record::{
    RecordHeader, SPARSE_OFFSET_LEN, StoredRecordHeader, push_sparse_offset, split_sparse_payload,
};
pub use stat::StatRecord;
pub use stream::{AclFlavor, AclStream, DataFamily, OsFamily, StreamClass, StreamType};
pub use xattr_blob::{
    DEFAULT_MAX_XATTR_STREAM, XATTR_MAGIC, XattrBlobBuilder, XattrBlobError, XattrEntry,
    XattrTuples, parse_xattr_blob,
};
