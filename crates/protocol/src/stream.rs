//! Stream-type taxonomy.
//!
//! Every record on the wire carries a numeric stream type. The values below
//! are fixed by the storage format and must never be renumbered. Helpers
//! classify a stream into the family the restore path dispatches on and map
//! ACL and xattr flavors to the per-OS identifiers.

use ::core::fmt;

/// Numeric stream identifiers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(i32)]
pub enum StreamType {
    #[doc(alias = "STREAM_NONE")]
    /// Reserved, never sent.
    None = 0,
    #[doc(alias = "STREAM_UNIX_ATTRIBUTES")]
    /// Generic Unix attributes.
    UnixAttributes = 1,
    #[doc(alias = "STREAM_FILE_DATA")]
    /// Uncompressed file data.
    FileData = 2,
    #[doc(alias = "STREAM_MD5_DIGEST")]
    /// MD5 signature of the file content.
    Md5Digest = 3,
    #[doc(alias = "STREAM_GZIP_DATA")]
    /// Compressed file data.
    GzipData = 4,
    #[doc(alias = "STREAM_UNIX_ATTRIBUTES_EX")]
    /// Extended attributes record for Win32 clients.
    UnixAttributesEx = 5,
    #[doc(alias = "STREAM_SPARSE_DATA")]
    /// Sparse file data; each payload starts with an offset.
    SparseData = 6,
    #[doc(alias = "STREAM_SPARSE_GZIP_DATA")]
    /// Sparse, compressed file data.
    SparseGzipData = 7,
    #[doc(alias = "STREAM_PROGRAM_NAMES")]
    /// Names of programs that produced program data.
    ProgramNames = 8,
    #[doc(alias = "STREAM_PROGRAM_DATA")]
    /// Data that needs an external program to restore.
    ProgramData = 9,
    #[doc(alias = "STREAM_SHA1_DIGEST")]
    /// SHA-1 signature of the file content.
    Sha1Digest = 10,
    #[doc(alias = "STREAM_WIN32_DATA")]
    /// Win32 backup-API data.
    Win32Data = 11,
    #[doc(alias = "STREAM_WIN32_GZIP_DATA")]
    /// Compressed Win32 backup-API data.
    Win32GzipData = 12,
    #[doc(alias = "STREAM_MACOS_FORK_DATA")]
    /// macOS resource fork.
    MacosForkData = 13,
    #[doc(alias = "STREAM_HFSPLUS_ATTRIBUTES")]
    /// macOS HFS+ finder information.
    HfsPlusAttributes = 14,
    #[doc(alias = "STREAM_UNIX_ACCESS_ACL")]
    /// Legacy access ACL without an OS tag.
    UnixAccessAcl = 15,
    #[doc(alias = "STREAM_UNIX_DEFAULT_ACL")]
    /// Legacy default ACL without an OS tag.
    UnixDefaultAcl = 16,
    #[doc(alias = "STREAM_SHA256_DIGEST")]
    /// SHA-256 signature.
    Sha256Digest = 17,
    #[doc(alias = "STREAM_SHA512_DIGEST")]
    /// SHA-512 signature.
    Sha512Digest = 18,
    #[doc(alias = "STREAM_SIGNED_DIGEST")]
    /// Signed digest.
    SignedDigest = 19,
    #[doc(alias = "STREAM_ENCRYPTED_FILE_DATA")]
    /// Encrypted file data.
    EncryptedFileData = 20,
    #[doc(alias = "STREAM_ENCRYPTED_WIN32_DATA")]
    /// Encrypted Win32 backup-API data.
    EncryptedWin32Data = 21,
    #[doc(alias = "STREAM_ENCRYPTED_SESSION_DATA")]
    /// Encryption session keys.
    EncryptedSessionData = 22,
    #[doc(alias = "STREAM_ENCRYPTED_FILE_GZIP_DATA")]
    /// Encrypted, compressed file data.
    EncryptedFileGzipData = 23,
    #[doc(alias = "STREAM_ENCRYPTED_WIN32_GZIP_DATA")]
    /// Encrypted, compressed Win32 backup-API data.
    EncryptedWin32GzipData = 24,
    #[doc(alias = "STREAM_ENCRYPTED_MACOS_FORK_DATA")]
    /// Encrypted macOS resource fork.
    EncryptedMacosForkData = 25,
    #[doc(alias = "STREAM_PLUGIN_NAME")]
    /// Plugin command string.
    PluginName = 26,
    #[doc(alias = "STREAM_PLUGIN_DATA")]
    /// Plugin-specific data.
    PluginData = 27,
    #[doc(alias = "STREAM_ACL_AIX_TEXT")]
    /// AIX ACL text.
    AclAixText = 1000,
    #[doc(alias = "STREAM_ACL_DARWIN_ACCESS_ACL")]
    /// macOS extended ACL.
    AclDarwinAccess = 1001,
    #[doc(alias = "STREAM_ACL_FREEBSD_DEFAULT_ACL")]
    /// FreeBSD default ACL.
    AclFreeBsdDefault = 1002,
    #[doc(alias = "STREAM_ACL_FREEBSD_ACCESS_ACL")]
    /// FreeBSD access ACL.
    AclFreeBsdAccess = 1003,
    #[doc(alias = "STREAM_ACL_HPUX_ACL_ENTRY")]
    /// HP-UX ACL entries.
    AclHpuxEntry = 1004,
    #[doc(alias = "STREAM_ACL_IRIX_DEFAULT_ACL")]
    /// IRIX default ACL.
    AclIrixDefault = 1005,
    #[doc(alias = "STREAM_ACL_IRIX_ACCESS_ACL")]
    /// IRIX access ACL.
    AclIrixAccess = 1006,
    #[doc(alias = "STREAM_ACL_LINUX_DEFAULT_ACL")]
    /// Linux default ACL.
    AclLinuxDefault = 1007,
    #[doc(alias = "STREAM_ACL_LINUX_ACCESS_ACL")]
    /// Linux access ACL.
    AclLinuxAccess = 1008,
    #[doc(alias = "STREAM_ACL_TRU64_DEFAULT_ACL")]
    /// Tru64 default ACL.
    AclTru64Default = 1009,
    #[doc(alias = "STREAM_ACL_TRU64_DEFAULT_DIR_ACL")]
    /// Tru64 default directory ACL.
    AclTru64DefaultDir = 1010,
    #[doc(alias = "STREAM_ACL_TRU64_ACCESS_ACL")]
    /// Tru64 access ACL.
    AclTru64Access = 1011,
    #[doc(alias = "STREAM_ACL_SOLARIS_ACLENT")]
    /// Solaris POSIX-draft ACL.
    AclSolarisAclent = 1012,
    #[doc(alias = "STREAM_ACL_SOLARIS_ACE")]
    /// Solaris NFSv4 ACL.
    AclSolarisAce = 1013,
    #[doc(alias = "STREAM_XATTR_SOLARIS_SYS")]
    /// Solaris system extensible attributes.
    XattrSolarisSys = 1994,
    #[doc(alias = "STREAM_XATTR_SOLARIS")]
    /// Solaris extended attributes.
    XattrSolaris = 1995,
    #[doc(alias = "STREAM_XATTR_DARWIN")]
    /// macOS extended attributes.
    XattrDarwin = 1996,
    #[doc(alias = "STREAM_XATTR_FREEBSD")]
    /// FreeBSD extended attributes.
    XattrFreeBsd = 1997,
    #[doc(alias = "STREAM_XATTR_LINUX")]
    /// Linux extended attributes.
    XattrLinux = 1998,
    #[doc(alias = "STREAM_XATTR_NETBSD")]
    /// NetBSD extended attributes.
    XattrNetBsd = 1999,
}

/// Operating-system families that define their own ACL or xattr streams.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OsFamily {
    /// IBM AIX.
    Aix,
    /// macOS.
    Darwin,
    /// FreeBSD.
    FreeBsd,
    /// HP-UX.
    HpUx,
    /// SGI IRIX.
    Irix,
    /// Linux.
    Linux,
    /// NetBSD.
    NetBsd,
    /// Solaris and illumos.
    Solaris,
    /// Tru64 UNIX.
    Tru64,
}

impl OsFamily {
    /// Family of the running host, if it has ACL or xattr streams.
    #[must_use]
    pub const fn current() -> Option<Self> {
        if cfg!(target_os = "linux") || cfg!(target_os = "android") {
            Some(Self::Linux)
        } else if cfg!(target_os = "macos") {
            Some(Self::Darwin)
        } else if cfg!(target_os = "freebsd") {
            Some(Self::FreeBsd)
        } else if cfg!(target_os = "netbsd") {
            Some(Self::NetBsd)
        } else if cfg!(any(target_os = "solaris", target_os = "illumos")) {
            Some(Self::Solaris)
        } else if cfg!(target_os = "aix") {
            Some(Self::Aix)
        } else {
            None
        }
    }

    /// Human readable name used in warnings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aix => "AIX",
            Self::Darwin => "Darwin",
            Self::FreeBsd => "FreeBSD",
            Self::HpUx => "HP-UX",
            Self::Irix => "IRIX",
            Self::Linux => "Linux",
            Self::NetBsd => "NetBSD",
            Self::Solaris => "Solaris",
            Self::Tru64 => "Tru64",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind of ACL a blob carries.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AclFlavor {
    /// The access ACL of any entry.
    Access,
    /// The default ACL inherited by new entries of a directory.
    Default,
    /// Tru64's separate default ACL for new subdirectories.
    DefaultDir,
    /// A native extended ACL (macOS).
    Extended,
    /// An NFSv4-style ACE list.
    Nfs4,
}

impl AclFlavor {
    /// Reports whether the flavor only applies to directories.
    #[must_use]
    pub const fn is_directory_only(self) -> bool {
        matches!(self, Self::Default | Self::DefaultDir)
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Default => "default",
            Self::DefaultDir => "default-dir",
            Self::Extended => "extended",
            Self::Nfs4 => "nfs4",
        }
    }
}

impl fmt::Display for AclFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded identity of an ACL stream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AclStream {
    /// Platform that wrote the blob, or `None` for the legacy untagged streams.
    pub os: Option<OsFamily>,
    /// ACL flavor.
    pub flavor: AclFlavor,
}

impl AclStream {
    /// Reports whether a blob of this stream can be applied on `host`.
    ///
    /// Legacy untagged streams are accepted everywhere and treated as the
    /// host's own flavor.
    #[must_use]
    pub fn is_native_to(self, host: Option<OsFamily>) -> bool {
        match self.os {
            None => host.is_some(),
            Some(os) => Some(os) == host,
        }
    }
}

/// The family of content carried by a file-data stream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataFamily {
    /// Raw bytes.
    Plain,
    /// Raw bytes prefixed by an offset.
    Sparse,
    /// Zlib-compressed blocks.
    Gzip,
    /// Offset-prefixed zlib-compressed blocks.
    SparseGzip,
}

impl DataFamily {
    /// Chooses the family for a file from its options.
    #[must_use]
    pub const fn select(sparse: bool, compressed: bool) -> Self {
        match (sparse, compressed) {
            (false, false) => Self::Plain,
            (true, false) => Self::Sparse,
            (false, true) => Self::Gzip,
            (true, true) => Self::SparseGzip,
        }
    }

    /// The stream type announced for this family.
    #[must_use]
    pub const fn stream(self) -> StreamType {
        match self {
            Self::Plain => StreamType::FileData,
            Self::Sparse => StreamType::SparseData,
            Self::Gzip => StreamType::GzipData,
            Self::SparseGzip => StreamType::SparseGzipData,
        }
    }

    /// Maps a stream type back to its family, for the four supported ones.
    #[must_use]
    pub const fn from_stream(stream: StreamType) -> Option<Self> {
        match stream {
            StreamType::FileData => Some(Self::Plain),
            StreamType::SparseData => Some(Self::Sparse),
            StreamType::GzipData => Some(Self::Gzip),
            StreamType::SparseGzipData => Some(Self::SparseGzip),
            _ => None,
        }
    }

    /// Whether payloads start with an eight-byte offset.
    #[must_use]
    pub const fn is_sparse(self) -> bool {
        matches!(self, Self::Sparse | Self::SparseGzip)
    }

    /// Whether payloads are zlib streams.
    #[must_use]
    pub const fn is_compressed(self) -> bool {
        matches!(self, Self::Gzip | Self::SparseGzip)
    }
}

/// How the restore path dispatches a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamClass {
    /// An attributes record opening a new file entry.
    Attributes,
    /// File content in one of the supported families.
    Data(DataFamily),
    /// File content this client cannot extract.
    UnsupportedData,
    /// An MD5 signature.
    Md5Digest,
    /// A SHA-1 signature.
    Sha1Digest,
    /// Any other digest or signature stream.
    OtherDigest,
    /// An ACL blob.
    Acl(AclStream),
    /// An xattr blob written on the given platform.
    Xattr(OsFamily),
    /// Program names.
    ProgramNames,
    /// Program data.
    ProgramData,
    /// Attribute streams this client cannot apply.
    UnsupportedAttributes,
}

impl StreamType {
    /// Returns the numeric identifier written on the wire.
    #[must_use]
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Attempts to construct a [`StreamType`] from its numeric identifier.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::UnixAttributes),
            2 => Some(Self::FileData),
            3 => Some(Self::Md5Digest),
            4 => Some(Self::GzipData),
            5 => Some(Self::UnixAttributesEx),
            6 => Some(Self::SparseData),
            7 => Some(Self::SparseGzipData),
            8 => Some(Self::ProgramNames),
            9 => Some(Self::ProgramData),
            10 => Some(Self::Sha1Digest),
            11 => Some(Self::Win32Data),
            12 => Some(Self::Win32GzipData),
            13 => Some(Self::MacosForkData),
            14 => Some(Self::HfsPlusAttributes),
            15 => Some(Self::UnixAccessAcl),
            16 => Some(Self::UnixDefaultAcl),
            17 => Some(Self::Sha256Digest),
            18 => Some(Self::Sha512Digest),
            19 => Some(Self::SignedDigest),
            20 => Some(Self::EncryptedFileData),
            21 => Some(Self::EncryptedWin32Data),
            22 => Some(Self::EncryptedSessionData),
            23 => Some(Self::EncryptedFileGzipData),
            24 => Some(Self::EncryptedWin32GzipData),
            25 => Some(Self::EncryptedMacosForkData),
            26 => Some(Self::PluginName),
            27 => Some(Self::PluginData),
            1000 => Some(Self::AclAixText),
            1001 => Some(Self::AclDarwinAccess),
            1002 => Some(Self::AclFreeBsdDefault),
            1003 => Some(Self::AclFreeBsdAccess),
            1004 => Some(Self::AclHpuxEntry),
            1005 => Some(Self::AclIrixDefault),
            1006 => Some(Self::AclIrixAccess),
            1007 => Some(Self::AclLinuxDefault),
            1008 => Some(Self::AclLinuxAccess),
            1009 => Some(Self::AclTru64Default),
            1010 => Some(Self::AclTru64DefaultDir),
            1011 => Some(Self::AclTru64Access),
            1012 => Some(Self::AclSolarisAclent),
            1013 => Some(Self::AclSolarisAce),
            1994 => Some(Self::XattrSolarisSys),
            1995 => Some(Self::XattrSolaris),
            1996 => Some(Self::XattrDarwin),
            1997 => Some(Self::XattrFreeBsd),
            1998 => Some(Self::XattrLinux),
            1999 => Some(Self::XattrNetBsd),
            _ => None,
        }
    }

    /// Returns the dispatch class of this stream.
    #[must_use]
    pub const fn class(self) -> StreamClass {
        if let Some(family) = DataFamily::from_stream(self) {
            return StreamClass::Data(family);
        }
        if let Some(acl) = self.acl_stream() {
            return StreamClass::Acl(acl);
        }
        if let Some(os) = self.xattr_os() {
            return StreamClass::Xattr(os);
        }
        match self {
            Self::UnixAttributes | Self::UnixAttributesEx => StreamClass::Attributes,
            Self::Md5Digest => StreamClass::Md5Digest,
            Self::Sha1Digest => StreamClass::Sha1Digest,
            Self::Sha256Digest | Self::Sha512Digest | Self::SignedDigest => {
                StreamClass::OtherDigest
            }
            Self::ProgramNames => StreamClass::ProgramNames,
            Self::ProgramData => StreamClass::ProgramData,
            Self::HfsPlusAttributes => StreamClass::UnsupportedAttributes,
            _ => StreamClass::UnsupportedData,
        }
    }

    /// Decodes the platform and flavor of an ACL stream.
    #[must_use]
    pub const fn acl_stream(self) -> Option<AclStream> {
        let (os, flavor) = match self {
            Self::UnixAccessAcl => (None, AclFlavor::Access),
            Self::UnixDefaultAcl => (None, AclFlavor::Default),
            Self::AclAixText => (Some(OsFamily::Aix), AclFlavor::Access),
            Self::AclDarwinAccess => (Some(OsFamily::Darwin), AclFlavor::Extended),
            Self::AclFreeBsdDefault => (Some(OsFamily::FreeBsd), AclFlavor::Default),
            Self::AclFreeBsdAccess => (Some(OsFamily::FreeBsd), AclFlavor::Access),
            Self::AclHpuxEntry => (Some(OsFamily::HpUx), AclFlavor::Access),
            Self::AclIrixDefault => (Some(OsFamily::Irix), AclFlavor::Default),
            Self::AclIrixAccess => (Some(OsFamily::Irix), AclFlavor::Access),
            Self::AclLinuxDefault => (Some(OsFamily::Linux), AclFlavor::Default),
            Self::AclLinuxAccess => (Some(OsFamily::Linux), AclFlavor::Access),
            Self::AclTru64Default => (Some(OsFamily::Tru64), AclFlavor::Default),
            Self::AclTru64DefaultDir => (Some(OsFamily::Tru64), AclFlavor::DefaultDir),
            Self::AclTru64Access => (Some(OsFamily::Tru64), AclFlavor::Access),
            Self::AclSolarisAclent => (Some(OsFamily::Solaris), AclFlavor::Access),
            Self::AclSolarisAce => (Some(OsFamily::Solaris), AclFlavor::Nfs4),
            _ => return None,
        };
        Some(AclStream { os, flavor })
    }

    /// Returns the stream used by `os` for ACLs of `flavor`, if defined.
    #[must_use]
    pub const fn acl(os: OsFamily, flavor: AclFlavor) -> Option<Self> {
        match (os, flavor) {
            (OsFamily::Aix, AclFlavor::Access) => Some(Self::AclAixText),
            (OsFamily::Darwin, AclFlavor::Extended) => Some(Self::AclDarwinAccess),
            (OsFamily::FreeBsd, AclFlavor::Default) => Some(Self::AclFreeBsdDefault),
            (OsFamily::FreeBsd, AclFlavor::Access) => Some(Self::AclFreeBsdAccess),
            (OsFamily::HpUx, AclFlavor::Access) => Some(Self::AclHpuxEntry),
            (OsFamily::Irix, AclFlavor::Default) => Some(Self::AclIrixDefault),
            (OsFamily::Irix, AclFlavor::Access) => Some(Self::AclIrixAccess),
            (OsFamily::Linux, AclFlavor::Default) => Some(Self::AclLinuxDefault),
            (OsFamily::Linux, AclFlavor::Access) => Some(Self::AclLinuxAccess),
            (OsFamily::Tru64, AclFlavor::Default) => Some(Self::AclTru64Default),
            (OsFamily::Tru64, AclFlavor::DefaultDir) => Some(Self::AclTru64DefaultDir),
            (OsFamily::Tru64, AclFlavor::Access) => Some(Self::AclTru64Access),
            (OsFamily::Solaris, AclFlavor::Access) => Some(Self::AclSolarisAclent),
            (OsFamily::Solaris, AclFlavor::Nfs4) => Some(Self::AclSolarisAce),
            _ => None,
        }
    }

    /// Returns the platform that wrote an xattr stream.
    #[must_use]
    pub const fn xattr_os(self) -> Option<OsFamily> {
        match self {
            Self::XattrSolarisSys | Self::XattrSolaris => Some(OsFamily::Solaris),
            Self::XattrDarwin => Some(OsFamily::Darwin),
            Self::XattrFreeBsd => Some(OsFamily::FreeBsd),
            Self::XattrLinux => Some(OsFamily::Linux),
            Self::XattrNetBsd => Some(OsFamily::NetBsd),
            _ => None,
        }
    }

    /// Returns the xattr stream used by `os`, if it defines one.
    #[must_use]
    pub const fn xattr(os: OsFamily) -> Option<Self> {
        match os {
            OsFamily::Solaris => Some(Self::XattrSolaris),
            OsFamily::Darwin => Some(Self::XattrDarwin),
            OsFamily::FreeBsd => Some(Self::XattrFreeBsd),
            OsFamily::Linux => Some(Self::XattrLinux),
            OsFamily::NetBsd => Some(Self::XattrNetBsd),
            OsFamily::Aix | OsFamily::HpUx | OsFamily::Irix | OsFamily::Tru64 => None,
        }
    }

    /// Mnemonic used in job messages and traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::UnixAttributes => "UNIX_ATTRIBUTES",
            Self::FileData => "FILE_DATA",
            Self::Md5Digest => "MD5_DIGEST",
            Self::GzipData => "GZIP_DATA",
            Self::UnixAttributesEx => "UNIX_ATTRIBUTES_EX",
            Self::SparseData => "SPARSE_DATA",
            Self::SparseGzipData => "SPARSE_GZIP_DATA",
            Self::ProgramNames => "PROGRAM_NAMES",
            Self::ProgramData => "PROGRAM_DATA",
            Self::Sha1Digest => "SHA1_DIGEST",
            Self::Win32Data => "WIN32_DATA",
            Self::Win32GzipData => "WIN32_GZIP_DATA",
            Self::MacosForkData => "MACOS_FORK_DATA",
            Self::HfsPlusAttributes => "HFSPLUS_ATTRIBUTES",
            Self::UnixAccessAcl => "UNIX_ACCESS_ACL",
            Self::UnixDefaultAcl => "UNIX_DEFAULT_ACL",
            Self::Sha256Digest => "SHA256_DIGEST",
            Self::Sha512Digest => "SHA512_DIGEST",
            Self::SignedDigest => "SIGNED_DIGEST",
            Self::EncryptedFileData => "ENCRYPTED_FILE_DATA",
            Self::EncryptedWin32Data => "ENCRYPTED_WIN32_DATA",
            Self::EncryptedSessionData => "ENCRYPTED_SESSION_DATA",
            Self::EncryptedFileGzipData => "ENCRYPTED_FILE_GZIP_DATA",
            Self::EncryptedWin32GzipData => "ENCRYPTED_WIN32_GZIP_DATA",
            Self::EncryptedMacosForkData => "ENCRYPTED_MACOS_FORK_DATA",
            Self::PluginName => "PLUGIN_NAME",
            Self::PluginData => "PLUGIN_DATA",
            Self::AclAixText => "ACL_AIX_TEXT",
            Self::AclDarwinAccess => "ACL_DARWIN_ACCESS_ACL",
            Self::AclFreeBsdDefault => "ACL_FREEBSD_DEFAULT_ACL",
            Self::AclFreeBsdAccess => "ACL_FREEBSD_ACCESS_ACL",
            Self::AclHpuxEntry => "ACL_HPUX_ACL_ENTRY",
            Self::AclIrixDefault => "ACL_IRIX_DEFAULT_ACL",
            Self::AclIrixAccess => "ACL_IRIX_ACCESS_ACL",
            Self::AclLinuxDefault => "ACL_LINUX_DEFAULT_ACL",
            Self::AclLinuxAccess => "ACL_LINUX_ACCESS_ACL",
            Self::AclTru64Default => "ACL_TRU64_DEFAULT_ACL",
            Self::AclTru64DefaultDir => "ACL_TRU64_DEFAULT_DIR_ACL",
            Self::AclTru64Access => "ACL_TRU64_ACCESS_ACL",
            Self::AclSolarisAclent => "ACL_SOLARIS_ACLENT",
            Self::AclSolarisAce => "ACL_SOLARIS_ACE",
            Self::XattrSolarisSys => "XATTR_SOLARIS_SYS",
            Self::XattrSolaris => "XATTR_SOLARIS",
            Self::XattrDarwin => "XATTR_DARWIN",
            Self::XattrFreeBsd => "XATTR_FREEBSD",
            Self::XattrLinux => "XATTR_LINUX",
            Self::XattrNetBsd => "XATTR_NETBSD",
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<StreamType> for i32 {
    fn from(stream: StreamType) -> Self {
        stream.as_i32()
    }
}
