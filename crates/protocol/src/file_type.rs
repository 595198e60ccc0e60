use ::core::fmt;

/// Mask that isolates the file type from the flag bits of the type field.
pub const FT_MASK: u32 = 0xFFFF;

/// Flag in the type field announcing an explicit data-stream field after the
/// platform-extra field of an attributes record.
pub const AR_DATA_STREAM: u32 = 1 << 16;

/// Classification of a filesystem entry produced by the tree walker.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u16)]
pub enum FileType {
    #[doc(alias = "FT_LNKSAVED")]
    /// Hard link whose data was already saved under another name.
    LinkSaved = 1,
    #[doc(alias = "FT_REGE")]
    /// Regular file that is empty.
    RegularEmpty = 2,
    #[doc(alias = "FT_REG")]
    /// Regular file.
    Regular = 3,
    #[doc(alias = "FT_LNK")]
    /// Symbolic link.
    Symlink = 4,
    #[doc(alias = "FT_DIREND")]
    /// Directory, emitted after its contents.
    DirectoryEnd = 5,
    #[doc(alias = "FT_SPEC")]
    /// Device node, socket or other special file.
    Special = 6,
    #[doc(alias = "FT_NOACCESS")]
    /// Entry could not be accessed.
    NoAccess = 7,
    #[doc(alias = "FT_NOFOLLOW")]
    /// Symbolic link could not be followed.
    NoFollow = 8,
    #[doc(alias = "FT_NOSTAT")]
    /// Entry could not be stat'ed.
    NoStat = 9,
    #[doc(alias = "FT_NOCHG")]
    /// Entry unchanged since the previous backup.
    NoChange = 10,
    #[doc(alias = "FT_DIRNOCHG")]
    /// Directory unchanged since the previous backup.
    DirNoChange = 11,
    #[doc(alias = "FT_ISARCH")]
    /// Entry is the archive being written.
    IsArchive = 12,
    #[doc(alias = "FT_NORECURSE")]
    /// Directory not descended into because recursion is disabled.
    NoRecurse = 13,
    #[doc(alias = "FT_NOFSCHG")]
    /// Directory on a different filesystem that is not crossed.
    NoFsChange = 14,
    #[doc(alias = "FT_NOOPEN")]
    /// Directory could not be opened.
    NoOpen = 15,
    #[doc(alias = "FT_RAW")]
    /// Raw device read as a data stream.
    Raw = 16,
    #[doc(alias = "FT_FIFO")]
    /// Named pipe read as a data stream.
    Fifo = 17,
    #[doc(alias = "FT_DIRBEGIN")]
    /// Directory, emitted before its contents.
    DirectoryBegin = 18,
    #[doc(alias = "FT_INVALIDFS")]
    /// Directory on a filesystem type that is not allowed.
    InvalidFs = 19,
    #[doc(alias = "FT_INVALIDDT")]
    /// Entry on a drive type that is not allowed.
    InvalidDriveType = 20,
    #[doc(alias = "FT_REPARSE")]
    /// Windows reparse point.
    Reparse = 21,
    #[doc(alias = "FT_PLUGIN")]
    /// Entry produced by a plugin.
    Plugin = 22,
    #[doc(alias = "FT_DELETED")]
    /// Synthetic notice of a file deleted since the previous backup.
    Deleted = 23,
}

impl FileType {
    /// Returns the numeric code written in attributes records.
    #[must_use]
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Attempts to construct a [`FileType`] from the masked type field.
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::LinkSaved),
            2 => Some(Self::RegularEmpty),
            3 => Some(Self::Regular),
            4 => Some(Self::Symlink),
            5 => Some(Self::DirectoryEnd),
            6 => Some(Self::Special),
            7 => Some(Self::NoAccess),
            8 => Some(Self::NoFollow),
            9 => Some(Self::NoStat),
            10 => Some(Self::NoChange),
            11 => Some(Self::DirNoChange),
            12 => Some(Self::IsArchive),
            13 => Some(Self::NoRecurse),
            14 => Some(Self::NoFsChange),
            15 => Some(Self::NoOpen),
            16 => Some(Self::Raw),
            17 => Some(Self::Fifo),
            18 => Some(Self::DirectoryBegin),
            19 => Some(Self::InvalidFs),
            20 => Some(Self::InvalidDriveType),
            21 => Some(Self::Reparse),
            22 => Some(Self::Plugin),
            23 => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Reports whether records of this type carry file content.
    #[must_use]
    pub const fn has_file_data(self) -> bool {
        matches!(self, Self::Regular | Self::RegularEmpty | Self::Raw)
    }

    /// Reports whether the record name carries a trailing separator.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(
            self,
            Self::DirectoryEnd
                | Self::DirectoryBegin
                | Self::DirNoChange
                | Self::NoRecurse
                | Self::NoFsChange
                | Self::InvalidFs
                | Self::Reparse
        )
    }

    /// Mnemonic used in traces.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LinkSaved => "LNKSAVED",
            Self::RegularEmpty => "REGE",
            Self::Regular => "REG",
            Self::Symlink => "LNK",
            Self::DirectoryEnd => "DIREND",
            Self::Special => "SPEC",
            Self::NoAccess => "NOACCESS",
            Self::NoFollow => "NOFOLLOW",
            Self::NoStat => "NOSTAT",
            Self::NoChange => "NOCHG",
            Self::DirNoChange => "DIRNOCHG",
            Self::IsArchive => "ISARCH",
            Self::NoRecurse => "NORECURSE",
            Self::NoFsChange => "NOFSCHG",
            Self::NoOpen => "NOOPEN",
            Self::Raw => "RAW",
            Self::Fifo => "FIFO",
            Self::DirectoryBegin => "DIRBEGIN",
            Self::InvalidFs => "INVALIDFS",
            Self::InvalidDriveType => "INVALIDDT",
            Self::Reparse => "REPARSE",
            Self::Plugin => "PLUGIN",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for value in 1..=23 {
            let file_type = FileType::from_u32(value).expect("defined type");
            assert_eq!(file_type.as_u32(), value);
        }
        assert_eq!(FileType::from_u32(0), None);
        assert_eq!(FileType::from_u32(24), None);
    }

    #[test]
    fn flag_bit_sits_above_mask() {
        let field = FileType::Regular.as_u32() | AR_DATA_STREAM;
        assert_eq!(field & FT_MASK, 3);
        assert_ne!(field & AR_DATA_STREAM, 0);
    }

    #[test]
    fn only_regular_and_raw_entries_carry_file_data() {
        assert!(FileType::Regular.has_file_data());
        assert!(FileType::Raw.has_file_data());
        assert!(!FileType::Fifo.has_file_data());
        assert!(!FileType::Symlink.has_file_data());
    }
}
