//! POSIX.1e short text form.
//!
//! One entry per line, `tag:qualifier:perms`, as produced by `acl_to_text`:
//!
//! ```text
//! user::rw-
//! user:alice:r--
//! group::r--
//! mask::r--
//! other::r--
//! ```
//!
//! The parser also accepts comma separated entries, single-letter tags,
//! `#` comments and the two-field form of `mask` and `other`.

use std::fmt;

use thiserror::Error;

/// Entry tag.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AclTag {
    /// The owning user (`user::`).
    UserObj,
    /// A named user.
    User,
    /// The owning group (`group::`).
    GroupObj,
    /// A named group.
    Group,
    /// The mask entry.
    Mask,
    /// Everyone else.
    Other,
}

/// Permission bits of one entry.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AclPerms(u8);

impl AclPerms {
    /// Read permission.
    pub const READ: Self = Self(0b100);
    /// Write permission.
    pub const WRITE: Self = Self(0b010);
    /// Execute or search permission.
    pub const EXECUTE: Self = Self(0b001);

    /// Builds permissions from the low three bits of `bits`.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Returns the permission bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Reports whether every bit in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn parse(field: &str) -> Option<Self> {
        if field.len() > 3 {
            return None;
        }
        let mut bits = 0;
        for byte in field.bytes() {
            bits |= match byte {
                b'r' => Self::READ.0,
                b'w' => Self::WRITE.0,
                b'x' => Self::EXECUTE.0,
                b'-' => 0,
                _ => return None,
            };
        }
        Some(Self(bits))
    }
}

impl fmt::Display for AclPerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |bit: Self, c: char| if self.contains(bit) { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Self::READ, 'r'),
            flag(Self::WRITE, 'w'),
            flag(Self::EXECUTE, 'x')
        )
    }
}

/// One ACL entry.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AclTextEntry {
    /// Entry tag.
    pub tag: AclTag,
    /// User or group name for named entries; empty otherwise.
    pub qualifier: String,
    /// Granted permissions.
    pub perms: AclPerms,
}

impl AclTextEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(tag: AclTag, qualifier: impl Into<String>, perms: AclPerms) -> Self {
        Self {
            tag,
            qualifier: qualifier.into(),
            perms,
        }
    }
}

impl fmt::Display for AclTextEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.tag {
            AclTag::UserObj | AclTag::User => "user",
            AclTag::GroupObj | AclTag::Group => "group",
            AclTag::Mask => "mask",
            AclTag::Other => "other",
        };
        write!(f, "{tag}:{}:{}", self.qualifier, self.perms)
    }
}

/// Errors raised while parsing the short text form.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AclTextError {
    /// An entry did not have the `tag:qualifier:perms` shape.
    #[error("malformed ACL entry \"{0}\"")]
    MalformedEntry(String),
    /// The tag was not one of user, group, mask or other.
    #[error("unknown ACL tag \"{0}\"")]
    UnknownTag(String),
    /// The permission field contained something other than `rwx-`.
    #[error("invalid ACL permissions \"{0}\"")]
    InvalidPerms(String),
}

/// Parses the short text form.
pub fn parse_acl_text(text: &str) -> Result<Vec<AclTextEntry>, AclTextError> {
    let mut entries = Vec::new();
    for raw in text.split(['\n', ',']) {
        let entry = raw.split('#').next().unwrap_or_default().trim();
        if entry.is_empty() {
            continue;
        }
        entries.push(parse_entry(entry)?);
    }
    Ok(entries)
}

fn parse_entry(entry: &str) -> Result<AclTextEntry, AclTextError> {
    let fields: Vec<&str> = entry.split(':').map(str::trim).collect();
    let (tag, qualifier, perms) = match fields.as_slice() {
        [tag, qualifier, perms] => (*tag, *qualifier, *perms),
        [tag, perms] => (*tag, "", *perms),
        _ => return Err(AclTextError::MalformedEntry(entry.to_owned())),
    };
    let named = !qualifier.is_empty();
    let tag = match (tag, named) {
        ("user" | "u", false) => AclTag::UserObj,
        ("user" | "u", true) => AclTag::User,
        ("group" | "g", false) => AclTag::GroupObj,
        ("group" | "g", true) => AclTag::Group,
        ("mask" | "m", false) => AclTag::Mask,
        ("other" | "o", false) => AclTag::Other,
        ("mask" | "m" | "other" | "o", true) => {
            return Err(AclTextError::MalformedEntry(entry.to_owned()));
        }
        (other, _) => return Err(AclTextError::UnknownTag(other.to_owned())),
    };
    let perms = AclPerms::parse(perms).ok_or_else(|| AclTextError::InvalidPerms(perms.to_owned()))?;
    Ok(AclTextEntry::new(tag, qualifier, perms))
}

/// Renders entries in the short text form, one per line.
#[must_use]
pub fn format_acl_text(entries: &[AclTextEntry]) -> String {
    let mut sorted: Vec<&AclTextEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.tag.cmp(&b.tag).then_with(|| a.qualifier.cmp(&b.qualifier)));
    let mut out = String::with_capacity(entries.len() * 16);
    for entry in sorted {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

/// Reports whether the ACL only restates the permission bits: owner, group
/// and other entries without names and without a mask.
#[must_use]
pub fn is_trivial(entries: &[AclTextEntry]) -> bool {
    entries
        .iter()
        .all(|entry| matches!(entry.tag, AclTag::UserObj | AclTag::GroupObj | AclTag::Other))
}
