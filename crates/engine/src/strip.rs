//! Leading path component removal for saved names.
//!
//! Lets a snapshot mount such as `/snap/2024-01-01/home/alice` be saved as
//! `/home/alice`. Everything up to and including the first separator is
//! kept, then `count` components are dropped.

use protocol::FileType;

const SEPARATOR: u8 = b'/';

/// Removes `count` components after the leading one.
///
/// Returns `None` when the path does not have enough components, in which
/// case callers keep the original name.
#[must_use]
pub fn strip_components(path: &[u8], count: usize) -> Option<Vec<u8>> {
    if count == 0 {
        return Some(path.to_vec());
    }
    let first = path.iter().position(|&byte| byte == SEPARATOR)?;
    let mut out = Vec::with_capacity(path.len());
    out.extend_from_slice(&path[..=first]);

    let mut rest = &path[first + 1..];
    let mut separators = 1usize;
    let mut stripped = 0usize;
    while stripped < count && !rest.is_empty() {
        match rest.iter().position(|&byte| byte == SEPARATOR) {
            Some(end) => {
                separators += 1;
                rest = &rest[end + 1..];
            }
            None => rest = &[],
        }
        stripped += 1;
    }
    separators += rest.iter().filter(|&&byte| byte == SEPARATOR).count();
    out.extend_from_slice(rest);

    (stripped == count && separators > count).then_some(out)
}

/// Applies strip-path to a record name and its link field.
///
/// Symlink targets are never touched. If either strip fails both values are
/// returned unchanged.
#[must_use]
pub fn strip_names(file_type: FileType, name: &[u8], link: &[u8], count: u32) -> (Vec<u8>, Vec<u8>) {
    let count = count as usize;
    if count == 0 {
        return (name.to_vec(), link.to_vec());
    }
    let Some(stripped_name) = strip_components(name, count) else {
        return (name.to_vec(), link.to_vec());
    };
    if file_type == FileType::Symlink || link.is_empty() {
        return (stripped_name, link.to_vec());
    }
    match strip_components(link, count) {
        Some(stripped_link) => (stripped_name, stripped_link),
        None => (name.to_vec(), link.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn drops_components_after_root() {
        assert_eq!(
            strip_components(b"/a/b/c", 1).as_deref(),
            Some(&b"/b/c"[..])
        );
        assert_eq!(strip_components(b"/a/b/c", 2).as_deref(), Some(&b"/c"[..]));
        assert_eq!(
            strip_components(b"/snap/daily/home/alice/notes.txt", 2).as_deref(),
            Some(&b"/home/alice/notes.txt"[..])
        );
    }

    #[test]
    fn too_few_components_fail() {
        assert_eq!(strip_components(b"/a", 1), None);
        assert_eq!(strip_components(b"/a/b", 2), None);
        assert_eq!(strip_components(b"relative", 1), None);
    }

    #[test]
    fn zero_count_is_identity() {
        assert_eq!(strip_components(b"anything", 0).as_deref(), Some(&b"anything"[..]));
    }

    #[test]
    fn directory_names_keep_trailing_separator() {
        assert_eq!(
            strip_components(b"/mnt/data/projects/", 1).as_deref(),
            Some(&b"/data/projects/"[..])
        );
    }

    #[test]
    fn hard_link_names_are_stripped_together() {
        let (name, link) = strip_names(FileType::LinkSaved, b"/mnt/a/second", b"/mnt/a/first", 1);
        assert_eq!(name, b"/a/second");
        assert_eq!(link, b"/a/first");
    }

    #[test]
    fn symlink_targets_are_left_alone() {
        let (name, link) = strip_names(FileType::Symlink, b"/mnt/a/link", b"/mnt/a/target", 1);
        assert_eq!(name, b"/a/link");
        assert_eq!(link, b"/mnt/a/target");
    }

    #[test]
    fn failed_link_strip_restores_both() {
        let (name, link) = strip_names(FileType::LinkSaved, b"/mnt/a/second", b"/first", 1);
        assert_eq!(name, b"/mnt/a/second");
        assert_eq!(link, b"/first");
    }

    proptest! {
        #[test]
        fn stripping_keeps_the_remaining_components(
            components in prop::collection::vec("[a-z0-9._-]{1,8}", 1..8),
            count in 1usize..10,
        ) {
            let path = format!("/{}", components.join("/"));
            let stripped = strip_components(path.as_bytes(), count);
            if count < components.len() {
                let expected = format!("/{}", components[count..].join("/"));
                prop_assert_eq!(stripped, Some(expected.into_bytes()));
            } else {
                prop_assert_eq!(stripped, None);
            }
        }
    }
}
