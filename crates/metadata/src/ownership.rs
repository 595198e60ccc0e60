#![allow(unsafe_code)]

use rustix::fs::{Gid, Uid};
use rustix::process::{RawGid, RawUid};

pub(crate) fn uid_from_raw(raw: RawUid) -> Uid {
    // SAFETY: any numeric id is a valid owner for chown(2).
    unsafe { Uid::from_raw(raw) }
}

pub(crate) fn gid_from_raw(raw: RawGid) -> Gid {
    // SAFETY: any numeric id is a valid group for chown(2).
    unsafe { Gid::from_raw(raw) }
}

pub(crate) fn running_as_root() -> bool {
    rustix::process::geteuid().is_root()
}
