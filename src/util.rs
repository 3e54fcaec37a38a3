//! Internal utilities.

/// Checks whether the process runs with root privileges.
///
/// Writing the system hosts file normally requires them. Always `true` on
/// non-Unix targets, where no cheap check exists.
#[must_use]
pub fn is_privileged() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: `geteuid` has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn matches_effective_uid() {
        // SAFETY: see `is_privileged`.
        let euid = unsafe { libc::geteuid() };
        assert_eq!(is_privileged(), euid == 0);
    }
}
