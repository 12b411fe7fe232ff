//! Lifecycle phase and operation flags.
//!
//! Both sets are independent bits so that a single interceptor can be
//! registered for several phases or operations at once, e.g.
//! `When::BEFORE | When::FINALLY`. Membership is a bitwise AND against a mask;
//! an empty mask simply never matches.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// The point in the CRUD lifecycle at which an interceptor runs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct When: u8 {
        /// Before the core handler. Runs in registration order.
        const BEFORE = 1 << 0;
        /// After the core handler succeeded. Runs in reverse registration order.
        const AFTER = 1 << 1;
        /// After the core handler failed. Runs in reverse registration order.
        const ON_ERROR = 1 << 2;
        /// After `AFTER` or `ON_ERROR`, whatever the outcome.
        const FINALLY = 1 << 3;
    }
}

bitflags! {
    /// The operation an interceptor applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Why: u8 {
        /// Resource creation.
        const CREATE = 1 << 0;
        /// Resource or data source read.
        const READ = 1 << 1;
        /// In-place resource update.
        const UPDATE = 1 << 2;
        /// Resource deletion.
        const DELETE = 1 << 3;
        /// Plan-time diff customization.
        const CUSTOMIZE_DIFF = 1 << 4;
        /// Import of an existing remote object.
        const IMPORT = 1 << 5;
    }
}

fn write_names<I>(f: &mut fmt::Formatter<'_>, names: I) -> fmt::Result
where
    I: Iterator<Item = &'static str>,
{
    let mut empty = true;
    for name in names {
        if !empty {
            f.write_str("|")?;
        }
        f.write_str(name)?;
        empty = false;
    }
    if empty {
        f.write_str("NONE")?;
    }
    Ok(())
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.iter_names().map(|(name, _)| name))
    }
}

impl fmt::Display for Why {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.iter_names().map(|(name, _)| name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composed_mask_membership() {
        let when = When::BEFORE | When::FINALLY;
        assert!(when.intersects(When::BEFORE));
        assert!(when.intersects(When::FINALLY));
        assert!(!when.intersects(When::AFTER));
        assert!(!when.intersects(When::ON_ERROR));
    }

    #[test]
    fn test_empty_mask_never_matches() {
        let why = Why::empty();
        for op in Why::all().iter() {
            assert!(!why.intersects(op));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(When::AFTER.to_string(), "AFTER");
        assert_eq!((Why::CREATE | Why::UPDATE).to_string(), "CREATE|UPDATE");
        assert_eq!(When::empty().to_string(), "NONE");
    }
}
