use crate::catalogue::{Component, Identity};

/// Read seam between the compiler and whatever holds the components.
/// The core never performs I/O itself; an implementation may be backed by
/// memory, a database or anything else, as long as a published component
/// is returned as a fully formed, immutable snapshot.
pub trait ComponentStore {
    fn get(&self, identity: &Identity) -> Option<Component>;

    fn is_published(&self, identity: &Identity) -> bool;
}
