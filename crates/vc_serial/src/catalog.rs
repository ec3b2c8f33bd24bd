use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{PoisonError, RwLock};

use crate::SerialHooks;
use crate::hash::{FIXED_HASHER, TypeIdMap};
use crate::info::{MemberDescriptor, TypeDescriptor};

// -----------------------------------------------------------------------------
// MemberCatalog

/// Process-wide cache of the serializable members of each type.
///
/// Entries are computed lazily and never removed. Two threads racing on the
/// same type may both compute the list; the first insert wins and both
/// results are identical.
///
/// ```
/// use vc_serial::{MemberCatalog, derive::Reflect, info::Typed};
///
/// #[derive(Reflect, Default)]
/// #[reflect(default)]
/// struct Session {
///     user: String,
///     #[reflect(skip)]
///     token: String,
/// }
///
/// let members = MemberCatalog::members(Session::type_descriptor());
/// assert_eq!(members.len(), 1);
/// assert_eq!(members[0].name(), "user");
/// ```
pub struct MemberCatalog {
    cache: RwLock<TypeIdMap<Arc<[MemberDescriptor]>>>,
}

static CATALOG: MemberCatalog = MemberCatalog {
    cache: RwLock::new(TypeIdMap::with_hasher(FIXED_HASHER)),
};

impl MemberCatalog {
    /// Returns the ordered serializable members of `ty`.
    ///
    /// Non-composite types have no members.
    pub fn members(ty: &'static TypeDescriptor) -> Arc<[MemberDescriptor]> {
        if let Some(members) = CATALOG.get(ty) {
            return members;
        }
        let computed: Arc<[MemberDescriptor]> = match ty.as_composite() {
            Some(info) => info
                .members()
                .iter()
                .filter(|member| member.is_serializable())
                .cloned()
                .collect(),
            None => Arc::from(Vec::new()),
        };
        let mut cache = CATALOG.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(ty.type_id()).or_insert(computed))
    }

    /// Returns the members of `ty` after the get-members hook.
    ///
    /// The hook result is used for this call only and never cached.
    pub fn members_with(ty: &'static TypeDescriptor, hooks: &dyn SerialHooks) -> Arc<[MemberDescriptor]> {
        let members = Self::members(ty);
        match hooks.members(ty, &members) {
            Some(replaced) => Arc::from(replaced),
            None => members,
        }
    }

    fn get(&self, ty: &TypeDescriptor) -> Option<Arc<[MemberDescriptor]>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ty.type_id())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::MemberCatalog;
    use crate::SerialHooks;
    use crate::derive::Reflect;
    use crate::info::{MemberDescriptor, TypeDescriptor, Typed};

    #[derive(Reflect, Default)]
    #[reflect(type_path = "tests::catalog::Profile", default)]
    struct Profile {
        name: String,
        #[reflect(skip)]
        cached: u64,
        age: u16,
    }

    struct Reversed;

    impl SerialHooks for Reversed {
        fn members(
            &self,
            _owner: &'static TypeDescriptor,
            candidates: &[MemberDescriptor],
        ) -> Option<Vec<MemberDescriptor>> {
            Some(candidates.iter().rev().cloned().collect())
        }
    }

    #[test]
    fn skips_non_serializable_and_caches() {
        let ty = Profile::type_descriptor();
        let first = MemberCatalog::members(ty);
        let names: Vec<_> = first.iter().map(MemberDescriptor::name).collect();
        assert_eq!(names, ["name", "age"]);

        let second = MemberCatalog::members(ty);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(MemberCatalog::members(u8::type_descriptor()).is_empty());
    }

    #[test]
    fn hook_replaces_without_touching_cache() {
        let ty = Profile::type_descriptor();
        let hooked = MemberCatalog::members_with(ty, &Reversed);
        let names: Vec<_> = hooked.iter().map(MemberDescriptor::name).collect();
        assert_eq!(names, ["age", "name"]);

        let plain = MemberCatalog::members_with(ty, &());
        assert_eq!(plain[0].name(), "name");
    }

    #[test]
    fn concurrent_lookups_agree() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| MemberCatalog::members(Profile::type_descriptor()).len()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }
}
