use core::any::TypeId;

use foldhash::fast::FixedState;

/// Hasher shared by every internal map; fixed so maps can live in statics.
pub(crate) const FIXED_HASHER: FixedState = FixedState::with_seed(0x5e71_a1c0_de0f_f1ce);

pub(crate) type FixedHashMap<K, V> = hashbrown::HashMap<K, V, FixedState>;

pub(crate) type TypeIdMap<V> = FixedHashMap<TypeId, V>;
