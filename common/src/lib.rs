//! SSA intermediate representation shared by the front end, the pass manager
//! and plugins

use {core::hash::BuildHasherDefault, twox_hash::XxHash64};

pub mod arena;
pub mod intern;
pub mod ir;

pub type Hasher = XxHash64;

/// HashMap with non-default hasher
pub type HashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<Hasher>>;

/// HashSet with non-default hasher
pub type HashSet<T> = hashbrown::HashSet<T, BuildHasherDefault<Hasher>>;
