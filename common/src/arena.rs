use core::{
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

#[derive(Debug, Clone)]
pub struct Arena<T> {
    vec: Vec<T>,
}

impl<T: serde::Serialize> serde::Serialize for Arena<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.vec.serialize(serializer)
    }
}

impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for Arena<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <Vec<T> as serde::Deserialize>::deserialize(deserializer).map(|vec| Arena { vec })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { vec: Vec::new() }
    }

    pub fn insert(&mut self, t: T) -> Ref<T> {
        self.vec.push(t);
        Ref {
            index: self.vec.len() - 1,
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Every reference handed out by this arena, in insertion order
    pub fn refs(&self) -> impl Iterator<Item = Ref<T>> + '_ {
        (0..self.vec.len()).map(|index| Ref {
            index,
            _phantom: PhantomData,
        })
    }
}

pub struct Ref<T> {
    index: usize,
    _phantom: PhantomData<T>,
}

impl<T> Ref<T> {
    pub fn get_mut<'reph, 'arena: 'reph>(&self, arena: &'arena mut Arena<T>) -> &'reph mut T {
        &mut arena.vec[self.index]
    }

    pub fn get<'reph, 'arena: 'reph>(&self, arena: &'arena Arena<T>) -> &'reph T {
        &arena.vec[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> serde::Serialize for Ref<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.index.serialize(serializer)
    }
}

impl<'de, T> serde::Deserialize<'de> for Ref<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        usize::deserialize(deserializer).map(|index| Ref {
            index,
            _phantom: PhantomData,
        })
    }
}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> Debug for Ref<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ref {:#x}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::Arena;

    #[test]
    fn refs_in_insertion_order() {
        let mut arena = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.refs().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(*b.get(&arena), "b");

        *a.get_mut(&mut arena) = "c";
        assert_eq!(*a.get(&arena), "c");
    }
}
