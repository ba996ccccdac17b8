//! `serde` support: a [`PodVec`] serializes as a plain sequence, like `Vec`.

use core::fmt;
use core::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::allocator::PodAlloc;
use crate::PodVec;

impl<T, const N: usize, const R: usize, A> Serialize for PodVec<T, N, R, A>
where
    T: Copy + Serialize,
    A: PodAlloc,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for item in self.as_slice() {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

struct PodVecVisitor<T: Copy, const N: usize, const R: usize, A: PodAlloc> {
    marker: PhantomData<PodVec<T, N, R, A>>,
}

impl<'de, T, const N: usize, const R: usize, A> Visitor<'de> for PodVecVisitor<T, N, R, A>
where
    T: Copy + Deserialize<'de>,
    A: PodAlloc + Default,
{
    type Value = PodVec<T, N, R, A>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
        let mut vec = PodVec::new();
        if let Some(hint) = seq.size_hint() {
            vec.reserve(hint);
        }
        while let Some(item) = seq.next_element()? {
            vec.push(item);
        }
        Ok(vec)
    }
}

impl<'de, T, const N: usize, const R: usize, A> Deserialize<'de> for PodVec<T, N, R, A>
where
    T: Copy + Deserialize<'de>,
    A: PodAlloc + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(PodVecVisitor {
            marker: PhantomData,
        })
    }
}
