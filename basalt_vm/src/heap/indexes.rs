// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::{
    fmt::Debug,
    hash::{Hash, Hasher},
    marker::PhantomData,
    num::NonZeroU32,
};
use std::ops::{Index, IndexMut};

use crate::{
    ecmascript::{
        execution::agent::ErrorHeapData,
        scripts_and_modules::module::module_semantics::synthetic_module_records::SyntheticModuleHeapData,
    },
    heap::{CellHeapData, StringHeapData},
};

/// A non-zero index into a heap vector of `T`s. Due to the non-zero value,
/// the offset in the vector is offset by one. This keeps
/// `Option<BaseIndex<T>>` the size of a u32.
pub struct BaseIndex<T>(NonZeroU32, PhantomData<T>);

const _INDEX_SIZE_IS_U32: () = assert!(size_of::<BaseIndex<()>>() == size_of::<u32>());
const _OPTION_INDEX_SIZE_IS_U32: () =
    assert!(size_of::<Option<BaseIndex<()>>>() == size_of::<u32>());

pub type CellIndex = BaseIndex<CellHeapData>;
pub type ErrorIndex = BaseIndex<ErrorHeapData>;
pub type StringIndex = BaseIndex<StringHeapData>;
pub type SyntheticModuleIndex = BaseIndex<SyntheticModuleHeapData>;

// Manual trait impls: deriving would put unwanted bounds on T.

impl<T> Debug for BaseIndex<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        (self.0.get() - 1).fmt(f)
    }
}

impl<T> Clone for BaseIndex<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BaseIndex<T> {}

impl<T> PartialEq for BaseIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for BaseIndex<T> {}

impl<T> Hash for BaseIndex<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> BaseIndex<T> {
    /// Creates an index pointing at the given heap vector slot.
    ///
    /// ## Panics
    /// If the given slot index does not fit a u32.
    pub(crate) fn from_index(value: usize) -> Self {
        assert!(value < u32::MAX as usize);
        let Some(index) = NonZeroU32::new(value as u32 + 1) else {
            unreachable!()
        };
        Self(index, PhantomData)
    }

    /// Index of the most recently pushed slot.
    pub(crate) fn last(slots: &[Option<T>]) -> Self {
        assert!(!slots.is_empty());
        Self::from_index(slots.len() - 1)
    }

    pub(crate) const fn into_index(self) -> usize {
        self.0.get() as usize - 1
    }
}

macro_rules! impl_heap_vec_index {
    ($data: ty) => {
        impl Index<BaseIndex<$data>> for Vec<Option<$data>> {
            type Output = $data;

            fn index(&self, index: BaseIndex<$data>) -> &Self::Output {
                self.get(index.into_index())
                    .expect(concat!(stringify!($data), " index out of bounds"))
                    .as_ref()
                    .expect(concat!(stringify!($data), " slot empty"))
            }
        }

        impl IndexMut<BaseIndex<$data>> for Vec<Option<$data>> {
            fn index_mut(&mut self, index: BaseIndex<$data>) -> &mut Self::Output {
                self.get_mut(index.into_index())
                    .expect(concat!(stringify!($data), " index out of bounds"))
                    .as_mut()
                    .expect(concat!(stringify!($data), " slot empty"))
            }
        }
    };
}

impl_heap_vec_index!(CellHeapData);
impl_heap_vec_index!(ErrorHeapData);
impl_heap_vec_index!(StringHeapData);
impl_heap_vec_index!(SyntheticModuleHeapData);
