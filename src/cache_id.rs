//! Process-wide cache identities for GPU resources.
//!
//! GL handles are recycled once an object is deleted, so the render-state
//! cache never compares handles. Every texture, shader and uniform buffer
//! instead carries a [`CacheId`] drawn from a per-category counter that only
//! grows for the lifetime of the process. Counters start at 1; `0` is reserved
//! for "nothing bound".

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one GPU resource state, for cheap staleness checks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheId(u64);

impl CacheId {
    /// The identity of "no resource".
    pub const NONE: Self = Self(0);

    /// The raw counter value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Which counter a resource draws its identities from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Category {
    Texture,
    Shader,
    Buffer,
}

static TEXTURE_IDS: AtomicU64 = AtomicU64::new(1);
static SHADER_IDS: AtomicU64 = AtomicU64::new(1);
static BUFFER_IDS: AtomicU64 = AtomicU64::new(1);

/// Draw the next identity for `category`.
pub(crate) fn next(category: Category) -> CacheId {
    let counter = match category {
        Category::Texture => &TEXTURE_IDS,
        Category::Shader => &SHADER_IDS,
        Category::Buffer => &BUFFER_IDS,
    };
    CacheId(counter.fetch_add(1, Ordering::Relaxed))
}
