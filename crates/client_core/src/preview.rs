//! Display-only previews bound to the current selection.
//!
//! A [`PreviewGuard`] owns exactly one allocated handle and hands it back to its
//! allocator when dropped, so replacing or clearing a selection can never leak or
//! double-release a preview.

use std::{
    collections::HashSet,
    io::Cursor,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use shared::domain::{ImagePayload, PreviewId};
use tracing::{debug, warn};

#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    pub id: PreviewId,
    pub filename: String,
    pub dimensions: Option<(u32, u32)>,
}

pub trait PreviewAllocator: Send + Sync {
    fn allocate(&self, image: &ImagePayload) -> PreviewHandle;
    fn release(&self, handle: &PreviewHandle);
}

pub struct PreviewGuard {
    handle: PreviewHandle,
    allocator: Arc<dyn PreviewAllocator>,
}

impl PreviewGuard {
    pub fn allocate(allocator: Arc<dyn PreviewAllocator>, image: &ImagePayload) -> Self {
        let handle = allocator.allocate(image);
        Self { handle, allocator }
    }

    pub fn handle(&self) -> &PreviewHandle {
        &self.handle
    }
}

impl std::fmt::Debug for PreviewGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewGuard")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for PreviewGuard {
    fn drop(&mut self) {
        self.allocator.release(&self.handle);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewStats {
    pub allocated: u64,
    pub released: u64,
    pub live: usize,
}

/// Reads image dimensions for display. Undecodable payloads still get a handle.
#[derive(Default)]
pub struct ImagePreviewAllocator {
    next_id: AtomicU64,
    released: AtomicU64,
    live: Mutex<HashSet<PreviewId>>,
}

impl ImagePreviewAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> PreviewStats {
        let live = self
            .live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        PreviewStats {
            allocated: self.next_id.load(Ordering::SeqCst),
            released: self.released.load(Ordering::SeqCst),
            live,
        }
    }
}

fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

impl PreviewAllocator for ImagePreviewAllocator {
    fn allocate(&self, image: &ImagePayload) -> PreviewHandle {
        let id = PreviewId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let dimensions = read_dimensions(&image.bytes);
        self.live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id);
        debug!(preview_id = %id, filename = %image.filename, ?dimensions, "allocated preview");
        PreviewHandle {
            id,
            filename: image.filename.clone(),
            dimensions,
        }
    }

    fn release(&self, handle: &PreviewHandle) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&handle.id);
        if removed {
            self.released.fetch_add(1, Ordering::SeqCst);
            debug!(preview_id = %handle.id, "released preview");
        } else {
            warn!(preview_id = %handle.id, "preview released twice or never allocated");
        }
    }
}

#[cfg(test)]
#[path = "tests/preview_tests.rs"]
mod tests;
