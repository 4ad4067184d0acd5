//! Reference photo intake and bookkeeping.

use crate::ids::{IdAllocator, UuidAllocator};
use base64::Engine;

/// Upper bound on reference photos per session.
///
/// The store itself accepts any number; the cap is a policy of the caller
/// (the UI in the original workflow), which [`crate::Studio`] also enforces
/// defensively.
pub const MAX_REFERENCE_IMAGES: usize = 10;

/// A user-supplied photo, base64-encoded at intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    id: String,
    media_type: String,
    data_url: String,
}

impl ReferenceImage {
    /// Unique id within the session.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// MIME type of the original file.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Full `data:` URL, suitable for direct display.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Base64 payload without the `data:` prefix, as sent on the wire.
    pub fn payload(&self) -> &str {
        self.data_url
            .split_once(',')
            .map(|(_, payload)| payload)
            .unwrap_or(&self.data_url)
    }
}

/// Ordered collection of reference photos.
///
/// Order is insertion order; it matters for display but carries no meaning
/// for generation. Images are immutable once added and removed only by id.
pub struct ReferenceStore {
    images: Vec<ReferenceImage>,
    ids: Box<dyn IdAllocator>,
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceStore {
    /// Creates an empty store with random ids.
    pub fn new() -> Self {
        Self::with_allocator(Box::new(UuidAllocator))
    }

    /// Creates an empty store with an injected id allocator.
    pub fn with_allocator(ids: Box<dyn IdAllocator>) -> Self {
        Self {
            images: Vec::new(),
            ids,
        }
    }

    /// Encodes the raw bytes and appends a new reference image.
    pub fn add(&mut self, bytes: &[u8], media_type: &str) -> &ReferenceImage {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.images.push(ReferenceImage {
            id: self.ids.next_id(),
            media_type: media_type.to_string(),
            data_url: format!("data:{media_type};base64,{payload}"),
        });
        self.images.last().expect("image was just pushed")
    }

    /// Removes the image with the given id. No-op when absent.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|image| image.id != id);
        self.images.len() != before
    }

    /// Images in insertion order.
    pub fn images(&self) -> &[ReferenceImage] {
        &self.images
    }

    /// Number of images in the store.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when no images have been added.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// True once the session cap is reached.
    pub fn is_full(&self) -> bool {
        self.images.len() >= MAX_REFERENCE_IMAGES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequenceAllocator;

    fn store() -> ReferenceStore {
        ReferenceStore::with_allocator(Box::new(SequenceAllocator::new("img")))
    }

    #[test]
    fn test_add_encodes_data_url() {
        let mut store = store();
        let image = store.add(b"foo", "image/png");
        assert_eq!(image.id(), "img-0");
        assert_eq!(image.media_type(), "image/png");
        assert_eq!(image.data_url(), "data:image/png;base64,Zm9v");
        assert_eq!(image.payload(), "Zm9v");
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut store = store();
        store.add(b"a", "image/png");
        store.add(b"b", "image/jpeg");
        store.add(b"c", "image/png");
        let ids: Vec<_> = store.images().iter().map(ReferenceImage::id).collect();
        assert_eq!(ids, vec!["img-0", "img-1", "img-2"]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = store();
        store.add(b"a", "image/png");
        store.add(b"b", "image/png");
        assert!(store.remove("img-0"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.images()[0].id(), "img-1");
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = store();
        store.add(b"a", "image/png");
        store.add(b"b", "image/png");
        let before: Vec<_> = store.images().to_vec();
        assert!(!store.remove("missing"));
        assert_eq!(store.images(), before.as_slice());
    }

    #[test]
    fn test_is_full_at_cap() {
        let mut store = store();
        for _ in 0..MAX_REFERENCE_IMAGES {
            store.add(b"x", "image/png");
        }
        assert!(store.is_full());
    }

    #[test]
    fn test_payload_without_prefix_is_passthrough() {
        let image = ReferenceImage {
            id: "x".into(),
            media_type: "image/png".into(),
            data_url: "Zm9v".into(),
        };
        assert_eq!(image.payload(), "Zm9v");
    }
}
