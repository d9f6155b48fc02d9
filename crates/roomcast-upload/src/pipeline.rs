//! Tiered upload with local retention as the floor.

use std::path::Path;

use tracing::{info, warn};

use roomcast_ipc::{StorageTier, UploadReport};

use crate::store::{SegmentMeta, SegmentStore};

/// Tries each backend in order and deletes the local file only after one
/// of them confirms the segment is stored. When every backend fails the
/// file stays on disk and the report says so.
pub struct UploadPipeline {
    stores: Vec<Box<dyn SegmentStore>>,
}

impl UploadPipeline {
    /// Build a pipeline over the given backends, in fallback order.
    pub fn new(stores: Vec<Box<dyn SegmentStore>>) -> Self {
        Self { stores }
    }

    /// Number of configured backends.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Upload one finished segment.
    pub fn upload(&self, meta: &SegmentMeta, path: &Path) -> UploadReport {
        for store in &self.stores {
            let tier = store.tier();
            match store.put(meta, path) {
                Ok(link) => {
                    info!(
                        part = meta.part_number,
                        tier = tier.name(),
                        "Segment uploaded"
                    );
                    if let Err(e) = std::fs::remove_file(path) {
                        warn!(path = %path.display(), "Could not delete uploaded segment: {}", e);
                    }
                    return UploadReport {
                        part_number: meta.part_number,
                        success: true,
                        tier,
                        link,
                    };
                }
                Err(e) => {
                    warn!(
                        part = meta.part_number,
                        tier = tier.name(),
                        "Upload failed, trying next tier: {}",
                        e
                    );
                }
            }
        }

        warn!(
            part = meta.part_number,
            path = %path.display(),
            "All upload tiers failed, segment retained on disk"
        );
        UploadReport {
            part_number: meta.part_number,
            success: false,
            tier: StorageTier::Retained,
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{UploadError, UploadResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubStore {
        tier: StorageTier,
        succeed: bool,
        calls: Arc<AtomicUsize>,
    }

    impl SegmentStore for StubStore {
        fn tier(&self) -> StorageTier {
            self.tier
        }

        fn put(&self, _meta: &SegmentMeta, _path: &Path) -> UploadResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(Some("https://drive/view".to_string()))
            } else {
                Err(UploadError::Auth("stub failure".to_string()))
            }
        }
    }

    fn meta() -> SegmentMeta {
        SegmentMeta {
            room: "standup".to_string(),
            username: "alice".to_string(),
            part_number: 1,
        }
    }

    fn segment_on_disk(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("standup_alice_20240315_093005_part1.mp4");
        std::fs::write(&path, b"mp4-bytes").unwrap();
        path
    }

    #[test]
    fn first_tier_success_deletes_file_and_skips_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = segment_on_disk(&dir);
        let cloud_calls = Arc::new(AtomicUsize::new(0));
        let origin_calls = Arc::new(AtomicUsize::new(0));

        let pipeline = UploadPipeline::new(vec![
            Box::new(StubStore {
                tier: StorageTier::Cloud,
                succeed: true,
                calls: Arc::clone(&cloud_calls),
            }),
            Box::new(StubStore {
                tier: StorageTier::Origin,
                succeed: true,
                calls: Arc::clone(&origin_calls),
            }),
        ]);

        let report = pipeline.upload(&meta(), &path);
        assert!(report.success);
        assert!(matches!(report.tier, StorageTier::Cloud));
        assert_eq!(report.link.as_deref(), Some("https://drive/view"));
        assert!(!path.exists());
        assert_eq!(cloud_calls.load(Ordering::SeqCst), 1);
        assert_eq!(origin_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_tier_falls_through_to_the_next() {
        let dir = tempfile::tempdir().unwrap();
        let path = segment_on_disk(&dir);
        let calls = Arc::new(AtomicUsize::new(0));

        let pipeline = UploadPipeline::new(vec![
            Box::new(StubStore {
                tier: StorageTier::Cloud,
                succeed: false,
                calls: Arc::clone(&calls),
            }),
            Box::new(StubStore {
                tier: StorageTier::Origin,
                succeed: true,
                calls: Arc::clone(&calls),
            }),
        ]);

        let report = pipeline.upload(&meta(), &path);
        assert!(report.success);
        assert!(matches!(report.tier, StorageTier::Origin));
        assert!(!path.exists());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn all_tiers_failing_retains_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = segment_on_disk(&dir);

        let pipeline = UploadPipeline::new(vec![
            Box::new(StubStore {
                tier: StorageTier::Cloud,
                succeed: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(StubStore {
                tier: StorageTier::Origin,
                succeed: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
        ]);

        let report = pipeline.upload(&meta(), &path);
        assert!(!report.success);
        assert!(matches!(report.tier, StorageTier::Retained));
        assert!(report.link.is_none());
        assert!(path.exists());
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        // The rotation timer and the capture worker hold the same pipeline.
        fn shareable<T: Send + Sync>(_: &T) {}
        let pipeline = UploadPipeline::new(vec![Box::new(StubStore {
            tier: StorageTier::Origin,
            succeed: true,
            calls: Arc::new(AtomicUsize::new(0)),
        })]);
        shareable(&pipeline);
    }

    #[test]
    fn empty_pipeline_retains_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = segment_on_disk(&dir);
        let pipeline = UploadPipeline::new(Vec::new());

        let report = pipeline.upload(&meta(), &path);
        assert!(!report.success);
        assert!(path.exists());
    }
}
