//! Volume catalog: the single choke point for listing and polling volumes.
//!
//! Both candidate listing and attach-status polling flow through
//! [`VolumeCatalog::list`], so tag decoding and the fail-safe exclusion
//! policy apply uniformly. A page failure anywhere discards all partial
//! results and fails the whole operation.

use crate::catalog::tags::{decode_volume, TAG_CLUSTER_ID, TAG_ROLE_MASTER};
use crate::catalog::volume::VolumeDescriptor;
use crate::domain::ports::{
    CloudInventoryRef, FilterPredicate, VolumeDescription, VolumeFilter,
};
use crate::error::{Error, Result};
use tracing::{debug, warn};

/// Catalog of cluster volumes as reported by the cloud inventory API
pub struct VolumeCatalog {
    inventory: CloudInventoryRef,
    /// This node's instance id, used to scope attachment fields
    instance_id: String,
}

impl VolumeCatalog {
    pub fn new(inventory: CloudInventoryRef, instance_id: impl Into<String>) -> Self {
        Self {
            inventory,
            instance_id: instance_id.into(),
        }
    }

    // =========================================================================
    // Filter Presets
    // =========================================================================

    /// Volumes attachable in this zone: cluster tag matches, role tag
    /// present, availability zone matches
    pub fn mountable_filter(cluster_tag: &str, zone: &str) -> VolumeFilter {
        VolumeFilter {
            predicates: vec![
                FilterPredicate::TagEquals {
                    key: TAG_CLUSTER_ID.to_string(),
                    value: cluster_tag.to_string(),
                },
                FilterPredicate::TagPresent {
                    key: TAG_ROLE_MASTER.to_string(),
                },
                FilterPredicate::AvailabilityZone {
                    zone: zone.to_string(),
                },
            ],
            volume_ids: Vec::new(),
        }
    }

    /// Volumes already attached to the given instance
    pub fn mounted_filter(cluster_tag: &str, instance_id: &str) -> VolumeFilter {
        VolumeFilter {
            predicates: vec![
                FilterPredicate::TagEquals {
                    key: TAG_CLUSTER_ID.to_string(),
                    value: cluster_tag.to_string(),
                },
                FilterPredicate::TagPresent {
                    key: TAG_ROLE_MASTER.to_string(),
                },
                FilterPredicate::AttachedToInstance {
                    instance_id: instance_id.to_string(),
                },
            ],
            volume_ids: Vec::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// List volumes matching the filter, decoded and with malformed
    /// volumes excluded
    pub async fn list(&self, filter: &VolumeFilter) -> Result<Vec<VolumeDescriptor>> {
        let raw = self.fetch_all_pages(filter).await?;

        let mut volumes = Vec::with_capacity(raw.len());
        for description in &raw {
            let decoded = decode_volume(description, &self.instance_id);

            for issue in &decoded.issues {
                if issue.is_fatal() {
                    warn!(volume = %description.volume_id, %issue, "skipping volume");
                } else {
                    warn!(volume = %description.volume_id, %issue, "ignoring tag on volume");
                }
            }

            if !decoded.excluded() {
                volumes.push(decoded.descriptor);
            }
        }

        debug!(
            matched = raw.len(),
            returned = volumes.len(),
            "listed cluster volumes"
        );

        Ok(volumes)
    }

    /// Poll a single volume's current state; the degenerate single-id filter
    pub async fn poll_by_id(&self, volume_id: &str) -> Result<Vec<VolumeDescriptor>> {
        self.list(&VolumeFilter::by_id(volume_id)).await
    }

    async fn fetch_all_pages(&self, filter: &VolumeFilter) -> Result<Vec<VolumeDescription>> {
        let mut descriptions = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .inventory
                .describe_volumes(filter, page_token.as_deref())
                .await
                .map_err(|source| Error::CloudApi {
                    operation: "describe-volumes",
                    source,
                })?;

            descriptions.extend(page.volumes);

            match page.next_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(descriptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tags::TAG_MASTER_ID;
    use crate::domain::ports::{TagPair, VolumePage};
    use crate::testutil::{volume_description, FakeCloud};
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn catalog_over(cloud: Arc<FakeCloud>) -> VolumeCatalog {
        VolumeCatalog::new(cloud, "i-local")
    }

    #[tokio::test]
    async fn test_list_accumulates_pages() {
        let cloud = Arc::new(FakeCloud::default());
        cloud.push_volume_page(VolumePage {
            volumes: vec![volume_description("vol-1", "available", vec![])],
            next_token: Some("page-2".into()),
        });
        cloud.push_volume_page(VolumePage {
            volumes: vec![volume_description("vol-2", "available", vec![])],
            next_token: None,
        });

        let catalog = catalog_over(cloud);
        let volumes = catalog
            .list(&VolumeCatalog::mountable_filter("prod", "us-east-1a"))
            .await
            .unwrap();

        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].id, "vol-1");
        assert_eq!(volumes[1].id, "vol-2");
    }

    #[tokio::test]
    async fn test_page_error_discards_partial_results() {
        let cloud = Arc::new(FakeCloud::default());
        cloud.push_volume_page(VolumePage {
            volumes: vec![volume_description("vol-1", "available", vec![])],
            next_token: Some("page-2".into()),
        });
        cloud.push_volume_error("throttled");

        let catalog = catalog_over(cloud);
        let err = catalog
            .list(&VolumeCatalog::mountable_filter("prod", "us-east-1a"))
            .await
            .unwrap_err();

        assert_matches!(
            err,
            Error::CloudApi {
                operation: "describe-volumes",
                ..
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_volume_excluded_siblings_survive() {
        let cloud = Arc::new(FakeCloud::default());
        cloud.push_volume_page(VolumePage {
            volumes: vec![
                volume_description(
                    "vol-bad",
                    "available",
                    vec![TagPair::new(TAG_MASTER_ID, "three")],
                ),
                volume_description(
                    "vol-good",
                    "available",
                    vec![
                        TagPair::new(TAG_MASTER_ID, "3"),
                        TagPair::new("k8s.io/etcd/main", "b/a,b,c"),
                    ],
                ),
            ],
            next_token: None,
        });

        let catalog = catalog_over(cloud);
        let volumes = catalog
            .list(&VolumeCatalog::mountable_filter("prod", "us-east-1a"))
            .await
            .unwrap();

        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].id, "vol-good");
        assert_eq!(volumes[0].info.master_id, Some(3));
        assert_eq!(volumes[0].info.etcd_clusters[0].node_name, "b");
    }

    #[tokio::test]
    async fn test_bad_etcd_spec_excluded_siblings_keep_tags() {
        let cloud = Arc::new(FakeCloud::default());
        cloud.push_volume_page(VolumePage {
            volumes: vec![
                volume_description(
                    "vol-bad",
                    "available",
                    vec![TagPair::new("k8s.io/etcd/main", "no-members")],
                ),
                volume_description(
                    "vol-good",
                    "available",
                    vec![
                        TagPair::new("k8s.io/etcd/events", "c/a,b,c"),
                        TagPair::new("team", "storage"),
                    ],
                ),
            ],
            next_token: None,
        });

        let catalog = catalog_over(cloud);
        let volumes = catalog
            .list(&VolumeCatalog::mountable_filter("prod", "us-east-1a"))
            .await
            .unwrap();

        // Unknown tag on the good volume is informational, not excluding
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].id, "vol-good");
        assert_eq!(volumes[0].info.etcd_clusters[0].cluster_key, "events");
    }

    #[tokio::test]
    async fn test_poll_by_id_uses_single_id_filter() {
        let cloud = Arc::new(FakeCloud::default());
        cloud.push_volume_page(VolumePage {
            volumes: vec![volume_description("vol-1", "attaching", vec![])],
            next_token: None,
        });

        let catalog = catalog_over(cloud.clone());
        let volumes = catalog.poll_by_id("vol-1").await.unwrap();

        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].status, "attaching");

        let filters = cloud.volume_filters.lock();
        assert_eq!(filters[0], VolumeFilter::by_id("vol-1"));
    }

    #[test]
    fn test_mountable_filter_predicates() {
        let filter = VolumeCatalog::mountable_filter("prod", "us-east-1a");
        assert!(filter.predicates.contains(&FilterPredicate::TagEquals {
            key: TAG_CLUSTER_ID.to_string(),
            value: "prod".to_string(),
        }));
        assert!(filter.predicates.contains(&FilterPredicate::TagPresent {
            key: TAG_ROLE_MASTER.to_string(),
        }));
        assert!(filter.predicates.contains(&FilterPredicate::AvailabilityZone {
            zone: "us-east-1a".to_string(),
        }));
    }

    #[test]
    fn test_mounted_filter_predicates() {
        let filter = VolumeCatalog::mounted_filter("prod", "i-local");
        assert!(filter
            .predicates
            .contains(&FilterPredicate::AttachedToInstance {
                instance_id: "i-local".to_string(),
            }));
    }
}
