//! Test doubles for the cloud provider ports.

use crate::domain::ports::{
    Clock, CloudInventory, InstanceFilter, InstancePage, MetadataSource, TagPair,
    VolumeDescription, VolumeFilter, VolumePage,
};
use crate::error::BoxError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Scripted cloud inventory: each describe call pops the next queued page
/// (or error); attach calls are recorded and answered from a queue,
/// defaulting to success.
#[derive(Default)]
pub(crate) struct FakeCloud {
    instance_pages: Mutex<VecDeque<Result<InstancePage, String>>>,
    volume_pages: Mutex<VecDeque<Result<VolumePage, String>>>,
    attach_responses: Mutex<VecDeque<Result<(), String>>>,
    /// (device, instance_id, volume_id) per attach call
    pub attach_calls: Mutex<Vec<(String, String, String)>>,
    /// Filter passed to each describe_volumes call
    pub volume_filters: Mutex<Vec<VolumeFilter>>,
}

impl FakeCloud {
    pub fn push_instance_page(&self, page: InstancePage) {
        self.instance_pages.lock().push_back(Ok(page));
    }

    pub fn push_instance_error(&self, message: &str) {
        self.instance_pages.lock().push_back(Err(message.to_string()));
    }

    pub fn push_volume_page(&self, page: VolumePage) {
        self.volume_pages.lock().push_back(Ok(page));
    }

    pub fn push_volume_error(&self, message: &str) {
        self.volume_pages.lock().push_back(Err(message.to_string()));
    }

    pub fn push_attach_error(&self, message: &str) {
        self.attach_responses.lock().push_back(Err(message.to_string()));
    }
}

#[async_trait]
impl CloudInventory for FakeCloud {
    async fn describe_instances(
        &self,
        _filter: &InstanceFilter,
        _page_token: Option<&str>,
    ) -> Result<InstancePage, BoxError> {
        match self.instance_pages.lock().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(message.into()),
            None => Ok(InstancePage::default()),
        }
    }

    async fn describe_volumes(
        &self,
        filter: &VolumeFilter,
        _page_token: Option<&str>,
    ) -> Result<VolumePage, BoxError> {
        self.volume_filters.lock().push(filter.clone());
        match self.volume_pages.lock().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(message.into()),
            None => Ok(VolumePage::default()),
        }
    }

    async fn attach_volume(
        &self,
        device: &str,
        instance_id: &str,
        volume_id: &str,
    ) -> Result<(), BoxError> {
        self.attach_calls.lock().push((
            device.to_string(),
            instance_id.to_string(),
            volume_id.to_string(),
        ));
        match self.attach_responses.lock().pop_front() {
            Some(Ok(())) | None => Ok(()),
            Some(Err(message)) => Err(message.into()),
        }
    }
}

/// Metadata source with per-field scripted results
pub(crate) struct FakeMetadata {
    pub region: Result<String, String>,
    pub availability_zone: Result<String, String>,
    pub instance_id: Result<String, String>,
}

impl FakeMetadata {
    pub fn healthy(region: &str, zone: &str, instance_id: &str) -> Self {
        Self {
            region: Ok(region.to_string()),
            availability_zone: Ok(zone.to_string()),
            instance_id: Ok(instance_id.to_string()),
        }
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn region(&self) -> Result<String, BoxError> {
        self.region.clone().map_err(Into::into)
    }

    async fn availability_zone(&self) -> Result<String, BoxError> {
        self.availability_zone.clone().map_err(Into::into)
    }

    async fn instance_id(&self) -> Result<String, BoxError> {
        self.instance_id.clone().map_err(Into::into)
    }
}

/// Clock that records requested sleeps and returns immediately
#[derive(Default)]
pub(crate) struct ManualClock {
    pub sleeps: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

/// Minimal volume description for fixtures
pub(crate) fn volume_description(
    volume_id: &str,
    state: &str,
    tags: Vec<TagPair>,
) -> VolumeDescription {
    VolumeDescription {
        volume_id: volume_id.to_string(),
        state: state.to_string(),
        availability_zone: Some("us-east-1a".to_string()),
        attachments: Vec::new(),
        tags,
    }
}
