// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use super::{EventStore, StatusStore, StoreError};
use crate::types::{EventRecord, EventStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    watermarks: RwLock<HashMap<String, i64>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn get(&self, id: &str) -> Result<i64, StoreError> {
        self.watermarks
            .read()
            .await
            .get(id)
            .copied()
            .ok_or(StoreError::NotFound)
    }

    async fn create(&self, id: &str, value: i64) -> Result<(), StoreError> {
        let mut watermarks = self.watermarks.write().await;
        if watermarks.contains_key(id) {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }
        watermarks.insert(id.to_string(), value);
        Ok(())
    }

    async fn update(&self, id: &str, value: i64) -> Result<(), StoreError> {
        match self.watermarks.write().await.get_mut(id) {
            Some(current) => {
                *current = value;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    records: RwLock<HashMap<String, EventRecord>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn create(&self, record: &EventRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update_submitted(
        &self,
        id: &str,
        schedule_id: Option<&str>,
        transaction_id: &str,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or(StoreError::NotFound)?;
        record.status = EventStatus::Submitted;
        record.schedule_id = schedule_id.map(str::to_string);
        record.transaction_id = Some(transaction_id.to_string());
        Ok(())
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).ok_or(StoreError::NotFound)?;
        record.status = status;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    fn record(id: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            kind: EventKind::Burn,
            amount: "100".into(),
            recipient: "0.0.1001".into(),
            native_asset: "HBAR".into(),
            wrapped_asset: "0xab".into(),
            status: EventStatus::Initial,
            schedule_id: None,
            transaction_id: None,
        }
    }

    #[tokio::test]
    async fn test_status_store_not_found_is_distinct() {
        let store = InMemoryStatusStore::new();
        assert_eq!(store.get("296-0xabc").await, Err(StoreError::NotFound));
        assert_eq!(store.update("296-0xabc", 5).await, Err(StoreError::NotFound));

        store.create("296-0xabc", 10).await.unwrap();
        assert!(matches!(
            store.create("296-0xabc", 11).await,
            Err(StoreError::AlreadyExists(_))
        ));
        store.update("296-0xabc", 12).await.unwrap();
        assert_eq!(store.get("296-0xabc").await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_event_store_transitions() {
        let store = InMemoryEventStore::new();
        store.create(&record("0x01-2")).await.unwrap();
        assert!(matches!(
            store.create(&record("0x01-2")).await,
            Err(StoreError::AlreadyExists(_))
        ));

        store
            .update_submitted("0x01-2", Some("0.0.777"), "0.0.5@1.2")
            .await
            .unwrap();
        let stored = store.get("0x01-2").await.unwrap().unwrap();
        assert_eq!(stored.status, EventStatus::Submitted);
        assert_eq!(stored.schedule_id.as_deref(), Some("0.0.777"));

        store
            .update_status("0x01-2", EventStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            store.get("0x01-2").await.unwrap().unwrap().status,
            EventStatus::Completed
        );
        assert_eq!(
            store.update_status("missing", EventStatus::Failed).await,
            Err(StoreError::NotFound)
        );
        assert_eq!(store.len().await, 1);
    }
}
