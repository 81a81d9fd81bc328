// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

//! Postgres backed stores.

use super::{EventStore, StatusStore, StoreError};
use crate::types::{EventKind, EventRecord, EventStatus};
use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use hedera_bridge_pg_db::models::{BridgeEventRow, NewBridgeEvent, Watermark};
use hedera_bridge_pg_db::schema::{bridge_events, watermarks};
use hedera_bridge_pg_db::Db;
use std::str::FromStr;
use tracing::debug;

fn map_diesel_error(e: DieselError) -> StoreError {
    match e {
        DieselError::NotFound => StoreError::NotFound,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::AlreadyExists(info.message().to_string())
        }
        other => StoreError::Database(other.to_string()),
    }
}

#[derive(Clone)]
pub struct PgStatusStore {
    db: Db,
}

impl PgStatusStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn get(&self, id: &str) -> Result<i64, StoreError> {
        use watermarks::dsl;

        let mut conn = self.db.connect().await?;
        let value: Option<i64> = dsl::watermarks
            .filter(dsl::entity_id.eq(id))
            .select(dsl::block_number)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        value.ok_or(StoreError::NotFound)
    }

    async fn create(&self, id: &str, value: i64) -> Result<(), StoreError> {
        let mut conn = self.db.connect().await?;
        let row = Watermark {
            entity_id: id.to_string(),
            block_number: value,
            updated_at: chrono::Utc::now().naive_utc(),
        };
        diesel::insert_into(watermarks::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        debug!("[StatusStore] Created watermark '{}' at {}", id, value);
        Ok(())
    }

    async fn update(&self, id: &str, value: i64) -> Result<(), StoreError> {
        use watermarks::dsl;

        let mut conn = self.db.connect().await?;
        let updated = diesel::update(dsl::watermarks.filter(dsl::entity_id.eq(id)))
            .set((
                dsl::block_number.eq(value),
                dsl::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        debug!("[StatusStore] Updated watermark '{}' to {}", id, value);
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgEventStore {
    db: Db,
}

impl PgEventStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl TryFrom<BridgeEventRow> for EventRecord {
    type Error = StoreError;

    fn try_from(row: BridgeEventRow) -> Result<Self, Self::Error> {
        Ok(EventRecord {
            kind: EventKind::from_str(&row.kind)
                .map_err(|e| StoreError::Database(format!("invalid kind {}: {e}", row.kind)))?,
            status: EventStatus::from_str(&row.status)
                .map_err(|e| StoreError::Database(format!("invalid status {}: {e}", row.status)))?,
            id: row.id,
            amount: row.amount,
            recipient: row.recipient,
            native_asset: row.native_asset,
            wrapped_asset: row.wrapped_asset,
            schedule_id: row.schedule_id,
            transaction_id: row.transaction_id,
        })
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, record: &EventRecord) -> Result<(), StoreError> {
        let mut conn = self.db.connect().await?;
        let row = NewBridgeEvent {
            id: &record.id,
            kind: record.kind.as_ref(),
            amount: &record.amount,
            recipient: &record.recipient,
            native_asset: &record.native_asset,
            wrapped_asset: &record.wrapped_asset,
            status: record.status.as_ref(),
        };
        diesel::insert_into(bridge_events::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn update_submitted(
        &self,
        id: &str,
        schedule_id: Option<&str>,
        transaction_id: &str,
    ) -> Result<(), StoreError> {
        use bridge_events::dsl;

        let mut conn = self.db.connect().await?;
        let updated = diesel::update(dsl::bridge_events.filter(dsl::id.eq(id)))
            .set((
                dsl::status.eq(EventStatus::Submitted.as_ref()),
                dsl::schedule_id.eq(schedule_id),
                dsl::transaction_id.eq(Some(transaction_id)),
                dsl::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_status(&self, id: &str, status: EventStatus) -> Result<(), StoreError> {
        use bridge_events::dsl;

        let mut conn = self.db.connect().await?;
        let updated = diesel::update(dsl::bridge_events.filter(dsl::id.eq(id)))
            .set((
                dsl::status.eq(status.as_ref()),
                dsl::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<EventRecord>, StoreError> {
        use bridge_events::dsl;

        let mut conn = self.db.connect().await?;
        let row: Option<BridgeEventRow> = dsl::bridge_events
            .filter(dsl::id.eq(id))
            .select(BridgeEventRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(EventRecord::try_from).transpose()
    }
}
