// Copyright (c) Hedera Bridge Contributors
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable, Selectable};

use crate::schema::{bridge_events, watermarks};

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = watermarks, check_for_backend(diesel::pg::Pg))]
pub struct Watermark {
    pub entity_id: String,
    pub block_number: i64,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = bridge_events, check_for_backend(diesel::pg::Pg))]
pub struct BridgeEventRow {
    pub id: String,
    pub kind: String,
    pub amount: String,
    pub recipient: String,
    pub native_asset: String,
    pub wrapped_asset: String,
    pub status: String,
    pub schedule_id: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = bridge_events)]
pub struct NewBridgeEvent<'a> {
    pub id: &'a str,
    pub kind: &'a str,
    pub amount: &'a str,
    pub recipient: &'a str,
    pub native_asset: &'a str,
    pub wrapped_asset: &'a str,
    pub status: &'a str,
}
