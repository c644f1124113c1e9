// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote data service trait for the managed row store.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PtokyoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Filter, Record, Table};

/// Adapter for the row-level persistence backend.
///
/// Rows travel as JSON objects keyed by column name. Use [`fetch_records`]
/// and [`insert_record`] for typed access.
#[async_trait]
pub trait RemoteDataService: PluginAdapter {
    /// Returns every row of `table` matching `filter`.
    async fn select(
        &self,
        table: Table,
        filter: Filter,
    ) -> Result<Vec<serde_json::Value>, PtokyoError>;

    /// Inserts a row and returns the server's representation of it
    /// (with the durable id and server timestamps).
    async fn insert(
        &self,
        table: Table,
        row: serde_json::Value,
    ) -> Result<serde_json::Value, PtokyoError>;

    /// Applies `patch` to the row whose id equals `id`.
    async fn update(
        &self,
        table: Table,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<(), PtokyoError>;

    /// Inserts the row, or merges it into the existing row with the same id.
    async fn upsert(&self, table: Table, row: serde_json::Value) -> Result<(), PtokyoError>;
}

/// Selects and decodes every row of `T::TABLE` matching `filter`.
pub async fn fetch_records<T>(
    remote: &dyn RemoteDataService,
    filter: Filter,
) -> Result<Vec<T>, PtokyoError>
where
    T: Record + DeserializeOwned,
{
    remote
        .select(T::TABLE, filter)
        .await?
        .into_iter()
        .map(decode_row::<T>)
        .collect()
}

/// Inserts `payload` into `T::TABLE` and decodes the server representation.
pub async fn insert_record<T, P>(
    remote: &dyn RemoteDataService,
    payload: &P,
) -> Result<T, PtokyoError>
where
    T: Record + DeserializeOwned,
    P: Serialize + Sync,
{
    let row = serde_json::to_value(payload).map_err(|e| PtokyoError::Decode {
        table: T::TABLE,
        source: e,
    })?;
    let stored = remote.insert(T::TABLE, row).await?;
    decode_row::<T>(stored)
}

/// Decodes a single row into a record of `T::TABLE`.
pub fn decode_row<T>(row: serde_json::Value) -> Result<T, PtokyoError>
where
    T: Record + DeserializeOwned,
{
    serde_json::from_value(row).map_err(|e| PtokyoError::Decode {
        table: T::TABLE,
        source: e,
    })
}
