// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row store over the backend's REST interface.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use ptokyo_core::{
    AdapterType, Filter, HealthStatus, PluginAdapter, PtokyoError, RemoteDataService, Table,
};

use crate::client::{SupabaseClient, failure_text, transport_error};

/// [`RemoteDataService`] backed by the REST endpoint of one project.
#[derive(Debug, Clone)]
pub struct SupabaseRest {
    client: SupabaseClient,
}

impl SupabaseRest {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SupabaseClient {
        &self.client
    }
}

/// Query pairs for a filter, in the REST dialect (`column=gt.value`).
fn filter_query(filter: &Filter) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), "*".to_string())];
    if let Filter::GreaterThan { column, value } = filter {
        let operand = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        query.push((column.clone(), format!("gt.{operand}")));
    }
    query
}

async fn check(
    response: reqwest::Response,
    table: Table,
    op: &str,
) -> Result<reqwest::Response, PtokyoError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let message = failure_text(response).await;
    Err(PtokyoError::remote(format!("{op} on {table} failed: {message}")))
}

#[async_trait]
impl PluginAdapter for SupabaseRest {
    fn name(&self) -> &str {
        "supabase-rest"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Remote
    }

    async fn health_check(&self) -> Result<HealthStatus, PtokyoError> {
        let url = format!("{}/rest/v1/", self.client.base_url());
        match self.client.request(Method::HEAD, &url).send().await {
            Ok(r) if r.status().is_server_error() => {
                Ok(HealthStatus::Degraded(format!("status {}", r.status())))
            }
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PtokyoError> {
        Ok(())
    }
}

#[async_trait]
impl RemoteDataService for SupabaseRest {
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Value>, PtokyoError> {
        let url = self.client.rest_url(&table.to_string());
        let response = self
            .client
            .request(Method::GET, &url)
            .query(&filter_query(&filter))
            .send()
            .await
            .map_err(|e| transport_error("select request failed", e))?;
        let rows: Vec<Value> = check(response, table, "select")
            .await?
            .json()
            .await
            .map_err(|e| transport_error("select response unreadable", e))?;
        debug!(%table, rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, PtokyoError> {
        let url = self.client.rest_url(&table.to_string());
        let response = self
            .client
            .request(Method::POST, &url)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| transport_error("insert request failed", e))?;
        let stored: Vec<Value> = check(response, table, "insert")
            .await?
            .json()
            .await
            .map_err(|e| transport_error("insert response unreadable", e))?;
        stored
            .into_iter()
            .next()
            .ok_or_else(|| PtokyoError::remote(format!("insert on {table} returned no row")))
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<(), PtokyoError> {
        let url = self.client.rest_url(&table.to_string());
        let response = self
            .client
            .request(Method::PATCH, &url)
            .query(&[("id", format!("eq.{id}"))])
            .json(&patch)
            .send()
            .await
            .map_err(|e| transport_error("update request failed", e))?;
        check(response, table, "update").await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<(), PtokyoError> {
        let url = self.client.rest_url(&table.to_string());
        let response = self
            .client
            .request(Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()
            .await
            .map_err(|e| transport_error("upsert request failed", e))?;
        check(response, table, "upsert").await?;
        Ok(())
    }
}
