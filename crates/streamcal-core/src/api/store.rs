//! Client for the remote relational store.
//!
//! Tables are exposed through a PostgREST-style API under `/rest/v1`. Reads
//! use query-string filters (`date=gte.2026-02-09`); writes ask for the
//! written row back with `Prefer: return=representation`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use tracing::debug;

use super::{ApiError, HttpClient};
use crate::models::{DDayItem, Member, Notice, ScheduleDraft, ScheduleItem};

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// Reads and writes against the authoritative store.
#[async_trait]
pub trait StoreApi: Send + Sync {
    async fn fetch_members(&self) -> Result<Vec<Member>, ApiError>;

    async fn fetch_ddays(&self) -> Result<Vec<DDayItem>, ApiError>;

    async fn fetch_notices(&self) -> Result<Vec<Notice>, ApiError>;

    /// Schedules with `from <= date <= to`.
    async fn fetch_schedules(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ScheduleItem>, ApiError>;

    /// Schedules sharing the conflict key `(member_uid, date)`.
    async fn fetch_member_schedules(&self, member_uid: i64, date: NaiveDate) -> Result<Vec<ScheduleItem>, ApiError>;

    async fn insert_schedule(&self, draft: &ScheduleDraft) -> Result<ScheduleItem, ApiError>;

    async fn update_schedule(&self, id: i64, draft: &ScheduleDraft) -> Result<ScheduleItem, ApiError>;

    async fn delete_schedule(&self, id: i64) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct StoreClient {
    http: HttpClient,
}

impl StoreClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = HttpClient::new(base_url, timeout)?
            .with_header("apikey", api_key)
            .with_header("authorization", &format!("Bearer {}", api_key));
        Ok(Self { http })
    }

    /// PostgREST returns written rows as an array even for a single row.
    fn single_row(rows: Vec<ScheduleItem>, what: &str) -> Result<ScheduleItem, ApiError> {
        rows.into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("{} returned no rows", what)))
    }
}

#[async_trait]
impl StoreApi for StoreClient {
    async fn fetch_members(&self) -> Result<Vec<Member>, ApiError> {
        self.http.get("/rest/v1/members?select=*&order=uid.asc").await
    }

    async fn fetch_ddays(&self) -> Result<Vec<DDayItem>, ApiError> {
        self.http.get("/rest/v1/ddays?select=*&order=date.asc").await
    }

    async fn fetch_notices(&self) -> Result<Vec<Notice>, ApiError> {
        self.http.get("/rest/v1/notices?select=*&order=id.desc").await
    }

    async fn fetch_schedules(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ScheduleItem>, ApiError> {
        let path = format!(
            "/rest/v1/schedules?select=*&date=gte.{}&date=lte.{}&order=date.asc",
            from, to
        );
        let rows: Vec<ScheduleItem> = self.http.get(&path).await?;
        debug!(%from, %to, count = rows.len(), "Schedules fetched");
        Ok(rows)
    }

    async fn fetch_member_schedules(&self, member_uid: i64, date: NaiveDate) -> Result<Vec<ScheduleItem>, ApiError> {
        let path = format!(
            "/rest/v1/schedules?select=*&member_uid=eq.{}&date=eq.{}",
            member_uid, date
        );
        self.http.get(&path).await
    }

    async fn insert_schedule(&self, draft: &ScheduleDraft) -> Result<ScheduleItem, ApiError> {
        let rows = self
            .http
            .send_json(Method::POST, "/rest/v1/schedules", draft, &[RETURN_REPRESENTATION])
            .await?;
        Self::single_row(rows, "insert")
    }

    async fn update_schedule(&self, id: i64, draft: &ScheduleDraft) -> Result<ScheduleItem, ApiError> {
        let path = format!("/rest/v1/schedules?id=eq.{}", id);
        let rows = self
            .http
            .send_json(Method::PATCH, &path, draft, &[RETURN_REPRESENTATION])
            .await?;
        Self::single_row(rows, "update")
    }

    async fn delete_schedule(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/rest/v1/schedules?id=eq.{}", id)).await
    }
}
