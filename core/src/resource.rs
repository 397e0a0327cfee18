//! Generic typed REST resource.
//!
//! # Design
//! Connectors, models and syncs all follow the same shape: a collection
//! path, member paths under it, and `{ id, type, attributes }` records inside
//! `ApiResponse` envelopes. `RestResource<A>` captures that once; the
//! endpoint modules declare a `const` per collection and add only the calls
//! that do not fit the pattern.

use std::fmt::Display;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::{to_payload, ApiClient};
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::query::{build_url, QueryParams};
use crate::types::{ApiResponse, Resource};

/// A REST collection whose records carry attributes of type `A`.
pub struct RestResource<A> {
    base: &'static str,
    _attributes: PhantomData<fn() -> A>,
}

impl<A> RestResource<A> {
    pub const fn new(base: &'static str) -> Self {
        Self {
            base,
            _attributes: PhantomData,
        }
    }

    pub fn collection_path(&self) -> &'static str {
        self.base
    }

    /// `{base}/{id}`
    pub fn member_path(&self, id: impl Display) -> String {
        format!("{}/{id}", self.base)
    }

    /// `{base}/{id}/{segment}`
    pub fn nested_path(&self, id: impl Display, segment: &str) -> String {
        format!("{}/{id}/{segment}", self.base)
    }

    /// Collection path with `params` appended.
    pub fn list_path(&self, params: &QueryParams) -> String {
        build_url(self.base, params)
    }
}

impl<A: DeserializeOwned> RestResource<A> {
    pub async fn list(
        &self,
        client: &ApiClient,
        params: &QueryParams,
    ) -> Result<ApiResponse<Vec<Resource<A>>>, ApiError> {
        client
            .api_fetch(HttpMethod::Get, &self.list_path(params), None, None)
            .await
    }

    pub async fn get(
        &self,
        client: &ApiClient,
        id: impl Display,
    ) -> Result<ApiResponse<Resource<A>>, ApiError> {
        client
            .api_fetch(HttpMethod::Get, &self.member_path(id), None, None)
            .await
    }

    pub async fn create<P: Serialize>(
        &self,
        client: &ApiClient,
        payload: &P,
    ) -> Result<ApiResponse<Resource<A>>, ApiError> {
        let payload = to_payload(payload)?;
        client
            .api_fetch(HttpMethod::Post, self.base, Some(&payload), None)
            .await
    }

    pub async fn update<P: Serialize>(
        &self,
        client: &ApiClient,
        id: impl Display,
        payload: &P,
    ) -> Result<ApiResponse<Resource<A>>, ApiError> {
        let payload = to_payload(payload)?;
        client
            .api_fetch(HttpMethod::Put, &self.member_path(id), Some(&payload), None)
            .await
    }

    pub async fn delete(
        &self,
        client: &ApiClient,
        id: impl Display,
    ) -> Result<ApiResponse<Resource<A>>, ApiError> {
        client
            .api_fetch(HttpMethod::Delete, &self.member_path(id), None, None)
            .await
    }
}
