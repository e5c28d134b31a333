//! Per-resource request handling: GET/POST/PUT/DELETE over one resolved resource.
//!
//! A handler is built per request from the static model and the live store handle;
//! it holds no state of its own.

use crate::config::{ResolvedModel, ResolvedResource};
use crate::error::AppError;
use crate::query::{QueryBuilder, QueryParams};
use crate::response::{location, success_created, success_ok};
use crate::router::RouteContext;
use crate::service::{CrudService, ParentAssociation, RequestValidator, RetrievalService};
use crate::store::{parse_record_id, RecordStore, StoreGateway};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

/// Body key a directly addressed child resource may use to name its parent on create.
pub const BODY_PARENT_ID: &str = "parentId";

#[derive(Debug, Serialize)]
struct IdBody {
    id: String,
}

fn record_id(raw: &str) -> Result<i64, AppError> {
    parse_record_id(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid record ID format: {}", raw)))
}

fn parent_record_id(raw: &str) -> Result<i64, AppError> {
    parse_record_id(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid parent ID format: {}", raw)))
}

/// Parse a write body. Empty bodies count as `{}`.
pub fn parse_body(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON in request body: {}", e)))
}

pub struct ResourceHandler<'a> {
    model: &'a ResolvedModel,
    resource: &'a ResolvedResource,
    store: &'a dyn RecordStore,
}

impl<'a> ResourceHandler<'a> {
    pub fn new(model: &'a ResolvedModel, resource: &'a ResolvedResource, store: &'a dyn RecordStore) -> Self {
        ResourceHandler {
            model,
            resource,
            store,
        }
    }

    pub async fn get(&self, route: &RouteContext, params: &QueryParams) -> Result<Response, AppError> {
        if let Some(raw) = &route.id {
            let id = record_id(raw)?;
            let record = RetrievalService::find_by_id(self.store, self.model, self.resource, id).await?;
            return Ok(success_ok(record).into_response());
        }
        let query = QueryBuilder::build(&self.resource.mapper, params);
        let parent = match (&route.parent_id, &self.resource.parent) {
            (Some(raw), Some(link)) => Some((parent_record_id(raw)?, link)),
            _ => None,
        };
        let records = RetrievalService::find_all(self.store, self.model, self.resource, &query, parent).await?;
        Ok(success_ok(records).into_response())
    }

    pub async fn post(&self, route: &RouteContext, body: &[u8]) -> Result<Response, AppError> {
        if route.id.is_some() {
            return Err(AppError::BadRequest("POST does not accept a resource ID in path".into()));
        }
        let body = parse_body(body)?;
        let body = RequestValidator::body_object(&body)?;
        RequestValidator::require_mandatory(&self.resource.mapper, body)?;

        let parent_raw = route
            .parent_id
            .clone()
            .or_else(|| match body.get(BODY_PARENT_ID) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            });
        let parent = match (parent_raw, &self.resource.parent) {
            (Some(raw), Some(link)) => Some(ParentAssociation {
                parent_id: parent_record_id(&raw)?,
                association_name: link.association_name.as_str(),
            }),
            _ => None,
        };

        let fields = RequestValidator::writable_fields(&self.resource.mapper, body);
        let gateway = StoreGateway::new(self.store);
        let id = CrudService::create(&gateway, self.resource, fields, parent).await?;
        let id = id.to_string();
        let loc = location(&self.model.base_path, &self.resource.resource_path, &id);
        Ok(success_created(IdBody { id }, loc))
    }

    pub async fn put(&self, route: &RouteContext, body: &[u8]) -> Result<Response, AppError> {
        let raw = route
            .id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("PUT requires resource ID in path".into()))?;
        let id = record_id(raw)?;
        let body = parse_body(body)?;
        let body = RequestValidator::body_object(&body)?;
        let fields = RequestValidator::writable_fields(&self.resource.mapper, body);
        let gateway = StoreGateway::new(self.store);
        let saved = CrudService::update(&gateway, self.resource, id, fields).await?;
        Ok(success_ok(IdBody { id: saved.to_string() }).into_response())
    }

    pub async fn delete(&self, route: &RouteContext) -> Result<Response, AppError> {
        let raw = route
            .id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("DELETE requires resource ID in path".into()))?;
        let id = record_id(raw)?;
        let gateway = StoreGateway::new(self.store);
        CrudService::delete(&gateway, self.resource, id).await?;
        Ok(success_ok(IdBody { id: id.to_string() }).into_response())
    }
}
