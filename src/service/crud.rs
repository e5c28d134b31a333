//! Create / update / delete orchestration against the record store.
//!
//! Each step checks the previous step's outcome before the next call is made.
//! Nothing is rolled back: a failure after a partial step leaves the store as it is.

use crate::config::{ResolvedResource, DEFAULT_SECTION};
use crate::error::{AppError, StoreError};
use crate::store::{
    actions, IntegrationField, IntegrationRecord, IntegrationSection, StoreCall, StoreGateway,
    NEW_RECORD_ID, RECORD_INFORMATION_SECTION,
};

/// Parent a new record is associated with before it is committed.
#[derive(Clone, Copy, Debug)]
pub struct ParentAssociation<'a> {
    pub parent_id: i64,
    pub association_name: &'a str,
}

pub struct CrudService;

impl CrudService {
    /// Save as a new record, associate it under `parent` if given, then commit. Returns the new id.
    pub async fn create(
        gateway: &StoreGateway<'_>,
        resource: &ResolvedResource,
        fields: Vec<(String, String)>,
        parent: Option<ParentAssociation<'_>>,
    ) -> Result<i64, AppError> {
        const OP: &str = "Create";
        let object_type_id = Self::object_type(gateway, resource).await?;
        let record = build_record(resource, object_type_id, NEW_RECORD_ID, actions::CREATE, fields)?;
        let id = gateway.save(record).await.map_err(|f| f.into_app_error(OP))?;
        if let Some(p) = parent {
            gateway
                .associate(p.parent_id, id, p.association_name)
                .await
                .map_err(|f| f.into_app_error(OP))?;
        }
        gateway
            .trigger(StoreCall::TriggerSave, actions::SAVE, id)
            .await
            .map_err(|f| f.into_app_error(OP))?;
        tracing::info!(resource = %resource.resource_path, id, "record created");
        Ok(id)
    }

    /// Save changed fields onto an existing record, then commit.
    pub async fn update(
        gateway: &StoreGateway<'_>,
        resource: &ResolvedResource,
        id: i64,
        fields: Vec<(String, String)>,
    ) -> Result<i64, AppError> {
        const OP: &str = "Update";
        let object_type_id = Self::object_type(gateway, resource).await?;
        let record = build_record(resource, object_type_id, id, actions::SAVE, fields)?;
        let saved = gateway.save(record).await.map_err(|f| f.into_app_error(OP))?;
        gateway
            .trigger(StoreCall::TriggerSave, actions::SAVE, saved)
            .await
            .map_err(|f| f.into_app_error(OP))?;
        tracing::info!(resource = %resource.resource_path, id = saved, "record updated");
        Ok(saved)
    }

    pub async fn delete(gateway: &StoreGateway<'_>, resource: &ResolvedResource, id: i64) -> Result<(), AppError> {
        gateway
            .trigger(StoreCall::TriggerDelete, actions::DELETE, id)
            .await
            .map_err(|f| f.into_app_error("Delete"))?;
        tracing::info!(resource = %resource.resource_path, id, "record deleted");
        Ok(())
    }

    async fn object_type(gateway: &StoreGateway<'_>, resource: &ResolvedResource) -> Result<i64, AppError> {
        gateway
            .store()
            .resolve_type(&resource.module, &resource.business_object)
            .await
            .map_err(|e: StoreError| {
                tracing::error!(module = %resource.module, bo = %resource.business_object, error = %e, "type lookup failed");
                AppError::Store(e)
            })
    }
}

fn build_record(
    resource: &ResolvedResource,
    object_type_id: i64,
    id: i64,
    action: &str,
    fields: Vec<(String, String)>,
) -> Result<IntegrationRecord, AppError> {
    if fields.is_empty() {
        return Err(AppError::BadRequest("No fields to save".into()));
    }
    Ok(IntegrationRecord {
        id,
        object_type_id,
        object_type_name: resource.business_object.clone(),
        module: resource.module.clone(),
        form_name: resource.form_name.clone(),
        action: action.to_string(),
        sections: group_sections(resource, fields),
    })
}

/// Group fields by their section: `RecordInformation` first, `General` second, the rest in first-seen order.
pub fn group_sections(resource: &ResolvedResource, fields: Vec<(String, String)>) -> Vec<IntegrationSection> {
    let mut sections: Vec<IntegrationSection> = Vec::new();
    for (name, value) in fields {
        let section = resource
            .mapper
            .by_internal(&name)
            .map(|m| m.section.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SECTION);
        let field = IntegrationField { name, value };
        match sections.iter_mut().find(|s| s.name == section) {
            Some(s) => s.fields.push(field),
            None => sections.push(IntegrationSection {
                name: section.to_string(),
                fields: vec![field],
            }),
        }
    }
    let rank = |name: &str| match name {
        RECORD_INFORMATION_SECTION => 0,
        DEFAULT_SECTION => 1,
        _ => 2,
    };
    sections.sort_by_key(|s| rank(&s.name));
    sections
}
