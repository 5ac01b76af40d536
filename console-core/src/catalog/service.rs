//! Catalog service
//!
//! Main services own their sub-services as an embedded list that is always
//! written back whole. Sub-service ids are assigned once at creation and
//! never recomputed; legacy documents are repaired on first read and the
//! repaired list is persisted.

use std::sync::Arc;

use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    MainService, MainServiceCreate, MainServiceUpdate, SubService, SubServiceCreate,
    SubServiceUpdate, normalize_main_service, sub_service_id,
};
use shared::util::{legacy_service_id, now_millis};

use crate::storage::ObjectStore;
use crate::storage::object_store::image_path;
use crate::store::{Document, DocumentStore, StoreTxn};
use crate::utils::InFlightGuard;

pub const MAIN_SERVICES: &str = "mainServices";

/// Proof that the caller confirmed a destructive bulk delete
///
/// Only constructible through [`Confirmation::delete_all`], which demands
/// the exact phrase.
#[derive(Debug)]
pub struct Confirmation(());

impl Confirmation {
    pub const DELETE_ALL_PHRASE: &'static str = "DELETE ALL SERVICES";

    pub fn delete_all(phrase: &str) -> AppResult<Self> {
        if phrase == Self::DELETE_ALL_PHRASE {
            Ok(Self(()))
        } else {
            Err(AppError::with_message(
                ErrorCode::ConfirmationRequired,
                format!("Type \"{}\" to confirm", Self::DELETE_ALL_PHRASE),
            ))
        }
    }
}

/// Image bytes to upload alongside a create or edit
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// File extension without the dot
    pub ext: String,
}

fn service_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::ServiceNotFound, id)
}

fn sub_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::SubServiceNotFound, id)
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    Ok(())
}

fn validate_price(price: f64) -> AppResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ServiceInvalidPrice,
            format!("price must be a finite non-negative number, got {}", price),
        ));
    }
    Ok(())
}

fn to_value<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::internal(e.to_string()))
}

fn read(doc: Document) -> AppResult<(MainService, bool)> {
    let normalized = normalize_main_service(&doc.id, doc.data)
        .map_err(|e| AppError::with_message(ErrorCode::InvalidFormat, e.to_string()))?;
    Ok((normalized.service, normalized.repaired))
}

/// Load inside a transaction; sub-service repairs are not written here
fn load(txn: &mut StoreTxn, id: &str) -> AppResult<MainService> {
    match txn.get(MAIN_SERVICES, id)? {
        Some(doc) => Ok(read(doc)?.0),
        None => Err(service_not_found(id)),
    }
}

fn write_sub_services(txn: &mut StoreTxn, service: &MainService) -> AppResult<()> {
    txn.update(
        MAIN_SERVICES,
        &service.id,
        json!({ "subServices": to_value(&service.sub_services)? }),
    )?;
    Ok(())
}

#[derive(Clone)]
pub struct CatalogService {
    store: DocumentStore,
    images: Arc<dyn ObjectStore>,
    guard: InFlightGuard,
}

impl CatalogService {
    pub fn new(store: DocumentStore, images: Arc<dyn ObjectStore>, guard: InFlightGuard) -> Self {
        Self {
            store,
            images,
            guard,
        }
    }

    /// Persist repaired sub-service ids once
    fn persist_repair(&self, service: &MainService) -> AppResult<()> {
        tracing::info!(
            service_id = %service.id,
            count = service.sub_services.len(),
            "Persisting repaired sub-service ids"
        );
        self.store.update(
            MAIN_SERVICES,
            &service.id,
            json!({ "subServices": to_value(&service.sub_services)? }),
        )?;
        Ok(())
    }

    pub fn get_main_service(&self, id: &str) -> AppResult<MainService> {
        let doc = self
            .store
            .get_by_id(MAIN_SERVICES, id)?
            .ok_or_else(|| service_not_found(id))?;
        let (service, repaired) = read(doc)?;
        if repaired {
            self.persist_repair(&service)?;
        }
        Ok(service)
    }

    pub fn list_main_services(&self) -> AppResult<Vec<MainService>> {
        let mut services = Vec::new();
        for doc in self.store.get_all(MAIN_SERVICES)? {
            let (service, repaired) = read(doc)?;
            if repaired {
                self.persist_repair(&service)?;
            }
            services.push(service);
        }
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    pub fn find_sub_service(&self, sub_id: &str) -> AppResult<(MainService, SubService)> {
        for service in self.list_main_services()? {
            if let Some(sub) = service.find_sub_service(sub_id).cloned() {
                return Ok((service, sub));
            }
        }
        Err(sub_not_found(sub_id))
    }

    async fn upload_image(&self, prefix: &str, name: &str, image: &ImageUpload) -> AppResult<String> {
        let path = image_path(prefix, name, &image.bytes, &image.ext);
        self.images.upload(&path, &image.bytes).await
    }

    pub async fn add_main_service(
        &self,
        data: MainServiceCreate,
        image: Option<ImageUpload>,
    ) -> AppResult<MainService> {
        validate_name(&data.name)?;
        let service = MainService {
            id: String::new(),
            service_id: Some(legacy_service_id()),
            name: data.name.trim().to_string(),
            description: data.description,
            image_url: data.image_url,
            is_active: data.is_active.unwrap_or(true),
            sub_services: Vec::new(),
        };
        let id = self.store.collection::<MainService>(MAIN_SERVICES).insert(&service)?;

        if let Some(image) = image {
            let url = self.upload_image(&format!("services/{}", id), "main", &image).await?;
            self.store.update(MAIN_SERVICES, &id, json!({ "imageUrl": url }))?;
        }

        tracing::info!(service_id = %id, name = %service.name, "Main service added");
        self.get_main_service(&id)
    }

    pub async fn edit_main_service(
        &self,
        id: &str,
        data: MainServiceUpdate,
        image: Option<ImageUpload>,
    ) -> AppResult<MainService> {
        let _ticket = self.guard.acquire(MAIN_SERVICES, id)?;
        let current = self.get_main_service(id)?;

        let mut patch = serde_json::Map::new();
        if let Some(name) = data.name {
            validate_name(&name)?;
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(description) = data.description {
            patch.insert("description".into(), json!(description));
        }
        if let Some(url) = data.image_url {
            patch.insert("imageUrl".into(), json!(url));
        }
        if let Some(active) = data.is_active {
            patch.insert("isActive".into(), json!(active));
        }
        if let Some(image) = image {
            let url = self.upload_image(&format!("services/{}", id), "main", &image).await?;
            patch.insert("imageUrl".into(), json!(url));
        }

        let replaced_image = match (patch.get("imageUrl"), current.image_url.as_deref()) {
            (Some(new), Some(old)) if new.as_str() != Some(old) => Some(old.to_string()),
            _ => None,
        };

        self.store.update(MAIN_SERVICES, id, Value::Object(patch))?;
        if let Some(old) = replaced_image
            && let Err(e) = self.images.delete_url(&old).await
        {
            tracing::warn!(service_id = %id, url = %old, error = %e, "Failed to delete replaced image");
        }
        tracing::info!(service_id = %id, "Main service edited");
        self.get_main_service(id)
    }

    pub fn set_main_service_active(&self, id: &str, active: bool) -> AppResult<MainService> {
        self.get_main_service(id)?;
        self.store.update(MAIN_SERVICES, id, json!({ "isActive": active }))?;
        tracing::info!(service_id = %id, active, "Main service visibility changed");
        self.get_main_service(id)
    }

    /// Delete the document, then every image it referenced
    ///
    /// Image deletion is best effort: failures are logged, the document is
    /// already gone.
    pub async fn delete_main_service(&self, id: &str) -> AppResult<()> {
        let _ticket = self.guard.acquire(MAIN_SERVICES, id)?;
        let service = self.get_main_service(id)?;
        self.store.delete(MAIN_SERVICES, id)?;
        tracing::info!(service_id = %id, "Main service deleted");
        self.delete_images(&service).await;
        Ok(())
    }

    async fn delete_images(&self, service: &MainService) -> usize {
        let mut deleted = 0;
        for url in service.image_urls() {
            match self.images.delete_url(url).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(service_id = %service.id, url = %url, error = %e, "Failed to delete service image");
                }
            }
        }
        deleted
    }

    /// Delete every main service and its images; returns the count
    pub async fn delete_all_main_services(&self, _confirmation: Confirmation) -> AppResult<usize> {
        let services = self.list_main_services()?;
        let mut deleted = 0;
        for service in &services {
            match self.store.delete(MAIN_SERVICES, &service.id) {
                Ok(_) => {
                    deleted += 1;
                    self.delete_images(service).await;
                }
                Err(e) => {
                    tracing::error!(
                        service_id = %service.id,
                        deleted,
                        total = services.len(),
                        error = %e,
                        "Bulk service delete stopped part way"
                    );
                    return Err(e.into());
                }
            }
        }
        tracing::warn!(count = deleted, "All main services deleted");
        Ok(deleted)
    }

    // ========== Sub-services ==========

    /// Append a sub-service with id `{parent}-{len}-{millis}`
    pub async fn add_sub_service(
        &self,
        parent_id: &str,
        data: SubServiceCreate,
        image: Option<ImageUpload>,
    ) -> AppResult<SubService> {
        validate_name(&data.name)?;
        validate_price(data.price)?;
        let _ticket = self.guard.acquire(MAIN_SERVICES, parent_id)?;
        // Repairs legacy ids before the new id is derived from the length
        self.get_main_service(parent_id)?;

        let image_url = match &image {
            Some(image) => Some(
                self.upload_image(&format!("services/{}/subs", parent_id), "sub", image)
                    .await?,
            ),
            None => data.image_url,
        };

        self.store.transaction(|txn| -> AppResult<SubService> {
            let mut service = load(txn, parent_id)?;
            let mut id = sub_service_id(parent_id, service.sub_services.len(), now_millis());
            while service.find_sub_service(&id).is_some() {
                id.push('x');
            }
            let sub = SubService {
                id,
                name: data.name.trim().to_string(),
                price: data.price,
                description: data.description,
                image_url,
                parent_service_id: Some(parent_id.to_string()),
            };
            service.sub_services.push(sub.clone());
            write_sub_services(txn, &service)?;
            tracing::info!(service_id = %parent_id, sub_id = %sub.id, "Sub-service added");
            Ok(sub)
        })
    }

    pub async fn edit_sub_service(
        &self,
        parent_id: &str,
        sub_id: &str,
        data: SubServiceUpdate,
        image: Option<ImageUpload>,
    ) -> AppResult<SubService> {
        if let Some(price) = data.price {
            validate_price(price)?;
        }
        if let Some(name) = &data.name {
            validate_name(name)?;
        }
        let _ticket = self.guard.acquire(MAIN_SERVICES, parent_id)?;
        let current = self.get_main_service(parent_id)?;
        let old_image = current
            .find_sub_service(sub_id)
            .ok_or_else(|| sub_not_found(sub_id))?
            .image_url
            .clone();

        let uploaded = match &image {
            Some(image) => Some(
                self.upload_image(&format!("services/{}/subs", parent_id), sub_id, image)
                    .await?,
            ),
            None => None,
        };

        let updated = self.store.transaction(|txn| -> AppResult<SubService> {
            let mut service = load(txn, parent_id)?;
            let sub = service
                .sub_services
                .iter_mut()
                .find(|s| s.id == sub_id)
                .ok_or_else(|| sub_not_found(sub_id))?;
            if let Some(name) = data.name {
                sub.name = name.trim().to_string();
            }
            if let Some(price) = data.price {
                sub.price = price;
            }
            if let Some(description) = data.description {
                sub.description = Some(description);
            }
            if let Some(url) = uploaded.clone().or(data.image_url) {
                sub.image_url = Some(url);
            }
            let sub = sub.clone();
            write_sub_services(txn, &service)?;
            Ok(sub)
        })?;

        if let Some(old) = old_image
            && updated.image_url.as_deref() != Some(old.as_str())
            && let Err(e) = self.images.delete_url(&old).await
        {
            tracing::warn!(sub_id = %sub_id, error = %e, "Failed to delete replaced sub-service image");
        }
        tracing::info!(service_id = %parent_id, sub_id = %sub_id, "Sub-service edited");
        Ok(updated)
    }

    pub async fn delete_sub_service(&self, parent_id: &str, sub_id: &str) -> AppResult<()> {
        let _ticket = self.guard.acquire(MAIN_SERVICES, parent_id)?;
        self.get_main_service(parent_id)?;

        let removed = self.store.transaction(|txn| -> AppResult<SubService> {
            let mut service = load(txn, parent_id)?;
            let index = service
                .sub_services
                .iter()
                .position(|s| s.id == sub_id)
                .ok_or_else(|| sub_not_found(sub_id))?;
            let removed = service.sub_services.remove(index);
            write_sub_services(txn, &service)?;
            Ok(removed)
        })?;

        if let Some(url) = removed.image_url.as_deref()
            && let Err(e) = self.images.delete_url(url).await
        {
            tracing::warn!(sub_id = %sub_id, error = %e, "Failed to delete sub-service image");
        }
        tracing::info!(service_id = %parent_id, sub_id = %sub_id, "Sub-service deleted");
        Ok(())
    }
}
