//! Cities and their managers
//!
//! A city's `managerId` and the manager's `cityId` are kept in step; both
//! sides change in the same store transaction.

use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Admin, City, CityCreate, CityUpdate};

use crate::directory::ADMINS;
use crate::store::{Collection, DocumentStore, StoreTxn};

pub const CITIES: &str = "cities";

fn city_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::CityNotFound, id)
}

#[derive(Clone)]
pub struct CityService {
    store: DocumentStore,
    cities: Collection<City>,
    admins: Collection<Admin>,
}

impl CityService {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            cities: store.collection(CITIES),
            admins: store.collection(ADMINS),
            store,
        }
    }

    pub fn get_city(&self, id: &str) -> AppResult<City> {
        self.cities.get(id)?.ok_or_else(|| city_not_found(id))
    }

    pub fn list_cities(&self) -> AppResult<Vec<City>> {
        let mut cities = self.cities.all()?;
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cities)
    }

    pub fn create_city(&self, data: CityCreate) -> AppResult<City> {
        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        let id = self.cities.insert(&City {
            id: String::new(),
            name: name.to_string(),
            is_active: data.is_active.unwrap_or(true),
            manager_id: None,
        })?;
        tracing::info!(city_id = %id, name = %name, "City created");
        self.get_city(&id)
    }

    pub fn update_city(&self, id: &str, data: CityUpdate) -> AppResult<City> {
        self.get_city(id)?;
        let mut patch = serde_json::Map::new();
        if let Some(name) = data.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name is required"));
            }
            patch.insert("name".into(), json!(name.trim()));
        }
        if let Some(active) = data.is_active {
            patch.insert("isActive".into(), json!(active));
        }
        self.cities.update(id, Value::Object(patch))?;
        self.get_city(id)
    }

    /// Delete a city, releasing its manager
    pub fn delete_city(&self, id: &str) -> AppResult<()> {
        self.store.transaction(|txn| -> AppResult<()> {
            let city = self.load(txn, id)?;
            if let Some(manager_id) = city.manager_id.as_deref() {
                self.release_manager(txn, manager_id, id)?;
            }
            txn.delete(CITIES, id)?;
            Ok(())
        })?;
        tracing::info!(city_id = %id, "City deleted");
        Ok(())
    }

    /// Make `admin_id` the manager of `city_id`
    ///
    /// The city's previous manager and the admin's previous city are
    /// released.
    pub fn assign_city_manager(&self, city_id: &str, admin_id: &str) -> AppResult<City> {
        self.store.transaction(|txn| -> AppResult<()> {
            let city = self.load(txn, city_id)?;
            let admin = self
                .admins
                .get_in(txn, admin_id)?
                .ok_or_else(|| AppError::not_found_with(ErrorCode::AdminNotFound, admin_id))?;

            if let Some(previous) = city.manager_id.as_deref().filter(|m| *m != admin_id) {
                self.release_manager(txn, previous, city_id)?;
            }
            if let Some(old_city) = admin.city_id.as_deref().filter(|c| *c != city_id)
                && let Some(old) = self.cities.get_in(txn, old_city)?
                && old.manager_id.as_deref() == Some(admin_id)
            {
                self.cities.update_in(txn, old_city, json!({ "managerId": null }))?;
            }

            self.cities.update_in(txn, city_id, json!({ "managerId": admin_id }))?;
            self.admins.update_in(txn, admin_id, json!({ "cityId": city_id }))?;
            Ok(())
        })?;
        tracing::info!(city_id = %city_id, admin_id = %admin_id, "City manager assigned");
        self.get_city(city_id)
    }

    fn load(&self, txn: &mut StoreTxn, id: &str) -> AppResult<City> {
        self.cities.get_in(txn, id)?.ok_or_else(|| city_not_found(id))
    }

    fn release_manager(&self, txn: &mut StoreTxn, admin_id: &str, city_id: &str) -> AppResult<()> {
        if let Some(admin) = self.admins.get_in(txn, admin_id)?
            && admin.city_id.as_deref() == Some(city_id)
        {
            self.admins.update_in(txn, admin_id, json!({ "cityId": null }))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DocumentStore, CityService) {
        let store = DocumentStore::open_in_memory().unwrap();
        for (id, email) in [("a1", "a1@x.io"), ("a2", "a2@x.io")] {
            store.set(ADMINS, id, json!({"name": id, "email": email})).unwrap();
        }
        (store.clone(), CityService::new(store))
    }

    fn city(svc: &CityService, name: &str) -> City {
        svc.create_city(CityCreate {
            name: name.into(),
            is_active: None,
        })
        .unwrap()
    }

    fn admin_city(store: &DocumentStore, id: &str) -> Option<String> {
        store.collection::<Admin>(ADMINS).get(id).unwrap().unwrap().city_id
    }

    #[test]
    fn test_crud() {
        let (_store, svc) = setup();
        let riyadh = city(&svc, " Riyadh ");
        assert_eq!(riyadh.name, "Riyadh");
        assert!(riyadh.is_active);

        let updated = svc
            .update_city(&riyadh.id, CityUpdate { name: None, is_active: Some(false) })
            .unwrap();
        assert!(!updated.is_active);

        svc.delete_city(&riyadh.id).unwrap();
        assert_eq!(svc.get_city(&riyadh.id).unwrap_err().code, ErrorCode::CityNotFound);
        assert!(svc.create_city(CityCreate::default()).is_err());
    }

    #[test]
    fn test_manager_reassignment_keeps_both_sides_in_step() {
        let (store, svc) = setup();
        let jeddah = city(&svc, "Jeddah");
        let dammam = city(&svc, "Dammam");

        svc.assign_city_manager(&jeddah.id, "a1").unwrap();
        assert_eq!(admin_city(&store, "a1").as_deref(), Some(jeddah.id.as_str()));

        // a2 takes over Jeddah, a1 is released
        svc.assign_city_manager(&jeddah.id, "a2").unwrap();
        assert!(admin_city(&store, "a1").is_none());

        // a2 moves to Dammam, Jeddah loses its manager
        svc.assign_city_manager(&dammam.id, "a2").unwrap();
        assert!(svc.get_city(&jeddah.id).unwrap().manager_id.is_none());
        assert_eq!(svc.get_city(&dammam.id).unwrap().manager_id.as_deref(), Some("a2"));

        svc.delete_city(&dammam.id).unwrap();
        assert!(admin_city(&store, "a2").is_none());
    }

    #[test]
    fn test_manager_assignment_keeps_unmodelled_fields() {
        let (store, svc) = setup();
        store.update(ADMINS, "a1", json!({"phone": "+966500000000"})).unwrap();
        let c = city(&svc, "Taif");
        store.update(CITIES, &c.id, json!({"region": "Makkah"})).unwrap();

        svc.assign_city_manager(&c.id, "a1").unwrap();
        let admin = store.get_by_id(ADMINS, "a1").unwrap().unwrap();
        assert_eq!(admin.field("phone"), Some(&json!("+966500000000")));
        assert!(admin.field("role").is_none());
        let doc = store.get_by_id(CITIES, &c.id).unwrap().unwrap();
        assert_eq!(doc.field("region"), Some(&json!("Makkah")));
        assert_eq!(doc.field("managerId"), Some(&json!("a1")));
    }

    #[test]
    fn test_assign_unknown_admin() {
        let (_store, svc) = setup();
        let c = city(&svc, "Abha");
        let err = svc.assign_city_manager(&c.id, "ghost").unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminNotFound);
        assert!(svc.get_city(&c.id).unwrap().manager_id.is_none());
    }
}
