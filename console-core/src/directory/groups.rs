//! Provider groups
//!
//! Group membership is recorded on both sides: the group's `memberIds`
//! and each provider's `groupId`. Members of a group are `vip`.

use serde_json::{Value, json};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{GroupCreate, GroupUpdate, Provider, ProviderGroup, ProviderType};
use shared::timestamp::Timestamp;

use super::providers::{PROVIDERS, provider_not_found};
use crate::store::{Collection, DocumentStore, Query, StoreTxn};
use crate::utils::InFlightGuard;

pub const GROUPS: &str = "providerGroups";

fn group_not_found(id: &str) -> AppError {
    AppError::not_found_with(ErrorCode::GroupNotFound, id)
}

fn load_group(txn: &mut StoreTxn, groups: &Collection<ProviderGroup>, id: &str) -> AppResult<ProviderGroup> {
    groups.get_in(txn, id)?.ok_or_else(|| group_not_found(id))
}

fn load_provider(txn: &mut StoreTxn, providers: &Collection<Provider>, id: &str) -> AppResult<Provider> {
    providers.get_in(txn, id)?.ok_or_else(|| provider_not_found(id))
}

#[derive(Clone)]
pub struct GroupDirectory {
    store: DocumentStore,
    groups: Collection<ProviderGroup>,
    providers: Collection<Provider>,
    guard: InFlightGuard,
}

impl GroupDirectory {
    pub fn new(store: DocumentStore, guard: InFlightGuard) -> Self {
        Self {
            groups: store.collection(GROUPS),
            providers: store.collection(PROVIDERS),
            store,
            guard,
        }
    }

    pub fn get_group(&self, id: &str) -> AppResult<ProviderGroup> {
        self.groups.get(id)?.ok_or_else(|| group_not_found(id))
    }

    pub fn list_groups(&self) -> AppResult<Vec<ProviderGroup>> {
        let mut groups = self.groups.all()?;
        groups.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(groups)
    }

    pub fn create_group(&self, data: GroupCreate) -> AppResult<ProviderGroup> {
        if data.name.trim().is_empty() {
            return Err(AppError::validation("name is required"));
        }
        let id = self.groups.insert(&ProviderGroup {
            id: String::new(),
            name: data.name.trim().to_string(),
            description: data.description,
            color: data.color,
            icon: data.icon,
            is_vip: data.is_vip.unwrap_or(true),
            priority: data.priority.unwrap_or(0),
            member_ids: Vec::new(),
            created_at: Some(Timestamp::now()),
        })?;
        tracing::info!(group_id = %id, "Group created");
        self.get_group(&id)
    }

    pub fn update_group(&self, id: &str, data: GroupUpdate) -> AppResult<ProviderGroup> {
        self.get_group(id)?;
        let mut patch = serde_json::Map::new();
        if let Some(name) = data.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name is required"));
            }
            patch.insert("name".into(), json!(name.trim()));
        }
        let optional = [
            ("description", data.description.map(Value::String)),
            ("color", data.color.map(Value::String)),
            ("icon", data.icon.map(Value::String)),
            ("isVip", data.is_vip.map(Value::Bool)),
            ("priority", data.priority.map(|p| json!(p))),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                patch.insert(key.into(), value);
            }
        }
        self.groups.update(id, Value::Object(patch))?;
        self.get_group(id)
    }

    /// Detach every member, then delete the group
    ///
    /// Not atomic: members are released one by one. If a release fails the
    /// group still exists and the failure is logged with the progress made.
    pub fn delete_group(&self, id: &str) -> AppResult<usize> {
        let _ticket = self.guard.acquire(GROUPS, id)?;
        let group = self.get_group(id)?;

        let mut member_ids: Vec<String> = self
            .providers
            .query(&Query::new().eq("groupId", id))?
            .into_iter()
            .map(|p| p.id)
            .collect();
        for member in &group.member_ids {
            if !member_ids.contains(member) {
                member_ids.push(member.clone());
            }
        }

        let mut released = 0;
        for provider_id in &member_ids {
            let result = self.providers.update(
                provider_id,
                json!({ "groupId": null, "type": ProviderType::General }),
            );
            match result {
                Ok(()) => released += 1,
                Err(crate::store::StoreError::NotFound { .. }) => {
                    tracing::warn!(group_id = %id, provider_id = %provider_id, "Stale group member skipped");
                }
                Err(e) => {
                    tracing::error!(
                        group_id = %id,
                        provider_id = %provider_id,
                        released,
                        total = member_ids.len(),
                        error = %e,
                        "Group delete stopped while releasing members"
                    );
                    return Err(e.into());
                }
            }
        }

        self.groups.delete(id)?;
        tracing::info!(group_id = %id, released, "Group deleted");
        Ok(released)
    }

    /// Move providers into `group_id`, out of any previous group
    pub fn assign_providers(&self, group_id: &str, provider_ids: &[String]) -> AppResult<ProviderGroup> {
        let _ticket = self.guard.acquire(GROUPS, group_id)?;
        self.store.transaction(|txn| -> AppResult<()> {
            let mut members = load_group(txn, &self.groups, group_id)?.member_ids;
            for provider_id in provider_ids {
                let provider = load_provider(txn, &self.providers, provider_id)?;
                if let Some(previous) = provider.group_id.as_deref().filter(|g| *g != group_id)
                    && let Some(old) = self.groups.get_in(txn, previous)?
                {
                    let remaining: Vec<_> = old.member_ids.into_iter().filter(|m| m != provider_id).collect();
                    self.groups.update_in(txn, previous, json!({ "memberIds": remaining }))?;
                }
                self.providers.update_in(
                    txn,
                    provider_id,
                    json!({ "groupId": group_id, "type": ProviderType::Vip }),
                )?;
                if !members.contains(provider_id) {
                    members.push(provider_id.clone());
                }
            }
            self.groups.update_in(txn, group_id, json!({ "memberIds": members }))?;
            Ok(())
        })?;
        tracing::info!(group_id = %group_id, count = provider_ids.len(), "Providers assigned to group");
        self.get_group(group_id)
    }

    /// Take providers out of `group_id`; they become `general`
    pub fn remove_providers(&self, group_id: &str, provider_ids: &[String]) -> AppResult<ProviderGroup> {
        let _ticket = self.guard.acquire(GROUPS, group_id)?;
        self.store.transaction(|txn| -> AppResult<()> {
            let mut members = load_group(txn, &self.groups, group_id)?.member_ids;
            for provider_id in provider_ids {
                members.retain(|m| m != provider_id);
                let Some(provider) = self.providers.get_in(txn, provider_id)? else {
                    continue;
                };
                if provider.group_id.as_deref() == Some(group_id) {
                    self.providers.update_in(
                        txn,
                        provider_id,
                        json!({ "groupId": null, "type": ProviderType::General }),
                    )?;
                }
            }
            self.groups.update_in(txn, group_id, json!({ "memberIds": members }))?;
            Ok(())
        })?;
        tracing::info!(group_id = %group_id, count = provider_ids.len(), "Providers removed from group");
        self.get_group(group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (DocumentStore, GroupDirectory) {
        let store = DocumentStore::open_in_memory().unwrap();
        for id in ["p1", "p2", "p3"] {
            store.set(PROVIDERS, id, json!({"name": id})).unwrap();
        }
        let groups = GroupDirectory::new(store.clone(), InFlightGuard::new());
        (store, groups)
    }

    fn group(dir: &GroupDirectory, name: &str) -> ProviderGroup {
        dir.create_group(GroupCreate {
            name: name.into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn provider(store: &DocumentStore, id: &str) -> Provider {
        store.collection::<Provider>(PROVIDERS).get(id).unwrap().unwrap()
    }

    #[test]
    fn test_assign_moves_between_groups() {
        let (store, dir) = setup();
        let gold = dir
            .create_group(GroupCreate {
                name: "Gold".into(),
                priority: Some(1),
                ..Default::default()
            })
            .unwrap();
        let silver = dir
            .create_group(GroupCreate {
                name: "Silver".into(),
                ..Default::default()
            })
            .unwrap();

        dir.assign_providers(&gold.id, &ids(&["p1", "p2"])).unwrap();
        assert_eq!(provider(&store, "p1").provider_type, ProviderType::Vip);

        let order: Vec<_> = dir.list_groups().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(order, vec!["Silver", "Gold"]);

        let silver = dir.assign_providers(&silver.id, &ids(&["p1"])).unwrap();
        assert_eq!(silver.member_ids, vec!["p1"]);
        assert_eq!(dir.get_group(&gold.id).unwrap().member_ids, vec!["p2"]);
        assert_eq!(provider(&store, "p1").group_id.as_deref(), Some(silver.id.as_str()));
    }

    #[test]
    fn test_assign_unknown_provider_changes_nothing() {
        let (store, dir) = setup();
        let g = group(&dir, "G");
        let err = dir.assign_providers(&g.id, &ids(&["p1", "ghost"])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProviderNotFound);
        assert!(provider(&store, "p1").group_id.is_none());
        assert!(dir.get_group(&g.id).unwrap().member_ids.is_empty());
    }

    #[test]
    fn test_remove_providers() {
        let (store, dir) = setup();
        let g = group(&dir, "G");
        dir.assign_providers(&g.id, &ids(&["p1", "p2"])).unwrap();
        let g = dir.remove_providers(&g.id, &ids(&["p1"])).unwrap();
        assert_eq!(g.member_ids, vec!["p2"]);
        let p1 = provider(&store, "p1");
        assert!(p1.group_id.is_none());
        assert_eq!(p1.provider_type, ProviderType::General);
    }

    #[test]
    fn test_membership_changes_keep_unmodelled_fields() {
        let (store, dir) = setup();
        store
            .set(PROVIDERS, "p4", json!({"name": "p4", "vehiclePhotoUrl": "v.jpg", "fcmToken": "tok"}))
            .unwrap();
        let g = group(&dir, "G");
        store.update(GROUPS, &g.id, json!({"bannerUrl": "b.png"})).unwrap();

        dir.assign_providers(&g.id, &ids(&["p4"])).unwrap();
        let doc = store.get_by_id(PROVIDERS, "p4").unwrap().unwrap();
        assert_eq!(doc.field("vehiclePhotoUrl"), Some(&json!("v.jpg")));
        assert_eq!(doc.field("type"), Some(&json!("vip")));
        assert!(doc.field("balance").is_none());

        dir.remove_providers(&g.id, &ids(&["p4"])).unwrap();
        let doc = store.get_by_id(PROVIDERS, "p4").unwrap().unwrap();
        assert_eq!(doc.field("fcmToken"), Some(&json!("tok")));
        assert!(doc.field("groupId").is_none());
        let group_doc = store.get_by_id(GROUPS, &g.id).unwrap().unwrap();
        assert_eq!(group_doc.field("bannerUrl"), Some(&json!("b.png")));
    }

    #[test]
    fn test_delete_group_releases_members_first() {
        let (store, dir) = setup();
        let g = group(&dir, "G");
        dir.assign_providers(&g.id, &ids(&["p1", "p3"])).unwrap();

        assert_eq!(dir.delete_group(&g.id).unwrap(), 2);
        assert_eq!(dir.get_group(&g.id).unwrap_err().code, ErrorCode::GroupNotFound);
        for id in ["p1", "p3"] {
            let p = provider(&store, id);
            assert!(p.group_id.is_none());
            assert_eq!(p.provider_type, ProviderType::General);
        }
    }
}
