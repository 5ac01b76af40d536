//! Bank settings singleton

use shared::error::AppResult;
use shared::models::BankSettings;
use shared::timestamp::Timestamp;

use crate::store::{Collection, DocumentStore};

pub const SETTINGS: &str = "settings";
pub const BANK_SETTINGS_ID: &str = "bank";

#[derive(Clone)]
pub struct BankSettingsService {
    settings: Collection<BankSettings>,
}

impl BankSettingsService {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            settings: store.collection(SETTINGS),
        }
    }

    /// Current settings; empty until first saved
    pub fn get_bank_settings(&self) -> AppResult<BankSettings> {
        Ok(self.settings.get(BANK_SETTINGS_ID)?.unwrap_or_default())
    }

    pub fn update_bank_settings(&self, mut settings: BankSettings) -> AppResult<BankSettings> {
        settings.updated_at = Some(Timestamp::now());
        self.settings.set(BANK_SETTINGS_ID, &settings)?;
        tracing::info!(bank_name = ?settings.bank_name, "Bank settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_then_update() {
        let svc = BankSettingsService::new(DocumentStore::open_in_memory().unwrap());
        assert_eq!(svc.get_bank_settings().unwrap(), BankSettings::default());

        svc.update_bank_settings(BankSettings {
            bank_name: Some("Al Rajhi".into()),
            iban: Some("SA0380000000608010167519".into()),
            ..Default::default()
        })
        .unwrap();
        let saved = svc.get_bank_settings().unwrap();
        assert_eq!(saved.bank_name.as_deref(), Some("Al Rajhi"));
        assert!(saved.updated_at.is_some());
    }
}
