use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use super::repository::{
    BoostMessage, BoostPublisher, BoostRepository, PublishError, RecordLookup, RepositoryError,
    StoredBoostFactors,
};
use crate::boost::{BoostFactors, RecordId};

/// Process-local store with the same merge rules as the production table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBoostRepository {
    rows: Arc<Mutex<Vec<StoredBoostFactors>>>,
}

impl InMemoryBoostRepository {
    fn rows(&self) -> Result<MutexGuard<'_, Vec<StoredBoostFactors>>, RepositoryError> {
        self.rows
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))
    }
}

impl BoostRepository for InMemoryBoostRepository {
    fn upsert(
        &self,
        id: &RecordId,
        factors: BoostFactors,
        at: DateTime<Utc>,
    ) -> Result<StoredBoostFactors, RepositoryError> {
        let mut rows = self.rows()?;
        let existing = rows.iter_mut().find(|row| shares_identifier(&row.id, id));

        match existing {
            Some(row) => {
                if row.id.bibcode.is_none() {
                    row.id.bibcode = id.bibcode.clone();
                }
                if row.id.scix_id.is_none() {
                    row.id.scix_id = id.scix_id.clone();
                }
                row.factors = factors;
                row.modified = at;
                Ok(row.clone())
            }
            None => {
                let row = StoredBoostFactors {
                    id: id.clone(),
                    created: at,
                    modified: at,
                    factors,
                };
                rows.push(row.clone());
                Ok(row)
            }
        }
    }

    fn find(&self, lookup: &RecordLookup) -> Result<Vec<StoredBoostFactors>, RepositoryError> {
        let rows = self.rows()?;
        Ok(rows
            .iter()
            .filter(|row| lookup.matches(&row.id))
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<StoredBoostFactors>, RepositoryError> {
        Ok(self.rows()?.clone())
    }
}

fn shares_identifier(stored: &RecordId, incoming: &RecordId) -> bool {
    let same_bibcode = incoming.bibcode.is_some() && stored.bibcode == incoming.bibcode;
    let same_scix_id = incoming.scix_id.is_some() && stored.scix_id == incoming.scix_id;
    same_bibcode || same_scix_id
}

/// Publisher that keeps every message, for tests and offline batch runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBoostPublisher {
    messages: Arc<Mutex<Vec<BoostMessage>>>,
}

impl InMemoryBoostPublisher {
    /// Every message published so far. A poisoned lock still yields the
    /// messages recorded before the panic.
    pub fn messages(&self) -> Vec<BoostMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BoostPublisher for InMemoryBoostPublisher {
    fn publish(&self, message: BoostMessage) -> Result<(), PublishError> {
        self.messages
            .lock()
            .map_err(|_| PublishError::Transport("publisher lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn factors(boost_factor: f64) -> BoostFactors {
        BoostFactors {
            refereed_boost: 1.0,
            doctype_boost: 0.5,
            recency_boost: 1.0,
            boost_factor,
            disciplines: Vec::new(),
        }
    }

    fn id(bibcode: Option<&str>, scix_id: Option<&str>) -> RecordId {
        RecordId {
            bibcode: bibcode.map(str::to_string),
            scix_id: scix_id.map(str::to_string),
        }
    }

    #[test]
    fn upsert_updates_row_matched_by_either_identifier() {
        let repository = InMemoryBoostRepository::default();
        let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        repository
            .upsert(&id(Some("2024ApJ...1A"), None), factors(0.2), first)
            .expect("insert");
        let updated = repository
            .upsert(&id(None, Some("scix:1")), factors(0.4), later)
            .expect("insert second");
        assert_eq!(updated.created, later, "no shared identifier, new row");

        let merged = repository
            .upsert(&id(Some("2024ApJ...1A"), Some("scix:9")), factors(0.9), later)
            .expect("update");

        assert_eq!(merged.created, first);
        assert_eq!(merged.modified, later);
        assert_eq!(merged.factors.boost_factor, 0.9);
        assert_eq!(merged.id.scix_id.as_deref(), Some("scix:9"));
        assert_eq!(repository.all().expect("rows").len(), 2);
    }

    #[test]
    fn messages_survive_a_poisoned_lock() {
        let publisher = InMemoryBoostPublisher::default();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        publisher
            .publish(BoostMessage::new(&id(Some("2025A&A...690A..12S"), None), &factors(0.7), at))
            .expect("publish");

        let shared = publisher.clone();
        let crashed = std::thread::spawn(move || {
            let _guard = shared.messages.lock().expect("lock acquired");
            panic!("writer crashed while holding the lock");
        })
        .join();

        assert!(crashed.is_err());
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].bibcode.as_deref(), Some("2025A&A...690A..12S"));
    }

    #[test]
    fn find_filters_by_identifier_kind() {
        let repository = InMemoryBoostRepository::default();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        repository
            .upsert(&id(Some("shared"), Some("scix:2")), factors(0.3), at)
            .expect("insert");

        assert_eq!(
            repository
                .find(&RecordLookup::Bibcode("shared".to_string()))
                .expect("lookup")
                .len(),
            1
        );
        assert!(repository
            .find(&RecordLookup::ScixId("shared".to_string()))
            .expect("lookup")
            .is_empty());
    }
}
