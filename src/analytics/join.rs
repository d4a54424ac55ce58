//! In-memory joins.
//!
//! The store cannot join, so every report that needs a parent row does the
//! same three steps: collect the distinct foreign keys of the child rows,
//! fetch the parents in one `IN` query, and index them by key. Lookups that
//! miss resolve to a sentinel in the caller; the child row is never dropped.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Doctor, Entity, MedicProfile};

use super::error::AnalyticsError;
use super::fetch::RowFetcher;
use super::format::non_blank;

/// How a failed parent fetch affects the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrichment {
    /// The report fails with the fetch error.
    Required,
    /// The failure is logged and every lookup misses.
    Optional,
}

/// Distinct non-blank keys, sorted so the secondary query is reproducible.
pub fn distinct_keys<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    keys.into_iter()
        .filter_map(non_blank)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Indexes rows by primary key.
pub fn build_index<T: Entity>(rows: Vec<T>) -> HashMap<String, T> {
    rows.into_iter()
        .map(|row| (row.id().to_string(), row))
        .collect()
}

/// Indexes rows by an arbitrary column. The first row for a key wins.
pub fn build_index_by<T, F>(rows: Vec<T>, key: F) -> HashMap<String, T>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        if let Some(k) = key(&row).map(str::to_string) {
            index.entry(k).or_insert(row);
        }
    }
    index
}

/// A child row with its parent, if the parent was found.
#[derive(Debug)]
pub struct Enriched<'a, C, P> {
    pub row: &'a C,
    pub parent: Option<&'a P>,
}

/// Pairs each child with its parent through `foreign_key`.
pub fn attach<'a, C, P, F>(
    children: &'a [C],
    index: &'a HashMap<String, P>,
    foreign_key: F,
) -> impl Iterator<Item = Enriched<'a, C, P>> + 'a
where
    C: 'a,
    P: 'a,
    F: Fn(&'a C) -> Option<&'a str> + 'a,
{
    children.iter().map(move |row| Enriched {
        row,
        parent: foreign_key(row).and_then(|key| index.get(key)),
    })
}

/// Fetches `T` rows whose `column` is in `keys`, applying `policy` on failure.
pub async fn resolve<T: Entity>(
    fetcher: &RowFetcher<'_>,
    column: &str,
    keys: &[String],
    policy: Enrichment,
) -> Result<Vec<T>, AnalyticsError> {
    match fetcher.by_keys::<T>(column, keys).await {
        Ok(rows) => Ok(rows),
        Err(err) if policy == Enrichment::Optional => {
            tracing::warn!(
                table = T::TABLE,
                keys = keys.len(),
                error = %err,
                "Optional enrichment failed, falling back to sentinel"
            );
            Ok(Vec::new())
        }
        Err(err) => Err(err),
    }
}

/// Fetches parents by primary key and indexes them.
pub async fn lookup<T: Entity>(
    fetcher: &RowFetcher<'_>,
    keys: &[String],
    policy: Enrichment,
) -> Result<HashMap<String, T>, AnalyticsError> {
    Ok(build_index(resolve::<T>(fetcher, "id", keys, policy).await?))
}

/// Doctors plus their specialties: users → medic_profiles by `user_id`.
#[derive(Debug, Default)]
pub struct DoctorDirectory {
    doctors: HashMap<String, Doctor>,
    specialties: HashMap<String, String>,
}

impl DoctorDirectory {
    /// Second hop of the doctor join. Specialty is optional enrichment.
    pub async fn load(
        fetcher: &RowFetcher<'_>,
        doctors: HashMap<String, Doctor>,
    ) -> Result<Self, AnalyticsError> {
        let user_ids = distinct_keys(doctors.keys().map(|id| Some(id.as_str())));
        let profiles =
            resolve::<MedicProfile>(fetcher, "user_id", &user_ids, Enrichment::Optional).await?;
        Ok(Self::from_parts(doctors, profiles))
    }

    pub fn from_parts(doctors: HashMap<String, Doctor>, profiles: Vec<MedicProfile>) -> Self {
        let specialties = build_index_by(
            profiles
                .into_iter()
                .filter(|p| non_blank(p.specialty.as_deref()).is_some())
                .collect(),
            |p: &MedicProfile| p.user_id.as_deref(),
        )
        .into_iter()
        .filter_map(|(user_id, profile)| {
            non_blank(profile.specialty.as_deref()).map(|s| (user_id, s.to_string()))
        })
        .collect();

        Self {
            doctors,
            specialties,
        }
    }

    /// Specialty of a known doctor, `None` when either hop misses.
    pub fn specialty(&self, doctor_id: Option<&str>) -> Option<&str> {
        let doctor = self.doctors.get(doctor_id?)?;
        self.specialties.get(&doctor.id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Consultation;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn doctor(id: &str) -> Doctor {
        Doctor {
            id: id.into(),
            full_name: Some(format!("Dr. {id}")),
        }
    }

    fn profile(id: &str, user_id: &str, specialty: Option<&str>) -> MedicProfile {
        MedicProfile {
            id: id.into(),
            user_id: Some(user_id.into()),
            specialty: specialty.map(str::to_string),
        }
    }

    #[test]
    fn distinct_keys_are_sorted_and_skip_blanks() {
        let keys = distinct_keys(vec![Some("b"), None, Some("a"), Some(" "), Some("b")]);
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn attach_keeps_children_without_parent() {
        let consultations: Vec<Consultation> = serde_json::from_value(json!([
            {"id": "c1", "doctor_id": "d1"},
            {"id": "c2", "doctor_id": "d9"},
            {"id": "c3"},
        ]))
        .unwrap();
        let index = build_index(vec![doctor("d1")]);

        let joined: Vec<_> = attach(&consultations, &index, |c| c.doctor_id.as_deref()).collect();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0].parent.map(|d| d.id.as_str()), Some("d1"));
        assert!(joined[1].parent.is_none());
        assert!(joined[2].parent.is_none());
    }

    #[test]
    fn index_by_column_keeps_first_row() {
        let index = build_index_by(
            vec![profile("p1", "u1", Some("Cardiología")), profile("p2", "u1", Some("Pediatría"))],
            |p: &MedicProfile| p.user_id.as_deref(),
        );
        assert_eq!(index["u1"].id, "p1");
    }

    #[test]
    fn directory_chains_both_hops() {
        let doctors = build_index(vec![doctor("d1"), doctor("d2")]);
        let directory = DoctorDirectory::from_parts(
            doctors,
            vec![profile("p1", "d1", Some("Cardiología")), profile("p2", "d2", Some("  "))],
        );
        assert_eq!(directory.specialty(Some("d1")), Some("Cardiología"));
        assert_eq!(directory.specialty(Some("d2")), None);
        assert_eq!(directory.specialty(Some("d3")), None);
        assert_eq!(directory.specialty(None), None);
    }

    #[tokio::test]
    async fn required_lookup_propagates_failure() {
        let store = MemoryStore::new().with_failure("users", "timeout");
        let fetcher = RowFetcher::new(&store);
        let result = lookup::<Doctor>(&fetcher, &["d1".to_string()], Enrichment::Required).await;
        assert!(matches!(result, Err(AnalyticsError::Upstream(_))));
    }

    #[tokio::test]
    async fn optional_lookup_degrades_to_empty() {
        let store = MemoryStore::new().with_failure("medic_profiles", "timeout");
        let fetcher = RowFetcher::new(&store);
        let profiles = resolve::<MedicProfile>(
            &fetcher,
            "user_id",
            &["d1".to_string()],
            Enrichment::Optional,
        )
        .await
        .unwrap();
        assert!(profiles.is_empty());
    }

    #[tokio::test]
    async fn directory_load_survives_profile_outage() {
        let store = MemoryStore::new().with_failure("medic_profiles", "down");
        let fetcher = RowFetcher::new(&store);
        let directory = DoctorDirectory::load(&fetcher, build_index(vec![doctor("d1")]))
            .await
            .unwrap();
        assert_eq!(directory.specialty(Some("d1")), None);
    }

    #[tokio::test]
    async fn lookup_issues_one_membership_query() {
        let store = MemoryStore::new().with_rows(
            "users",
            vec![
                json!({"id": "d1", "full_name": "Ana"}),
                json!({"id": "d2", "full_name": "Luis"}),
                json!({"id": "d3", "full_name": "Eva"}),
            ],
        );
        let fetcher = RowFetcher::new(&store);
        let index = lookup::<Doctor>(
            &fetcher,
            &["d1".to_string(), "d3".to_string()],
            Enrichment::Required,
        )
        .await
        .unwrap();
        assert_eq!(index.len(), 2);
        assert!(index.contains_key("d3"));
        assert_eq!(store.selected_tables(), vec!["users"]);
    }

    #[tokio::test]
    async fn empty_key_set_skips_the_store() {
        let store = MemoryStore::new().with_failure("users", "down");
        let fetcher = RowFetcher::new(&store);
        let index = lookup::<Doctor>(&fetcher, &[], Enrichment::Required)
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(store.selected_tables().is_empty());
    }
}
