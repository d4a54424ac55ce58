use std::collections::HashMap;

use indexmap::IndexMap;

use crate::models::{Doctor, Prescription, PrescriptionItem};

use crate::analytics::error::AnalyticsError;
use crate::analytics::fetch::RowFetcher;
use crate::analytics::format::{apply_limit, mean, non_blank, round_to, sort_desc_by, text_or};
use crate::analytics::join::{
    build_index, distinct_keys, lookup, resolve, DoctorDirectory, Enrichment,
};
use crate::analytics::types::{DateRange, MedicationBySpecialty, UNSPECIFIED_SPECIALTY};

/// Prescribed medications per prescriber specialty.
///
/// Round trips: prescriptions in range, then items and doctors together,
/// then medic profiles for the doctors found.
pub async fn pharmacy_medications(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    limit: Option<usize>,
) -> Result<Vec<MedicationBySpecialty>, AnalyticsError> {
    let prescriptions: Vec<Prescription> = fetcher.in_range(range).await?;

    let prescription_ids: Vec<String> = prescriptions.iter().map(|p| p.id.clone()).collect();
    let doctor_ids = distinct_keys(prescriptions.iter().map(|p| p.doctor_id.as_deref()));

    let (items, doctors) = tokio::try_join!(
        resolve::<PrescriptionItem>(
            fetcher,
            "prescription_id",
            &prescription_ids,
            Enrichment::Required
        ),
        lookup::<Doctor>(fetcher, &doctor_ids, Enrichment::Required),
    )?;
    let directory = DoctorDirectory::load(fetcher, doctors).await?;

    let rows = aggregate_pharmacy_medications(&items, &build_index(prescriptions), &directory);
    Ok(apply_limit(rows, limit))
}

#[derive(Default)]
struct MedicationAcc {
    items: u64,
    quantities: Vec<f64>,
    dosages: Vec<String>,
}

/// Groups prescription items by (specialty, medication), most prescribed first.
pub fn aggregate_pharmacy_medications(
    items: &[PrescriptionItem],
    prescriptions: &HashMap<String, Prescription>,
    directory: &DoctorDirectory,
) -> Vec<MedicationBySpecialty> {
    let mut groups: IndexMap<(String, String), MedicationAcc> = IndexMap::new();

    for item in items {
        let Some(medication) = non_blank(item.name.as_deref()) else {
            continue;
        };
        let doctor_id = prescriptions
            .get(&item.prescription_id)
            .and_then(|p| p.doctor_id.as_deref());
        let specialty = text_or(directory.specialty(doctor_id), UNSPECIFIED_SPECIALTY);

        let acc = groups
            .entry((specialty, medication.to_string()))
            .or_insert_with(MedicationAcc::default);
        acc.items += 1;
        if let Some(quantity) = item.quantity {
            acc.quantities.push(quantity);
        }
        if let Some(dosage) = non_blank(item.dosage.as_deref()) {
            if !acc.dosages.iter().any(|d| d == dosage) {
                acc.dosages.push(dosage.to_string());
            }
        }
    }

    let mut rows: Vec<MedicationBySpecialty> = groups
        .into_iter()
        .map(|((specialty, medication), acc)| MedicationBySpecialty {
            specialty,
            medication,
            total_prescriptions: acc.items,
            avg_quantity: round_to(mean(&acc.quantities), 1),
            common_dosages: acc.dosages,
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.total_prescriptions);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::reports::test_window;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_rows(
                "prescriptions",
                vec![
                    json!({"id": "rx1", "issued_at": "2024-03-01T09:00:00Z", "doctor_id": "d1"}),
                    json!({"id": "rx2", "issued_at": "2024-03-02T09:00:00Z", "doctor_id": "d2"}),
                    json!({"id": "rx3", "issued_at": "2024-03-03T09:00:00Z", "doctor_id": "d1"}),
                    json!({"id": "rx4", "issued_at": "2024-05-01T09:00:00Z", "doctor_id": "d1"}),
                ],
            )
            .with_rows(
                "prescription_items",
                vec![
                    json!({"id": 1, "prescription_id": "rx1", "name": "Paracetamol",
                           "dosage": "500mg", "quantity": 10}),
                    json!({"id": 2, "prescription_id": "rx3", "name": "Paracetamol",
                           "dosage": "1g", "quantity": 5}),
                    json!({"id": 3, "prescription_id": "rx3", "name": "Paracetamol",
                           "dosage": "500mg", "quantity": null}),
                    json!({"id": 4, "prescription_id": "rx2", "name": "Amoxicilina",
                           "dosage": "875mg", "quantity": 14}),
                    json!({"id": 5, "prescription_id": "rx2", "name": " ",
                           "dosage": "1mg", "quantity": 1}),
                    json!({"id": 6, "prescription_id": "rx4", "name": "Ibuprofeno",
                           "dosage": "400mg", "quantity": 20}),
                ],
            )
            .with_rows(
                "users",
                vec![
                    json!({"id": "d1", "full_name": "Ana"}),
                    json!({"id": "d2", "full_name": "Luis"}),
                ],
            )
            .with_rows(
                "medic_profiles",
                vec![json!({"id": "m1", "user_id": "d1", "specialty": "Medicina General"})],
            )
    }

    #[tokio::test]
    async fn groups_by_specialty_and_medication() {
        let store = store();
        let fetcher = RowFetcher::new(&store);
        let rows = pharmacy_medications(&fetcher, &test_window("2024-03-01", "2024-03-31"), None)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            MedicationBySpecialty {
                specialty: "Medicina General".into(),
                medication: "Paracetamol".into(),
                total_prescriptions: 3,
                avg_quantity: 7.5,
                common_dosages: vec!["500mg".into(), "1g".into()],
            }
        );
        assert_eq!(rows[1].specialty, UNSPECIFIED_SPECIALTY);
        assert_eq!(rows[1].medication, "Amoxicilina");

        // Every named item in range lands in exactly one group.
        let total: u64 = rows.iter().map(|r| r.total_prescriptions).sum();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn profile_outage_degrades_to_sentinel() {
        let store = store().with_failure("medic_profiles", "down");
        let fetcher = RowFetcher::new(&store);
        let rows = pharmacy_medications(&fetcher, &test_window("2024-03-01", "2024-03-31"), None)
            .await
            .unwrap();
        assert!(rows.iter().all(|r| r.specialty == UNSPECIFIED_SPECIALTY));
    }

    #[tokio::test]
    async fn four_round_trips_regardless_of_row_count() {
        let store = store();
        let fetcher = RowFetcher::new(&store);
        pharmacy_medications(&fetcher, &test_window("2024-03-01", "2024-05-31"), None)
            .await
            .unwrap();

        let mut tables = store.selected_tables();
        assert_eq!(tables.len(), 4);
        assert_eq!(tables[0], "prescriptions");
        assert_eq!(tables[3], "medic_profiles");
        tables.sort();
        assert_eq!(
            tables,
            vec!["medic_profiles", "prescription_items", "prescriptions", "users"]
        );
    }

    #[tokio::test]
    async fn item_outage_fails_the_report() {
        let store = store().with_failure("prescription_items", "down");
        let fetcher = RowFetcher::new(&store);
        let err = pharmacy_medications(&fetcher, &test_window("2024-03-01", "2024-03-31"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Upstream(_)));
    }

    #[tokio::test]
    async fn limit_truncates_after_ranking() {
        let store = store();
        let fetcher = RowFetcher::new(&store);
        let rows =
            pharmacy_medications(&fetcher, &test_window("2024-03-01", "2024-03-31"), Some(1))
                .await
                .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].medication, "Paracetamol");
    }
}
