use care_dash::aggregate::{AggregateValue, KeyValue, format_length_of_stay};
use care_dash::dashboard::NO_DATA_MESSAGE;
use care_dash::schema::Dimension;
use care_dash::{DashboardOutcome, FilterSelection};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

use crate::utils::{PatientRow, arb_row, arb_selection, example_rows, pipeline_from_rows};

#[test]
fn three_patient_example() {
    let pipeline = pipeline_from_rows(&example_rows());
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let dashboard = outcome.dashboard().expect("default selection has rows");

    assert_eq!(dashboard.row_count, 3);
    assert_eq!(dashboard.kpis.total_patients, 2);
    assert_eq!(
        format_length_of_stay(dashboard.kpis.average_length_of_stay.unwrap()),
        "2.33 days"
    );
    assert_eq!(dashboard.kpis.most_common_condition.as_deref(), Some("Flu"));

    let genders = dashboard.table("gender_distribution").unwrap();
    assert_eq!(genders.len(), 2);
    assert_eq!(genders.rows[0].key[0], KeyValue::Text("M".into()));
    assert_eq!(genders.rows[0].value, AggregateValue::Count(2));
    assert_eq!(genders.value_for(&["F"]), Some(1.0));
}

#[test]
fn every_catalog_table_is_produced() {
    let pipeline = pipeline_from_rows(&example_rows());
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let dashboard = outcome.dashboard().unwrap();

    assert_eq!(dashboard.aggregates.len(), care_dash::DASHBOARD_AGGREGATES.len());
    assert_eq!(
        dashboard
            .table("average_stay_by_condition")
            .unwrap()
            .value_for(&["Flu"]),
        Some(3.0)
    );
}

#[test]
fn empty_dimension_signals_no_data() {
    let pipeline = pipeline_from_rows(&example_rows());
    let selection = pipeline
        .default_selection()
        .with(Dimension::Hospital, Vec::<String>::new())
        .unwrap();

    let outcome = pipeline.evaluate(&selection).unwrap();
    assert!(outcome.is_empty());
    assert_eq!(
        outcome,
        DashboardOutcome::NoData {
            message: NO_DATA_MESSAGE
        }
    );
}

#[test]
fn unmatched_values_signal_no_data() {
    let pipeline = pipeline_from_rows(&example_rows());
    let selection =
        FilterSelection::from_json(r#"{"Medical Condition": ["Measles"]}"#, pipeline.options()).unwrap();
    assert!(pipeline.evaluate(&selection).unwrap().is_empty());
}

#[test]
fn selection_restricts_every_output() {
    let pipeline = pipeline_from_rows(&example_rows());
    let selection = pipeline
        .default_selection()
        .with(Dimension::Gender, ["F"])
        .unwrap();

    let outcome = pipeline.evaluate(&selection).unwrap();
    let dashboard = outcome.dashboard().unwrap();
    assert_eq!(dashboard.row_count, 1);
    assert_eq!(dashboard.kpis.total_patients, 1);
    assert_eq!(dashboard.kpis.most_common_condition.as_deref(), Some("Cold"));
    assert_eq!(dashboard.table("gender_distribution").unwrap().value_for(&["M"]), None);
}

#[test]
fn repeated_evaluation_is_identical() {
    let pipeline = pipeline_from_rows(&example_rows());
    let selection = pipeline.default_selection();

    let first = pipeline.evaluate(&selection).unwrap();
    let second = pipeline.evaluate(&selection).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn mean_tables_sort_descending() {
    let rows = vec![
        PatientRow::new("A", "Male", "Flu", 2).billing(100.0),
        PatientRow::new("B", "Male", "Cold", 9).billing(900.0),
        PatientRow::new("C", "Female", "Asthma", 5).billing(500.0),
        PatientRow::new("D", "Female", "Cold", 3).billing(300.0),
    ];
    let pipeline = pipeline_from_rows(&rows);
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let dashboard = outcome.dashboard().unwrap();

    let stays = dashboard.table("average_stay_by_condition").unwrap();
    let order: Vec<_> = stays.rows.iter().filter_map(|r| r.key[0].as_str()).collect();
    assert_eq!(order, ["Cold", "Asthma", "Flu"]);
    assert_eq!(stays.value_for(&["Cold"]), Some(6.0));

    let billing = dashboard.table("average_billing_by_condition").unwrap();
    assert_eq!(billing.value_for(&["Cold"]), Some(600.0));
}

#[test]
fn negative_stays_lower_the_averages() {
    let rows = vec![
        PatientRow::new("A", "Male", "Flu", 5),
        PatientRow::new("B", "Male", "Flu", -3),
        PatientRow::new("C", "Female", "Cold", 4),
    ];
    let pipeline = pipeline_from_rows(&rows);
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let dashboard = outcome.dashboard().unwrap();

    assert_eq!(dashboard.kpis.average_length_of_stay, Some(2.0));

    let by_condition = dashboard.table("average_stay_by_condition").unwrap();
    assert_eq!(by_condition.rows[0].key[0].as_str(), Some("Cold"));
    assert_eq!(by_condition.value_for(&["Flu"]), Some(1.0));
    assert_eq!(
        dashboard.table("average_stay_by_admission_type").unwrap().value_for(&["Urgent"]),
        Some(2.0)
    );
    assert_eq!(
        dashboard.table("average_stay_by_location").unwrap().rows[0].value,
        AggregateValue::Mean(2.0)
    );
}

#[test]
fn stacked_tables_are_keyed_by_both_dimensions() {
    let rows = vec![
        PatientRow::new("A", "Male", "Flu", 2).hospital("Mercy").medication("Ibuprofen"),
        PatientRow::new("B", "Male", "Flu", 2).hospital("General").test_result("Abnormal"),
        PatientRow::new("C", "Female", "Cold", 2).hospital("Mercy").medication("Ibuprofen"),
    ];
    let pipeline = pipeline_from_rows(&rows);
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let dashboard = outcome.dashboard().unwrap();

    let by_hospital = dashboard.table("medication_by_hospital").unwrap();
    assert_eq!(by_hospital.value_for(&["Mercy", "Ibuprofen"]), Some(2.0));
    assert_eq!(by_hospital.value_for(&["General", "Aspirin"]), Some(1.0));
    assert_eq!(by_hospital.rows[0].key[0].as_str(), Some("General"));

    let results = dashboard.table("test_results_by_hospital").unwrap();
    assert_eq!(results.value_for(&["General", "Abnormal"]), Some(1.0));
    assert_eq!(results.value_for(&["Mercy", "Normal"]), Some(2.0));
}

#[test]
fn location_tables_carry_coordinates() {
    let rows = vec![
        PatientRow::new("A", "Male", "Flu", 2).hospital("Mercy").billing(200.0),
        PatientRow::new("B", "Male", "Flu", 4).hospital("Mercy").billing(400.0),
        PatientRow::new("C", "Female", "Cold", 6).hospital("St. Luke").billing(50.0),
    ];
    let pipeline = pipeline_from_rows(&rows);
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let dashboard = outcome.dashboard().unwrap();

    let billing = dashboard.table("average_billing_by_location").unwrap();
    assert_eq!(billing.len(), 2);
    // Ascending latitude puts St. Luke (29.76) before Mercy (41.88)
    assert_eq!(billing.rows[0].key[0], KeyValue::Number(29.7604));
    assert_eq!(billing.rows[0].key[2], KeyValue::Text("St. Luke".into()));
    assert_eq!(billing.rows[1].value, AggregateValue::Mean(300.0));

    let stays = dashboard.table("average_stay_by_location").unwrap();
    assert_eq!(stays.rows[1].value, AggregateValue::Mean(3.0));
}

#[test]
fn populated_outcome_serializes_for_rendering() {
    let pipeline = pipeline_from_rows(&example_rows());
    let outcome = pipeline.evaluate(&pipeline.default_selection()).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "populated");
    assert_eq!(json["kpis"]["total_patients"], 2);
    let first = &json["aggregates"][0];
    assert_eq!(first["id"], "gender_distribution");
    assert_eq!(first["chart"], "bar");
    assert_eq!(first["rows"][0]["key"][0], "M");
    assert_eq!(first["rows"][0]["value"], 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pipeline_matches_brute_force(
        rows in prop::collection::vec(arb_row(), 1..40),
        choice in arb_selection(),
    ) {
        let pipeline = pipeline_from_rows(&rows);
        let selection = choice.iter().try_fold(pipeline.default_selection(), |s, (dim, values)| {
            s.with(*dim, values.iter().copied())
        }).unwrap();

        let expected: Vec<&PatientRow> = rows
            .iter()
            .filter(|row| {
                choice
                    .iter()
                    .all(|(dim, values)| values.iter().any(|v| *v == row.value(*dim)))
            })
            .collect();

        let filtered = pipeline.filter_rows(&selection).unwrap();
        prop_assert_eq!(filtered.num_rows(), expected.len());

        let outcome = pipeline.evaluate(&selection).unwrap();
        let Some(dashboard) = outcome.dashboard() else {
            prop_assert!(expected.is_empty());
            return Ok(());
        };
        prop_assert!(!expected.is_empty());

        let ids: FxHashSet<&str> = expected.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(dashboard.kpis.total_patients, ids.len());

        for id in ["gender_distribution", "blood_type_distribution", "medical_condition_counts", "patients_by_hospital"] {
            let total: f64 = dashboard.table(id).unwrap().rows.iter().map(|r| r.value.as_f64()).sum();
            prop_assert_eq!(total as usize, expected.len());
        }

        let billing = dashboard.kpis.average_billing_amount.unwrap();
        let stay = dashboard.kpis.average_length_of_stay.unwrap();
        let bounded = [
            ("average_billing_by_condition", billing),
            ("average_billing_by_insurance", billing),
            ("average_billing_by_location", billing),
            ("average_stay_by_condition", stay),
            ("average_stay_by_admission_type", stay),
            ("average_stay_by_location", stay),
        ];
        for (id, grand_mean) in bounded {
            let means: Vec<f64> = dashboard.table(id).unwrap().rows.iter().map(|r| r.value.as_f64()).collect();
            let min = means.iter().copied().fold(f64::INFINITY, f64::min);
            let max = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(min - 1e-9 <= grand_mean && grand_mean <= max + 1e-9, "{} out of bounds", id);
        }

        let expected_stay = expected.iter().map(|r| r.stay as f64).sum::<f64>() / expected.len() as f64;
        prop_assert!((stay - expected_stay).abs() < 1e-9);
    }
}
