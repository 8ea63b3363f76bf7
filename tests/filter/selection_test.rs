use care_dash::filter::{BatchFilter, Expr, ExpressionFilter, FilterOptions, FilterSelection, in_filter};
use care_dash::schema::Dimension;
use care_dash::{DashboardError, evaluate_expr};
use proptest::prelude::*;

use crate::utils::{PatientRow, arb_row, dataset_from_rows, example_rows};

#[test]
fn default_selection_keeps_every_row() {
    let dataset = dataset_from_rows(&example_rows());
    let options = FilterOptions::from_dataset(&dataset).unwrap();
    let selection = FilterSelection::all(&options);

    let filter = ExpressionFilter::new(selection.to_expr());
    assert_eq!(filter.filter(dataset.batch()).unwrap().num_rows(), 3);
    assert!(!selection.has_empty_dimension());
}

#[test]
fn options_list_values_in_discovery_order() {
    let rows = vec![
        PatientRow::new("A", "Female", "Cold", 1).insurer("Medicare"),
        PatientRow::new("B", "Male", "Flu", 1),
        PatientRow::new("C", "Female", "Cold", 1).insurer("Medicare"),
    ];
    let options = FilterOptions::from_dataset(&dataset_from_rows(&rows)).unwrap();

    assert_eq!(options.values(Dimension::Gender), ["Female", "Male"]);
    assert_eq!(options.values(Dimension::InsuranceProvider), ["Medicare", "Aetna"]);
    assert!(options.values(Dimension::TestResults).is_empty());
}

#[test]
fn dimensions_combine_with_and() {
    let rows = vec![
        PatientRow::new("A", "Male", "Flu", 1).insurer("Cigna"),
        PatientRow::new("B", "Male", "Cold", 1),
        PatientRow::new("C", "Female", "Flu", 1).insurer("Cigna"),
    ];
    let dataset = dataset_from_rows(&rows);
    let options = FilterOptions::from_dataset(&dataset).unwrap();
    let selection = FilterSelection::from_json(
        r#"{"Gender": ["Male"], "Insurance Provider": ["Cigna"]}"#,
        &options,
    )
    .unwrap();

    let mask = evaluate_expr(dataset.batch(), &selection.to_expr()).unwrap();
    assert_eq!(mask.iter().collect::<Vec<_>>(), vec![Some(true), Some(false), Some(false)]);
}

#[test]
fn selection_over_unfilterable_dimension_is_rejected() {
    let options = FilterOptions::from_dataset(&dataset_from_rows(&example_rows())).unwrap();
    let result = FilterSelection::all(&options).with(Dimension::TestResults, ["Normal"]);
    assert!(matches!(result, Err(DashboardError::ConfigError(_))));
}

#[test]
fn membership_expressions_over_patient_columns() {
    let dataset = dataset_from_rows(&example_rows());
    let flu = in_filter("Medical Condition", ["Flu"]);
    let female = in_filter("Gender", ["F"]);

    let both = ExpressionFilter::new(Expr::And(vec![flu.clone(), female]));
    assert_eq!(both.filter(dataset.batch()).unwrap().num_rows(), 0);

    let flu_only = ExpressionFilter::new(flu);
    assert_eq!(flu_only.filter(dataset.batch()).unwrap().num_rows(), 2);

    let unknown = ExpressionFilter::new(in_filter("Doctor", ["Dr. Smith"]));
    assert!(matches!(
        unknown.filter(dataset.batch()),
        Err(DashboardError::FilterError(_))
    ));
}

proptest! {
    #[test]
    fn single_dimension_filter_matches_brute_force(
        rows in prop::collection::vec(arb_row(), 1..30),
        keep_male in any::<bool>(),
    ) {
        let dataset = dataset_from_rows(&rows);
        let gender = if keep_male { "Male" } else { "Female" };

        let filtered = ExpressionFilter::new(in_filter("Gender", [gender]))
            .filter(dataset.batch())
            .unwrap();
        let expected = rows.iter().filter(|r| r.gender == gender).count();
        prop_assert_eq!(filtered.num_rows(), expected);
    }
}
