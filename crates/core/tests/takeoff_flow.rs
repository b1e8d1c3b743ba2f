use approx::assert_relative_eq;
use takeoff_core::{
    active_scale, derive_scale, export_measurements_csv, measurements_in_scope, recalculate,
    Calibration, CalibrationScope, CsvExportConfig, Cutout, Measurement, MeasurementCalculator,
    NormalizedPoint, ProjectId, SheetId, Viewport,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<NormalizedPoint> {
    vec![
        NormalizedPoint::new(x0, y0),
        NormalizedPoint::new(x1, y0),
        NormalizedPoint::new(x1, y1),
        NormalizedPoint::new(x0, y1),
    ]
}

fn apply_all(measurements: &mut [Measurement], report: &takeoff_core::RecalculationReport) {
    for update in &report.updates {
        for measurement in measurements.iter_mut() {
            measurement.apply_update(update);
        }
    }
}

#[test]
fn calibrate_measure_and_recalibrate_page() {
    let (project, sheet) = (ProjectId::new_v4(), SheetId::new_v4());
    let page = Viewport::new(1000.0, 800.0);
    let calc = MeasurementCalculator::default();

    // 800px between the clicks is 20 ft
    let outcome = derive_scale(
        NormalizedPoint::new(0.1, 0.5),
        NormalizedPoint::new(0.9, 0.5),
        20.0,
        "ft",
        &page,
    )
    .expect("calibration should succeed");
    assert!(!outcome.requires_confirmation());

    let mut calibrations = vec![Calibration::from_outcome(
        project,
        sheet,
        CalibrationScope::Document,
        &outcome,
        100,
    )];

    let mut measurements = vec![
        Measurement::linear(
            project,
            sheet,
            1,
            vec![NormalizedPoint::new(0.1, 0.25), NormalizedPoint::new(0.5, 0.25)],
        ),
        Measurement::area(
            project,
            sheet,
            1,
            rect(0.0, 0.0, 0.5, 0.5),
            vec![Cutout::new(rect(0.1, 0.1, 0.2, 0.2))],
        ),
        Measurement::count(project, sheet, 1, NormalizedPoint::new(0.7, 0.7)),
        Measurement::linear(
            project,
            sheet,
            2,
            vec![NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(1.0, 0.0)],
        ),
    ];

    let active = active_scale(&calibrations, project, sheet, 1, &page);
    assert!(active.is_persistable());

    let report = recalculate(&calc, &measurements, active.context());
    assert!(report.is_complete());
    apply_all(&mut measurements, &report);

    // 400px * 0.025 = 10 LF
    assert_relative_eq!(measurements[0].calculated_value, 10.0, max_relative = 1e-9);
    assert_eq!(measurements[0].unit, "LF");
    // 500x400px * 0.025² = 125 SF, cutout 100x80px = 5 SF
    assert_relative_eq!(measurements[1].calculated_value, 125.0, max_relative = 1e-9);
    assert_eq!(measurements[1].net_calculated_value(), Some(120.0));
    assert_eq!(measurements[1].reported_value(), 120.0);
    // 1000px * 0.025 = 25 LF
    assert_relative_eq!(measurements[3].calculated_value, 25.0, max_relative = 1e-9);

    // Page 1 is recalibrated at double the scale
    let page_outcome = derive_scale(
        NormalizedPoint::new(0.1, 0.5),
        NormalizedPoint::new(0.9, 0.5),
        40.0,
        "ft",
        &page,
    )
    .expect("recalibration should succeed");
    let page_calibration = Calibration::from_outcome(
        project,
        sheet,
        CalibrationScope::Page(1),
        &page_outcome,
        200,
    );
    calibrations.push(page_calibration.clone());

    let affected: Vec<Measurement> = measurements_in_scope(&measurements, &calibrations, &page_calibration)
        .into_iter()
        .cloned()
        .collect();
    assert_eq!(affected.len(), 3);
    assert!(affected.iter().all(|m| m.page_number == 1));

    let report = recalculate(&calc, &affected, &page_calibration.scale_context());
    assert_eq!(report.updates.len(), 2);
    apply_all(&mut measurements, &report);

    assert_relative_eq!(measurements[0].calculated_value, 20.0, max_relative = 1e-9);
    assert_relative_eq!(measurements[1].calculated_value, 500.0, max_relative = 1e-9);
    assert_eq!(measurements[1].net_calculated_value(), Some(480.0));
    // Page 2 still follows the document calibration
    assert_relative_eq!(measurements[3].calculated_value, 25.0, max_relative = 1e-9);
}

#[test]
fn repeated_recalibration_does_not_drift() {
    let (project, sheet) = (ProjectId::new_v4(), SheetId::new_v4());
    let page = Viewport::new(1000.0, 800.0);
    let calc = MeasurementCalculator::default();
    let mut measurements = vec![Measurement::volume(
        project,
        sheet,
        1,
        rect(0.2, 0.2, 0.6, 0.7),
        0.5,
        vec![Cutout::new(rect(0.3, 0.3, 0.4, 0.4))],
    )];

    let derive = |distance: f64| {
        derive_scale(
            NormalizedPoint::new(0.1, 0.5),
            NormalizedPoint::new(0.9, 0.5),
            distance,
            "ft",
            &page,
        )
        .expect("calibration should succeed")
        .scale_context
    };

    let original = derive(20.0);
    let first = recalculate(&calc, &measurements, &original);
    apply_all(&mut measurements, &first);

    for distance in [30.0, 45.0, 12.5] {
        let report = recalculate(&calc, &measurements, &derive(distance));
        apply_all(&mut measurements, &report);
    }

    let back = recalculate(&calc, &measurements, &original);
    assert_eq!(first.updates, back.updates);
    assert_eq!(measurements[0].unit, "CF");
}

#[test]
fn uncalibrated_page_is_display_only() {
    let (project, sheet) = (ProjectId::new_v4(), SheetId::new_v4());
    let page = Viewport::new(612.0, 792.0);
    let active = active_scale(&[], project, sheet, 1, &page);
    assert!(!active.is_persistable());

    let calc = MeasurementCalculator::default();
    let result = calc.linear(
        &[NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(1.0, 0.0)],
        active.context(),
    );
    assert_relative_eq!(result.calculated_value, 612.0, max_relative = 1e-9);
}

#[test]
fn measurements_serialize_with_type_tag() {
    let (project, sheet) = (ProjectId::new_v4(), SheetId::new_v4());
    let measurement = Measurement::area(project, sheet, 3, rect(0.0, 0.0, 0.5, 0.5), Vec::new());

    let value = serde_json::to_value(&measurement).expect("measurement should serialize");
    assert_eq!(value["type"], "area");
    assert_eq!(value["page_number"], 3);

    let decoded: Measurement = serde_json::from_value(value).expect("measurement should deserialize");
    assert_eq!(decoded, measurement);
}

#[test]
fn export_after_recalculation() {
    let (project, sheet) = (ProjectId::new_v4(), SheetId::new_v4());
    let page = Viewport::new(1000.0, 800.0);
    let scale = derive_scale(
        NormalizedPoint::new(0.1, 0.5),
        NormalizedPoint::new(0.9, 0.5),
        20.0,
        "ft",
        &page,
    )
    .expect("calibration should succeed")
    .scale_context;

    let mut measurements = vec![Measurement::area(
        project,
        sheet,
        1,
        rect(0.0, 0.0, 0.5, 0.5),
        vec![Cutout::new(rect(0.1, 0.1, 0.2, 0.2))],
    )];
    let report = recalculate(&MeasurementCalculator::default(), &measurements, &scale);
    apply_all(&mut measurements, &report);

    let mut output = Vec::new();
    export_measurements_csv(&mut output, &measurements, &CsvExportConfig::default())
        .expect("export should succeed");
    let csv = String::from_utf8(output).expect("csv should be utf-8");
    assert!(csv.contains("120.00 SF"));
}

#[test]
fn rotated_calibration_measures_the_unrotated_page() {
    let (project, sheet) = (ProjectId::new_v4(), SheetId::new_v4());
    // 800x1000 portrait sheet displayed at 90°: 1000 px wide on screen
    let displayed = Viewport::new(1000.0, 800.0).with_rotation(90);
    let calc = MeasurementCalculator::default();

    let outcome = derive_scale(
        NormalizedPoint::new(0.5, 0.1),
        NormalizedPoint::new(0.5, 0.9),
        20.0,
        "ft",
        &displayed,
    )
    .expect("calibration should succeed");
    let calibration =
        Calibration::from_outcome(project, sheet, CalibrationScope::Document, &outcome, 1);
    let scale = calibration.scale_context();

    let line = calc.linear(
        &[NormalizedPoint::new(0.5, 0.1), NormalizedPoint::new(0.5, 0.9)],
        &scale,
    );
    assert_relative_eq!(line.calculated_value, 20.0, max_relative = 1e-9);

    let full_height = calc.linear(
        &[NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(0.0, 1.0)],
        &scale,
    );
    assert_relative_eq!(full_height.calculated_value, 25.0, max_relative = 1e-9);

    // 400x500 px * 0.025² = 125 SF
    let area = calc.area(&rect(0.0, 0.0, 0.5, 0.5), &scale);
    assert_relative_eq!(area.calculated_value, 125.0, max_relative = 1e-9);
}
