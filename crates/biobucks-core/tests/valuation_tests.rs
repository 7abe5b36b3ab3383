use biobucks_core::time_value;
use biobucks_core::valuation::{self, calculate_asset_dcf, project, Phase, Stage, ValuationRecord};
use biobucks_core::BioBucksError;
use pretty_assertions::assert_eq;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn record(value: Value) -> ValuationRecord {
    serde_json::from_value(value).unwrap()
}

/// Two-phase program with no commercial upside.
fn literal_scenario() -> ValuationRecord {
    record(json!({
        "assetOverview": {"currentDevelopmentStage": "Phase I Ready"},
        "developmentTimeline": {
            "phaseIDuration": {"value": 1},
            "phaseIIDuration": {"value": 2},
            "phaseIIIDuration": {"value": 0},
            "approvalDuration": {"value": 0}
        },
        "clinicalTrialCosts": {
            "phaseI": {"value": 10},
            "phaseII": {"value": 20},
            "phaseIII": {"value": 0},
            "approval": {"value": 0}
        },
        "probabilityOfSuccess": {
            "phaseI": {"value": 50},
            "phaseII": {"value": 80}
        },
        "marketParameters": {
            "totalAddressableMarket": {"value": 0},
            "peakMarketShare": {"value": 0},
            "yearsToPeakAdoption": {"value": 0},
            "annualPricing": {"value": 0},
            "lossOfExclusivity": {"value": 0},
            "yearsToDeclinePostLOE": {"value": 0},
            "terminalMarketShare": {"value": 0}
        },
        "financialParameters": {
            "costOfGoodsSold": {"value": 0},
            "operatingExpenses": {"value": 0},
            "taxRate": {"value": 0},
            "discountRate": {"value": 10}
        }
    }))
}

/// A full oncology program with fractional phase lengths and formatted inputs.
fn oncology_asset() -> ValuationRecord {
    record(json!({
        "assetOverview": {
            "assetName": "ONC-214",
            "therapeuticArea": "Oncology",
            "currentDevelopmentStage": "Preclinical"
        },
        "developmentTimeline": {
            "phaseIDuration": {"value": 1.5},
            "phaseIIDuration": {"value": "2.25"},
            "phaseIIIDuration": {"value": 3.5},
            "approvalDuration": {"value": 0.75}
        },
        "clinicalTrialCosts": {
            "phaseI": {"value": "$12"},
            "phaseII": {"value": 45},
            "phaseIII": {"value": "180"},
            "approval": {"value": 6}
        },
        "probabilityOfSuccess": {
            "phaseI": {"value": 63},
            "phaseII": {"value": 31},
            "phaseIII": {"value": 58},
            "approval": {"value": 92}
        },
        "marketParameters": {
            "totalAddressableMarket": {"value": "120,000"},
            "peakMarketShare": {"value": 18},
            "yearsToPeakAdoption": {"value": 4},
            "annualPricing": {"value": "$95,000"},
            "lossOfExclusivity": {"value": 12},
            "yearsToDeclinePostLOE": {"value": 3},
            "terminalMarketShare": {"value": 15}
        },
        "financialParameters": {
            "costOfGoodsSold": {"value": 10},
            "operatingExpenses": {"value": 28},
            "taxRate": {"value": 21},
            "discountRate": {"value": "12.5"}
        },
        "metadata": {"generatedDate": "2025-01-20"}
    }))
}

fn close(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < dec!(0.000001)
}

// ===========================================================================
// Literal scenario
// ===========================================================================

#[test]
fn test_literal_scenario_year_by_year() {
    let result = project(&literal_scenario()).unwrap();

    assert_eq!(result.years_to_approval, dec!(3));
    assert_eq!(result.years.len(), 4);
    assert_eq!(result.cumulative_pos, dec!(0.4));
    assert_eq!(result.wacc, dec!(0.1));

    let y0 = &result.years[0];
    assert_eq!(y0.stage, "Phase I");
    assert_eq!(y0.development_costs, dec!(10000000));
    assert_eq!(y0.risk_adjusted_fcf, dec!(-10000000));
    assert_eq!(y0.discount_factor, Decimal::ONE);
    assert_eq!(y0.present_value, dec!(-10000000));
    assert_eq!(y0.risk_phase, "Phase I (no prior risk)");

    let y1 = &result.years[1];
    assert_eq!(y1.stage, "Phase II");
    assert_eq!(y1.development_costs, dec!(10000000));
    assert_eq!(y1.risk_adjusted_fcf, dec!(-5000000));
    assert_eq!(y1.risk_phase, "Phase II (Phase I PoS applied)");
    assert!(close(y1.present_value, dec!(-5000000) / dec!(1.1)));

    let y3 = &result.years[3];
    assert_eq!(y3.revenue, Decimal::ZERO);
    assert_eq!(y3.risk_adjusted_fcf, Decimal::ZERO);
    assert_eq!(y3.risk_phase, "Commercial (full cumulative PoS)");

    let development_pv: Decimal = result.years[..3].iter().map(|y| y.present_value).sum();
    assert_eq!(result.npv, development_pv);
    assert!(close(
        result.npv,
        dec!(-10000000) - dec!(5000000) / dec!(1.1) - dec!(5000000) / dec!(1.21)
    ));
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn test_determinism() {
    let record = oncology_asset();
    let first = project(&record).unwrap();
    for _ in 0..5 {
        assert_eq!(project(&record).unwrap(), first);
    }
}

#[test]
fn test_overlap_conservation_across_development_window() {
    let resolved = valuation::AssetAssumptions::resolve(&oncology_asset()).unwrap();
    let schedule = resolved.assumptions.schedule().unwrap();
    let full_years = schedule.years_to_approval.floor().to_u32().unwrap_or(0);

    for year in 0..=full_years + 1 {
        let total: Decimal = schedule.overlaps(year).iter().map(|o| o.fraction).sum();
        assert!(total <= Decimal::ONE, "year {year} sums to {total}");
        if year < full_years {
            assert_eq!(total, Decimal::ONE, "year {year}");
        }
    }
}

#[test]
fn test_regime_partition() {
    let result = project(&oncology_asset()).unwrap();
    let mut saw_development = false;
    let mut saw_revenue = false;
    for y in &result.years {
        assert!(y.development_costs.is_zero() || y.revenue.is_zero());
        saw_development |= !y.development_costs.is_zero();
        saw_revenue |= !y.revenue.is_zero();
    }
    assert!(saw_development && saw_revenue);
}

#[test]
fn test_pos_bounded_even_above_hundred_percent() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["probabilityOfSuccess"] = json!({
        "phaseI": {"value": 140},
        "phaseII": {"value": "250"},
        "phaseIII": {"value": 100},
        "approval": {"value": 101}
    });
    let result = project(&record(value)).unwrap();
    assert_eq!(result.cumulative_pos, Decimal::ONE);

    let result = project(&oncology_asset()).unwrap();
    assert!(result.cumulative_pos >= Decimal::ZERO && result.cumulative_pos <= Decimal::ONE);
}

#[test]
fn test_zero_wacc_gives_undiscounted_sum() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["financialParameters"]["discountRate"] = json!({"value": 0});
    let result = project(&record(value)).unwrap();

    assert!(result.years.iter().all(|y| y.discount_factor == Decimal::ONE));
    let undiscounted: Decimal = result.years.iter().map(|y| y.risk_adjusted_fcf).sum();
    assert_eq!(result.npv, undiscounted);
}

#[test]
fn test_zero_peak_share_gives_no_commercial_value() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["marketParameters"]["peakMarketShare"] = json!({"value": 0});
    let result = project(&record(value)).unwrap();

    for y in result
        .years
        .iter()
        .filter(|y| Decimal::from(y.year) >= result.years_to_approval)
    {
        assert!(y.revenue.is_zero());
        assert!(y.cogs.is_zero());
        assert!(y.opex.is_zero());
        assert!(y.ebit.is_zero());
        assert!(y.tax.is_zero());
        assert!(y.fcf.is_zero());
    }
    assert!(result.npv < Decimal::ZERO);
}

#[test]
fn test_npv_agrees_with_time_value_npv() {
    let result = project(&oncology_asset()).unwrap();
    let flows: Vec<Decimal> = result.years.iter().map(|y| y.risk_adjusted_fcf).collect();
    let expected = time_value::npv(result.wacc, &flows).unwrap();
    assert!(close(result.npv, expected), "{} vs {}", result.npv, expected);
}

// ===========================================================================
// Stage handling
// ===========================================================================

#[test]
fn test_later_stage_drops_completed_costs() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["assetOverview"]["currentDevelopmentStage"] = json!("Phase 3 Ready");
    let result = project(&record(value)).unwrap();

    assert_eq!(result.years_to_approval, dec!(4.25));
    assert_eq!(result.years[0].stage, "Phase III");
    // Phases I and II no longer gate anything
    assert!(close(result.cumulative_pos, dec!(0.58) * dec!(0.92)));
    assert_eq!(result.years[0].risk_adjusted_fcf, dec!(-180000000) / dec!(3.5));
}

#[test]
fn test_approved_asset_is_commercial_from_year_zero() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["assetOverview"]["currentDevelopmentStage"] = json!("Approved");
    let result = project(&record(value)).unwrap();

    assert_eq!(result.years_to_approval, Decimal::ZERO);
    assert_eq!(result.cumulative_pos, Decimal::ONE);
    assert_eq!(result.years[0].stage, "Market Ramp");
    assert!(result.years.iter().all(|y| y.development_costs.is_zero()));
    assert!(result.npv > Decimal::ZERO);
}

#[test]
fn test_unresolved_stage_aborts() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["assetOverview"]["currentDevelopmentStage"] = json!("Phase 2b");
    match project(&record(value)).unwrap_err() {
        BioBucksError::UnresolvedStage { label } => assert_eq!(label, "Phase 2b"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_stage_remaining_phases_match_projection() {
    let resolved = valuation::AssetAssumptions::resolve(&oncology_asset()).unwrap();
    assert_eq!(resolved.assumptions.stage, Stage::Preclinical);
    let modeled: Vec<Phase> = resolved
        .assumptions
        .phases
        .iter()
        .filter(|p| p.modeled)
        .map(|p| p.phase)
        .collect();
    assert_eq!(modeled, Stage::Preclinical.remaining_phases());
}

// ===========================================================================
// Life cycle
// ===========================================================================

#[test]
fn test_commercial_stage_sequence() {
    let result = project(&oncology_asset()).unwrap();
    // Approval at 8.0; LOE 12, decline 3 → horizon 23
    assert_eq!(result.years_to_approval, dec!(8));
    assert_eq!(result.years.len(), 24);

    let stages: Vec<&str> = result.years[8..].iter().map(|y| y.stage.as_str()).collect();
    let mut expected = vec!["Market Ramp"; 4];
    expected.extend(vec!["Peak Sales"; 9]);
    expected.extend(vec!["Post-LOE Decline"; 3]);
    assert_eq!(stages, expected);
}

#[test]
fn test_peak_revenue_and_tax() {
    let result = project(&oncology_asset()).unwrap();
    let peak = &result.years[14];
    assert_eq!(peak.stage, "Peak Sales");
    // 120,000 * 18% * 95,000
    assert_eq!(peak.revenue, dec!(2052000000));
    assert_eq!(peak.ebit, dec!(2052000000) * dec!(0.62));
    assert_eq!(peak.tax, peak.ebit * dec!(0.21));
    assert_eq!(peak.fcf, peak.ebit - peak.tax);
}

// ===========================================================================
// Wire format and envelope
// ===========================================================================

#[test]
fn test_result_serialises_with_wire_names_and_floats() {
    let result = project(&literal_scenario()).unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert!(value["npv"].is_f64());
    assert!(value["cumulativePoS"].is_f64());
    assert!(value["yearsToApproval"].is_f64());
    let year = &value["years"][1];
    assert_eq!(year["year"], json!(1));
    assert_eq!(year["label"], json!("Year 1"));
    assert!(year["riskAdjustedFCF"].is_f64());
    assert!(year["developmentCosts"].is_f64());
    assert!(year["discountFactor"].is_f64());
    assert!(year["presentValue"].is_f64());
    assert_eq!(year["riskPhase"], json!("Phase II (Phase I PoS applied)"));
}

#[test]
fn test_envelope_for_messy_record() {
    let value = json!({
        "assetOverview": {"currentDevelopmentStage": "phase ii"},
        "developmentTimeline": {
            "phaseIIDuration": {"value": "n/a"},
            "phaseIIIDuration": 3
        },
        "metadata": {"generatedDate": "2024-11-02T08:15:00Z"}
    });
    let output = calculate_asset_dcf(&record(value)).unwrap();

    // Unparseable value, bare leaf, and four missing sections
    assert_eq!(output.warnings.len(), 6, "{:?}", output.warnings);
    assert_eq!(output.result.years_to_approval, Decimal::ZERO);
    assert_eq!(output.assumptions["generated_date"], json!("2024-11-02"));
    assert_eq!(output.metadata.precision, "rust_decimal_128bit");
}

#[test]
fn test_negative_cost_rejected_without_partial_output() {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["clinicalTrialCosts"]["phaseII"] = json!({"value": "-45"});
    let err = calculate_asset_dcf(&record(value)).unwrap_err();
    assert!(matches!(err, BioBucksError::InvalidInput { .. }));
}

// ===========================================================================
// Extreme magnitudes
// ===========================================================================

fn approved_oncology_asset() -> Value {
    let mut value = serde_json::to_value(oncology_asset()).unwrap();
    value["assetOverview"]["currentDevelopmentStage"] = json!("Approved");
    value
}

#[test]
fn test_revenue_beyond_decimal_range_is_an_error() {
    let mut value = approved_oncology_asset();
    value["marketParameters"]["totalAddressableMarket"] = json!({"value": "1e15"});
    value["marketParameters"]["peakMarketShare"] = json!({"value": 100});
    value["marketParameters"]["annualPricing"] = json!({"value": "1e15"});

    let outcome = std::panic::catch_unwind(|| project(&record(value)));
    let err = outcome.expect("projection must not panic").unwrap_err();
    assert!(matches!(err, BioBucksError::FinancialImpossibility(_)), "{err}");
}

#[test]
fn test_phase_cost_beyond_decimal_range_is_an_error() {
    let value = json!({
        "assetOverview": {"currentDevelopmentStage": "Phase I Ready"},
        "developmentTimeline": {"phaseIDuration": {"value": 1}},
        "clinicalTrialCosts": {"phaseI": {"value": "1e23"}}
    });

    let outcome = std::panic::catch_unwind(|| calculate_asset_dcf(&record(value)));
    let err = outcome.expect("projection must not panic").unwrap_err();
    assert!(matches!(err, BioBucksError::FinancialImpossibility(_)), "{err}");
}

#[test]
fn test_high_wacc_over_long_horizon_discounts_to_zero() {
    let mut value = approved_oncology_asset();
    value["marketParameters"]["lossOfExclusivity"] = json!({"value": 120});
    value["financialParameters"]["discountRate"] = json!({"value": 100});

    let result = project(&record(value)).unwrap();
    // ceil(0 + 120 + 3)
    assert_eq!(result.years.len(), 124);
    assert_eq!(result.years[1].discount_factor, dec!(0.5));

    for pair in result.years.windows(2) {
        assert!(pair[1].discount_factor <= pair[0].discount_factor);
        assert!(pair[1].discount_factor >= Decimal::ZERO);
    }
    let last = result.years.last().unwrap();
    assert!(last.discount_factor < dec!(0.00000000000000000001));
    assert!(last.present_value.abs() < dec!(0.000001));

    let pv_total: Decimal = result.years.iter().map(|y| y.present_value).sum();
    assert_eq!(result.npv, pv_total);
    assert!(result.npv > Decimal::ZERO);
}

#[test]
fn test_out_of_range_number_falls_back_with_distinct_warning() {
    let mut value = approved_oncology_asset();
    value["marketParameters"]["totalAddressableMarket"] = json!({"value": 1e30});

    let output = calculate_asset_dcf(&record(value)).unwrap();
    let warning = output
        .warnings
        .iter()
        .find(|w| w.contains("totalAddressableMarket"))
        .unwrap();
    assert!(warning.contains("outside the supported decimal range"), "{warning}");
    assert!(output.result.years.iter().all(|y| y.revenue.is_zero()));
}
