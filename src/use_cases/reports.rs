// Pure aggregations behind the reporting screens. Input rows are already
// validated against the report schemas; these functions never fail.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::domain::{FieldPath, Record, SchemaError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonHarvest {
    pub season_id: i64,
    pub season_name: Option<String>,
    pub crop_name: Option<String>,
    pub total_quantity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentsSummary {
    #[serde(default)]
    pub by_severity: BTreeMap<String, i64>,
    #[serde(default)]
    pub by_status: BTreeMap<String, i64>,
    #[serde(default)]
    pub by_incident_type: BTreeMap<String, i64>,
    #[serde(default)]
    pub total_count: i64,
    pub average_resolution_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSummary {
    pub year: i32,
    pub month: u32,
    pub movement_type: String,
    pub total_quantity: Option<f64>,
}

/// Decodes validated report rows into typed structs. An error names the
/// failing row index.
pub fn decode_rows<T: DeserializeOwned>(rows: &[Record]) -> Result<Vec<T>, SchemaError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            row.decode().map_err(|err| {
                SchemaError::mismatch(
                    FieldPath::root().index(index),
                    std::any::type_name::<T>(),
                    err.to_string(),
                )
            })
        })
        .collect()
}

pub fn decode_summary<T: DeserializeOwned>(record: &Record) -> Result<T, SchemaError> {
    record.decode().map_err(|err| {
        SchemaError::mismatch(FieldPath::root(), std::any::type_name::<T>(), err.to_string())
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthPoint {
    pub month: u32,
    pub total: f64,
}

// One point per calendar month of `year`; months without rows stay at zero.
pub fn monthly_series(rows: &[MonthlyTotal], year: i32) -> Vec<MonthPoint> {
    let mut points: Vec<MonthPoint> = (1..=12).map(|month| MonthPoint { month, total: 0.0 }).collect();
    for row in rows.iter().filter(|row| row.year == year) {
        if let Some(point) = points.get_mut(row.month.wrapping_sub(1) as usize) {
            point.total += row.total.unwrap_or(0.0);
        }
    }
    points
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropHarvest {
    pub crop: String,
    pub total: f64,
}

const UNKNOWN_CROP: &str = "Unknown";

pub fn harvest_by_crop(rows: &[SeasonHarvest]) -> Vec<CropHarvest> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        let crop = row
            .crop_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_CROP);
        *totals.entry(crop).or_default() += row.total_quantity.unwrap_or(0.0);
    }

    let mut harvest: Vec<CropHarvest> = totals
        .into_iter()
        .map(|(crop, total)| CropHarvest {
            crop: crop.to_string(),
            total,
        })
        .collect();
    harvest.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.crop.cmp(&b.crop)));
    harvest
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub count: i64,
    // Share of the total, rounded to one decimal.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentBreakdown {
    pub total: i64,
    pub by_severity: Vec<Slice>,
    pub by_status: Vec<Slice>,
    pub top_types: Vec<Slice>,
    pub average_resolution_days: Option<f64>,
}

fn percent(count: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

fn slices(counts: &BTreeMap<String, i64>, total: i64) -> Vec<Slice> {
    let mut slices: Vec<Slice> = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(label, count)| Slice {
            label: label.clone(),
            count: *count,
            percent: percent(*count, total),
        })
        .collect();
    slices.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    slices
}

pub fn incident_breakdown(summary: &IncidentsSummary, top_n: usize) -> IncidentBreakdown {
    // The server total wins; older servers omit it.
    let total = if summary.total_count > 0 {
        summary.total_count
    } else {
        summary.by_status.values().sum()
    };

    let mut top_types = slices(&summary.by_incident_type, total);
    top_types.truncate(top_n);

    IncidentBreakdown {
        total,
        by_severity: slices(&summary.by_severity, total),
        by_status: slices(&summary.by_status, total),
        top_types,
        average_resolution_days: summary
            .average_resolution_days
            .map(|days| (days * 10.0).round() / 10.0),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementPoint {
    pub month: u32,
    pub inbound: f64,
    pub outbound: f64,
    pub adjustment: f64,
    pub other: BTreeMap<String, f64>,
}

pub fn movement_series(rows: &[MovementSummary], year: i32) -> Vec<MovementPoint> {
    let mut points: Vec<MovementPoint> = (1..=12)
        .map(|month| MovementPoint {
            month,
            ..MovementPoint::default()
        })
        .collect();

    for row in rows.iter().filter(|row| row.year == year) {
        let Some(point) = points.get_mut(row.month.wrapping_sub(1) as usize) else {
            continue;
        };
        let quantity = row.total_quantity.unwrap_or(0.0);
        match row.movement_type.to_ascii_uppercase().as_str() {
            "IN" => point.inbound += quantity,
            "OUT" => point.outbound += quantity,
            "ADJUST" => point.adjustment += quantity,
            _ => *point.other.entry(row.movement_type.clone()).or_default() += quantity,
        }
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    // Whether the counts describe a filtered listing rather than every document.
    pub is_filtered: bool,
}

pub fn document_stats(documents: &[Record], filtered: bool) -> DocumentStats {
    let active = documents
        .iter()
        .filter(|doc| {
            doc.str("status")
                .is_some_and(|status| status.eq_ignore_ascii_case("active"))
        })
        .count();

    DocumentStats {
        total: documents.len(),
        active,
        inactive: documents.len() - active,
        is_filtered: filtered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn monthly(year: i32, month: u32, total: Option<f64>) -> MonthlyTotal {
        MonthlyTotal { year, month, total }
    }

    fn harvest(crop: Option<&str>, quantity: f64) -> SeasonHarvest {
        SeasonHarvest {
            season_id: 1,
            season_name: None,
            crop_name: crop.map(str::to_string),
            total_quantity: Some(quantity),
        }
    }

    #[test]
    fn when_months_are_missing_then_series_is_zero_filled() {
        let rows = vec![
            monthly(2024, 3, Some(100.0)),
            monthly(2024, 3, Some(50.0)),
            monthly(2024, 12, None),
            monthly(2023, 3, Some(999.0)),
            monthly(2024, 13, Some(1.0)),
        ];

        let series = monthly_series(&rows, 2024);

        assert_eq!(series.len(), 12);
        assert_eq!(series[2], MonthPoint { month: 3, total: 150.0 });
        assert_eq!(series[11].total, 0.0);
        assert_eq!(series.iter().map(|p| p.total).sum::<f64>(), 150.0);
    }

    #[test]
    fn when_crops_tie_then_they_are_ordered_by_name() {
        let rows = vec![
            harvest(Some("Rice"), 10.0),
            harvest(Some("Corn"), 30.0),
            harvest(Some("Rice"), 20.0),
            harvest(None, 5.0),
            harvest(Some("Bean"), 30.0),
        ];

        let crops: Vec<(String, f64)> = harvest_by_crop(&rows)
            .into_iter()
            .map(|c| (c.crop, c.total))
            .collect();

        assert_eq!(
            crops,
            vec![
                ("Bean".to_string(), 30.0),
                ("Corn".to_string(), 30.0),
                ("Rice".to_string(), 30.0),
                ("Unknown".to_string(), 5.0),
            ]
        );
    }

    #[test]
    fn when_summary_is_broken_down_then_percentages_use_the_total() {
        let summary = IncidentsSummary {
            by_severity: BTreeMap::from([("HIGH".to_string(), 1), ("LOW".to_string(), 2)]),
            by_status: BTreeMap::from([("OPEN".to_string(), 3)]),
            by_incident_type: BTreeMap::from([
                ("PEST".to_string(), 2),
                ("FLOOD".to_string(), 1),
                ("DROUGHT".to_string(), 0),
            ]),
            total_count: 3,
            average_resolution_days: Some(2.345),
        };

        let breakdown = incident_breakdown(&summary, 1);

        assert_eq!(breakdown.by_severity[0].label, "LOW");
        assert_eq!(breakdown.by_severity[0].percent, 66.7);
        assert_eq!(breakdown.by_status[0].percent, 100.0);
        assert_eq!(breakdown.top_types.len(), 1);
        assert_eq!(breakdown.top_types[0].label, "PEST");
        assert_eq!(breakdown.average_resolution_days, Some(2.3));
    }

    #[test]
    fn when_total_is_absent_then_status_counts_are_summed() {
        let summary = IncidentsSummary {
            by_severity: BTreeMap::new(),
            by_status: BTreeMap::from([("OPEN".to_string(), 1), ("CLOSED".to_string(), 3)]),
            by_incident_type: BTreeMap::new(),
            total_count: 0,
            average_resolution_days: None,
        };

        let breakdown = incident_breakdown(&summary, 5);

        assert_eq!(breakdown.total, 4);
        assert_eq!(breakdown.by_status[0].percent, 75.0);
    }

    #[test]
    fn when_movement_type_is_unknown_then_it_keeps_its_name() {
        let rows = vec![
            MovementSummary {
                year: 2024,
                month: 1,
                movement_type: "IN".to_string(),
                total_quantity: Some(10.0),
            },
            MovementSummary {
                year: 2024,
                month: 1,
                movement_type: "out".to_string(),
                total_quantity: Some(4.0),
            },
            MovementSummary {
                year: 2024,
                month: 1,
                movement_type: "TRANSFER".to_string(),
                total_quantity: Some(2.0),
            },
        ];

        let series = movement_series(&rows, 2024);

        assert_eq!(series[0].inbound, 10.0);
        assert_eq!(series[0].outbound, 4.0);
        assert_eq!(series[0].other.get("TRANSFER"), Some(&2.0));
        assert_eq!(series[1], MovementPoint { month: 2, ..MovementPoint::default() });
    }

    #[test]
    fn when_documents_are_counted_then_unknown_status_is_inactive() {
        let docs = vec![
            Record::new().with("status", "ACTIVE"),
            Record::new().with("status", "INACTIVE"),
            Record::new().with("status", FieldValue::Null),
        ];

        let stats = document_stats(&docs, true);

        assert_eq!(
            stats,
            DocumentStats {
                total: 3,
                active: 1,
                inactive: 2,
                is_filtered: true
            }
        );
    }

    #[test]
    fn when_rows_are_decoded_then_optional_fields_may_be_absent() {
        let rows = vec![
            Record::new()
                .with("seasonId", 4_i64)
                .with("totalQuantity", FieldValue::Null),
        ];

        let decoded: Vec<SeasonHarvest> = decode_rows(&rows).expect("expected rows");

        assert_eq!(decoded[0].season_id, 4);
        assert_eq!(decoded[0].crop_name, None);
    }

    #[test]
    fn when_row_cannot_be_decoded_then_index_is_reported() {
        let rows = vec![
            Record::new().with("year", 2024_i64).with("month", 1_i64),
            Record::new().with("year", "soon"),
        ];

        let err = decode_rows::<MonthlyTotal>(&rows).expect_err("expected decode failure");

        assert_eq!(err.path.first_index(), Some(1));
    }
}
