//! CSV Export
//!
//! `list()` 결과를 한 자산당 한 줄로 내보낸다.
//! 컬럼: ID, Type, Model, Purchase Date, Warranty, Status, Location, Reason

use chrono::{DateTime, Utc};

use crate::db::Asset;

pub const CSV_HEADER: [&str; 8] = [
    "ID",
    "Type",
    "Model",
    "Purchase Date",
    "Warranty",
    "Status",
    "Location",
    "Reason",
];

/// 쉼표, 따옴표, 줄바꿈이 있으면 따옴표로 감싼다 (RFC 4180)
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_record<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push_str("\r\n");
}

/// 자산 한 건의 CSV 필드
pub fn asset_record(asset: &Asset) -> [String; 8] {
    [
        asset.id.to_string(),
        asset.asset_type.to_string(),
        asset.model.clone(),
        asset
            .purchase_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        asset.warranty.clone().unwrap_or_default(),
        asset.status.to_string(),
        asset.location.to_string(),
        asset.reason.clone().unwrap_or_default(),
    ]
}

/// 헤더 + 자산별 한 줄
pub fn render_csv(assets: &[Asset]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER);
    for asset in assets {
        push_record(&mut out, asset_record(asset));
    }
    out
}

/// `assets_YYYYMMDD_HHMMSS.csv`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("assets_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AssetLocation, AssetStatus, AssetType};
    use chrono::{NaiveDate, TimeZone};

    fn asset(id: i32, model: &str, reason: Option<&str>) -> Asset {
        Asset {
            id,
            asset_type: AssetType::Network,
            model: model.to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2023, 12, 10),
            warranty: None,
            status: AssetStatus::Operating,
            location: AssetLocation::HqServerRoom,
            reason: reason.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_header_only_for_empty_inventory() {
        assert_eq!(
            render_csv(&[]),
            "ID,Type,Model,Purchase Date,Warranty,Status,Location,Reason\r\n"
        );
    }

    #[test]
    fn test_rows_follow_list_order() {
        let csv = render_csv(&[
            asset(1, "Cisco Catalyst 2960", Some("network switch")),
            asset(4, "Juniper EX2300", None),
        ]);
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "1,NETWORK,Cisco Catalyst 2960,2023-12-10,,OPERATING,HQ_SERVER_ROOM,network switch"
        );
        assert!(lines[2].starts_with("4,NETWORK,Juniper EX2300,"));
        assert!(lines[2].ends_with(",OPERATING,HQ_SERVER_ROOM,"));
    }

    #[test]
    fn test_fields_are_quoted_when_needed() {
        let csv = render_csv(&[asset(2, "Rack \"A\", unit 3", Some("line1\nline2"))]);
        assert!(csv.contains("\"Rack \"\"A\"\", unit 3\""));
        assert!(csv.contains("\"line1\nline2\""));
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(export_filename(now), "assets_20240301_090507.csv");
    }
}
