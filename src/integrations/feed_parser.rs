//! Turns the two OpScreen page formats into a station summary.
//!
//! Both parsers apply the same severity rule: start from the best status the
//! format allows and only ever downgrade, so an error seen anywhere on the
//! page wins regardless of order.

use integrations::opscreen_response::OpScreenEntry;
use remote_status::{OpType, SystemStatus};

const SUMMARY_SETTING: &str = "SUMMARY";
const OP_TYPE_SETTING: &str = "OP_TYPE";

const LEGACY_ROW_PREFIX: &str = "<tr><td>DR";
const LEGACY_ROW_SUFFIX: &str = "</td>";

#[derive(Clone, Debug, PartialEq)]
pub struct FeedSummary {
    pub system_status: SystemStatus,
    pub op_types: Vec<OpType>,
}

/// Summarizes the entries of a `status.json` feed for a station with
/// `recorder_count` data recorders.
pub fn summarize_entries(entries: &[OpScreenEntry], recorder_count: usize) -> FeedSummary {
    let mut system_status = SystemStatus::Normal;
    let mut op_types = vec![OpType::Idle; recorder_count];

    for entry in entries {
        if entry.setting == SUMMARY_SETTING {
            if let Some(observed) = summary_severity(entry.value_str()) {
                system_status = system_status.downgrade(observed);
            }
        }

        if entry.setting == OP_TYPE_SETTING {
            if let Some(index) = recorder_index(&entry.subsystem, recorder_count) {
                if let Some(op_type) = op_type_keyword(entry.value_str()) {
                    op_types[index] = op_type;
                }
            }
        }
    }

    FeedSummary {
        system_status: system_status,
        op_types: op_types,
    }
}

/// Summarizes the old `os2.php` HTML page. A page without any status icon
/// reads as an error.
pub fn summarize_legacy_page(page: &str, recorder_count: usize) -> FeedSummary {
    let mut system_status: Option<SystemStatus> = None;
    let mut op_types = vec![OpType::Idle; recorder_count];

    for line in page.lines() {
        if let Some(observed) = legacy_icon_severity(line) {
            system_status = Some(match system_status {
                Some(current) => current.downgrade(observed),
                None => observed,
            });
        }

        if let Some(index) = legacy_recorder_row(line, recorder_count) {
            if line.contains("Record") {
                op_types[index] = OpType::Recording;
            } else if line.contains("Spectrometr") {
                op_types[index] = OpType::Spectrometer;
            }
        }
    }

    FeedSummary {
        system_status: system_status.unwrap_or(SystemStatus::Error),
        op_types: op_types,
    }
}

fn summary_severity(value: &str) -> Option<SystemStatus> {
    match value {
        "ERROR" => Some(SystemStatus::Error),
        "WARNING" | "SHUTDWN" => Some(SystemStatus::Warning),
        _ => None,
    }
}

fn op_type_keyword(value: &str) -> Option<OpType> {
    match value {
        "Record" => Some(OpType::Recording),
        "Spectrometr" => Some(OpType::Spectrometer),
        _ => None,
    }
}

/// `DR3` -> 2. Recorders outside the station's configured range are ignored.
fn recorder_index(subsystem: &str, recorder_count: usize) -> Option<usize> {
    let number = subsystem.trim().strip_prefix("DR")?.parse::<usize>().ok()?;
    if number >= 1 && number <= recorder_count {
        Some(number - 1)
    } else {
        debug!(
            "--OpScreen--: Ignoring {} on a station with {} recorders.",
            subsystem, recorder_count
        );
        None
    }
}

fn legacy_icon_severity(line: &str) -> Option<SystemStatus> {
    if line.contains("favicon-error") {
        Some(SystemStatus::Error)
    } else if line.contains("favicon-warning") {
        Some(SystemStatus::Warning)
    } else if line.contains("favicon-normal") {
        Some(SystemStatus::Normal)
    } else {
        None
    }
}

/// Matches `<tr><td>DR<digit></td>` anywhere in the line.
fn legacy_recorder_row(line: &str, recorder_count: usize) -> Option<usize> {
    let digit = line
        .match_indices(LEGACY_ROW_PREFIX)
        .filter_map(|(start, _)| {
            let rest = &line[start + LEGACY_ROW_PREFIX.len()..];
            let digit = rest.chars().next()?.to_digit(10)? as usize;
            if rest[1..].starts_with(LEGACY_ROW_SUFFIX) {
                Some(digit)
            } else {
                None
            }
        })
        .next()?;
    if digit >= 1 && digit <= recorder_count {
        Some(digit - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    fn entry(subsystem: &str, setting: &str, value: &str) -> OpScreenEntry {
        OpScreenEntry {
            subsystem: subsystem.to_string(),
            setting: setting.to_string(),
            value: Value::String(value.to_string()),
        }
    }

    #[test]
    fn normal_feed_with_mixed_recorders() {
        let entries = vec![
            entry("SHL", "SUMMARY", "NORMAL"),
            entry("DR1", "OP_TYPE", "Record"),
            entry("DR2", "OP_TYPE", "idle"),
            entry("DR3", "OP_TYPE", "Spectrometr"),
        ];
        let summary = summarize_entries(&entries, 3);
        assert_eq!(summary.system_status, SystemStatus::Normal);
        assert_eq!(
            summary.op_types,
            vec![OpType::Recording, OpType::Idle, OpType::Spectrometer]
        );
    }

    #[test]
    fn warning_only_feed() {
        let entries = vec![
            entry("SHL", "SUMMARY", "NORMAL"),
            entry("ASP", "SUMMARY", "WARNING"),
            entry("DP", "SUMMARY", "NORMAL"),
        ];
        let summary = summarize_entries(&entries, 5);
        assert_eq!(summary.system_status, SystemStatus::Warning);
        assert_eq!(summary.op_types, vec![OpType::Idle; 5]);
    }

    #[test]
    fn shutdown_counts_as_warning() {
        let entries = vec![entry("MCS", "SUMMARY", "SHUTDWN")];
        assert_eq!(
            summarize_entries(&entries, 4).system_status,
            SystemStatus::Warning
        );
    }

    #[test]
    fn error_sticks_after_later_warning() {
        let entries = vec![
            entry("ASP", "SUMMARY", "ERROR"),
            entry("SHL", "SUMMARY", "WARNING"),
            entry("DP", "SUMMARY", "NORMAL"),
        ];
        assert_eq!(
            summarize_entries(&entries, 4).system_status,
            SystemStatus::Error
        );
    }

    #[test]
    fn summary_only_counts_for_summary_setting() {
        let entries = vec![entry("ASP", "LAST_LOG", "ERROR")];
        assert_eq!(
            summarize_entries(&entries, 4).system_status,
            SystemStatus::Normal
        );
    }

    #[test]
    fn out_of_range_recorders_are_ignored() {
        let entries = vec![
            entry("DR0", "OP_TYPE", "Record"),
            entry("DR5", "OP_TYPE", "Record"),
            entry("DRX", "OP_TYPE", "Record"),
            entry("DR4", "OP_TYPE", "Spectrometr"),
        ];
        let summary = summarize_entries(&entries, 4);
        assert_eq!(
            summary.op_types,
            vec![
                OpType::Idle,
                OpType::Idle,
                OpType::Idle,
                OpType::Spectrometer
            ]
        );
    }

    #[test]
    fn op_type_requires_op_type_setting() {
        let entries = vec![entry("DR1", "STORAGE", "Record")];
        assert_eq!(summarize_entries(&entries, 5).op_types, vec![OpType::Idle; 5]);
    }

    #[test]
    fn same_feed_summarizes_identically() {
        let entries = vec![
            entry("SHL", "SUMMARY", "WARNING"),
            entry("DR2", "OP_TYPE", "Record"),
        ];
        assert_eq!(summarize_entries(&entries, 5), summarize_entries(&entries, 5));
    }

    const LEGACY_PAGE: &str = "<html><head>
<link rel=\"icon\" href=\"favicon-normal.png\">
</head><body><table>
<tr><td>DR1</td><td>Record</td></tr>
<tr><td>DR2</td><td>Idle</td></tr>
<tr><td>DR3</td><td>Spectrometr</td></tr>
<tr><td>DR9</td><td>Record</td></tr>
</table></body></html>";

    #[test]
    fn legacy_page_rows_and_icon() {
        let summary = summarize_legacy_page(LEGACY_PAGE, 5);
        assert_eq!(summary.system_status, SystemStatus::Normal);
        assert_eq!(
            summary.op_types,
            vec![
                OpType::Recording,
                OpType::Idle,
                OpType::Spectrometer,
                OpType::Idle,
                OpType::Idle
            ]
        );
    }

    #[test]
    fn legacy_page_takes_worst_icon() {
        let page = "<img src=\"favicon-error.png\">\n<img src=\"favicon-normal.png\">";
        assert_eq!(
            summarize_legacy_page(page, 5).system_status,
            SystemStatus::Error
        );

        let page = "<img src=\"favicon-normal.png\">\n<img src=\"favicon-warning.png\">";
        assert_eq!(
            summarize_legacy_page(page, 5).system_status,
            SystemStatus::Warning
        );
    }

    #[test]
    fn legacy_page_without_icon_is_error() {
        assert_eq!(
            summarize_legacy_page("<html></html>", 5).system_status,
            SystemStatus::Error
        );
    }

    #[test]
    fn legacy_row_needs_closing_cell() {
        assert_eq!(legacy_recorder_row("<tr><td>DR12</td>", 5), None);
        assert_eq!(legacy_recorder_row("<tr><td>DR2</td>", 5), Some(1));
        assert_eq!(legacy_recorder_row("<td>DR2</td>", 5), None);
    }

    #[test]
    fn legacy_row_found_past_a_malformed_cell() {
        let line = "<tr><td>DRX</td><td>Idle</td></tr><tr><td>DR2</td><td>Record</td></tr>";
        assert_eq!(legacy_recorder_row(line, 5), Some(1));
        assert_eq!(
            summarize_legacy_page(line, 5).op_types,
            vec![
                OpType::Idle,
                OpType::Recording,
                OpType::Idle,
                OpType::Idle,
                OpType::Idle
            ]
        );
    }

    fn severity_token() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("NORMAL"),
            Just("WARNING"),
            Just("SHUTDWN"),
            Just("ERROR"),
            Just("UNKNOWN"),
        ]
    }

    fn op_token() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("Record"), Just("Spectrometr"), Just("idle"), Just("")]
    }

    proptest! {
        #[test]
        fn any_error_summary_wins(tokens in prop::collection::vec(severity_token(), 0..20)) {
            let entries: Vec<OpScreenEntry> = tokens
                .iter()
                .map(|token| entry("SUB", "SUMMARY", token))
                .collect();
            let status = summarize_entries(&entries, 5).system_status;

            if tokens.contains(&"ERROR") {
                prop_assert_eq!(status, SystemStatus::Error);
            } else if tokens.contains(&"WARNING") || tokens.contains(&"SHUTDWN") {
                prop_assert_eq!(status, SystemStatus::Warning);
            } else {
                prop_assert_eq!(status, SystemStatus::Normal);
            }
        }

        #[test]
        fn op_types_always_sized_to_station(
            recorder_count in prop_oneof![Just(4usize), Just(5usize)],
            rows in prop::collection::vec((0usize..9, op_token()), 0..20),
        ) {
            let entries: Vec<OpScreenEntry> = rows
                .iter()
                .map(|(n, token)| entry(&format!("DR{}", n), "OP_TYPE", token))
                .collect();
            prop_assert_eq!(summarize_entries(&entries, recorder_count).op_types.len(), recorder_count);

            let page: String = rows
                .iter()
                .map(|(n, token)| format!("<tr><td>DR{}</td><td>{}</td></tr>\n", n, token))
                .collect();
            prop_assert_eq!(summarize_legacy_page(&page, recorder_count).op_types.len(), recorder_count);
        }
    }
}
