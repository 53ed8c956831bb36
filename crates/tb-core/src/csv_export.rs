//! CSV timesheet export.

use chrono::NaiveDate;
use csv::Writer;

use crate::report::{derived_start, format_duration};
use crate::types::{TaskEntry, format_clock};

/// Column headers of the exported timesheet.
pub const CSV_HEADER: [&str; 7] = ["No", "Date", "Task", "Start", "End", "Duration", "Description"];

/// Serializes entries as CSV, newest first.
///
/// The start column is derived from the recorded end clock minus the
/// duration and may therefore show a time on the previous day.
pub fn export_csv(entries: &[TaskEntry]) -> Result<Vec<u8>, csv::Error> {
    let mut ordered: Vec<&TaskEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| {
        (b.date, b.end_clock, b.id).cmp(&(a.date, a.end_clock, a.id))
    });

    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for (index, entry) in ordered.iter().enumerate() {
        wtr.write_record([
            (index + 1).to_string(),
            entry.date.to_string(),
            entry.label.clone(),
            format_clock(derived_start(entry.end_clock, entry.duration_secs)),
            format_clock(entry.end_clock),
            format_duration(entry.duration_secs),
            entry.description.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|err| err.into_error().into())
}

/// File name offered for a user's export.
pub fn export_filename(today: NaiveDate) -> String {
    format!("timesheet_{today}.csv")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::types::UserId;

    fn entry(id: i64, secs: i64, day: &str, end: &str, description: Option<&str>) -> TaskEntry {
        TaskEntry {
            id,
            user_id: UserId::new(1),
            label: format!("Task {id}"),
            duration_secs: secs,
            date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            end_clock: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            description: description.map(str::to_string),
        }
    }

    fn parse(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(bytes);
        let header = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn export_round_trips_rows_and_durations() {
        let entries = vec![
            entry(1, 3_725, "2025-01-14", "10:00", Some("standup, notes")),
            entry(2, 59, "2025-01-15", "09:00", None),
            entry(3, 90_000, "2025-01-15", "18:30", Some("line\nbreak")),
        ];

        let (header, rows) = parse(&export_csv(&entries).unwrap());

        assert_eq!(header, CSV_HEADER.to_vec());
        assert_eq!(rows.len(), entries.len());
        for row in &rows {
            let id: i64 = row[2].trim_start_matches("Task ").parse().unwrap();
            let stored = entries.iter().find(|e| e.id == id).unwrap();
            assert_eq!(row[5], format_duration(stored.duration_secs));
        }
    }

    #[test]
    fn export_orders_newest_first_with_sequence_numbers() {
        let entries = vec![
            entry(1, 60, "2025-01-14", "10:00", None),
            entry(2, 60, "2025-01-15", "09:00", None),
            entry(3, 60, "2025-01-15", "18:30", Some("wrap-up")),
        ];

        let (_, rows) = parse(&export_csv(&entries).unwrap());

        let order: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r[0].as_str(), r[2].as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("1", "Task 3"), ("2", "Task 2"), ("3", "Task 1")]
        );
        assert_eq!(rows[0][6], "wrap-up");
        assert_eq!(rows[1][6], "");
    }

    #[test]
    fn derived_start_may_precede_midnight() {
        let entries = vec![entry(1, 1_800, "2025-01-15", "00:10", None)];

        let (_, rows) = parse(&export_csv(&entries).unwrap());

        // The date stays the start date while the start clock wraps back.
        assert_eq!(rows[0][1], "2025-01-15");
        assert_eq!(rows[0][3], "23:40");
        assert_eq!(rows[0][4], "00:10");
    }

    #[test]
    fn export_of_no_entries_is_header_only() {
        let (header, rows) = parse(&export_csv(&[]).unwrap());
        assert_eq!(header.len(), 7);
        assert!(rows.is_empty());
    }

    #[test]
    fn filename_contains_date() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(export_filename(today), "timesheet_2025-04-01.csv");
    }
}
