//! Keyboards shown to users.

use chrono::Datelike;
use tb_core::calendar::{self, CalendarCell, MonthCursor};
use tb_core::Timezone;

use crate::intent::{self, Callback};
use crate::messenger::{InlineButton, Keyboard};

fn reply(rows: &[&[&str]]) -> Keyboard {
    Keyboard::Reply(
        rows.iter()
            .map(|row| row.iter().map(|label| (*label).to_string()).collect())
            .collect(),
    )
}

pub fn main_menu() -> Keyboard {
    reply(&[
        &[intent::START, intent::STOP],
        &[intent::TODAY, intent::REPORTS],
        &[intent::TIMEZONE],
    ])
}

pub fn reports_menu() -> Keyboard {
    reply(&[
        &[intent::TODAY, intent::BY_DATE],
        &[intent::ENTER_DATE, intent::BY_TASK],
        &[intent::CSV_EXPORT],
        &[intent::BACK],
    ])
}

pub fn yes_no() -> Keyboard {
    reply(&[&[intent::YES, intent::NO]])
}

pub fn cancel_only() -> Keyboard {
    reply(&[&[intent::CANCEL]])
}

/// Quick picks for the most common timezones plus "other" and "skip".
pub fn timezone_choice() -> Keyboard {
    let quick = [
        Timezone::Kaliningrad,
        Timezone::Moscow,
        Timezone::Yekaterinburg,
        Timezone::Novosibirsk,
    ];
    let mut rows: Vec<Vec<String>> = quick
        .chunks(2)
        .map(|pair| pair.iter().map(|tz| tz.label()).collect())
        .collect();
    rows.push(vec![intent::OTHER.to_string(), intent::SKIP.to_string()]);
    Keyboard::Reply(rows)
}

fn button(text: impl Into<String>, callback: Callback) -> InlineButton {
    InlineButton {
        text: text.into(),
        data: callback.encode(),
    }
}

/// Inline date picker for a month.
pub fn calendar(month: MonthCursor) -> Keyboard {
    let grid = calendar::build(month);
    let rows = grid
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    CalendarCell::Prev(target) => button("«", Callback::CalendarNavigate(*target)),
                    CalendarCell::Next(target) => button("»", Callback::CalendarNavigate(*target)),
                    CalendarCell::Title(title) => button(title.clone(), Callback::Noop),
                    CalendarCell::Blank => button(" ", Callback::Noop),
                    CalendarCell::Day(day) => button(day.day().to_string(), Callback::CalendarDay(*day)),
                    CalendarCell::Cancel => button(intent::CANCEL, Callback::CalendarCancel),
                })
                .collect()
        })
        .collect();
    Keyboard::Inline(rows)
}

/// Inline list of task labels, one per row.
pub fn task_list(labels: &[String]) -> Keyboard {
    Keyboard::Inline(
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| vec![button(label.clone(), Callback::TaskPick(index))])
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_buttons_encode_callbacks() {
        let Keyboard::Inline(rows) = calendar(MonthCursor::new(2024, 12).unwrap()) else {
            panic!("calendar must be inline");
        };
        assert_eq!(rows[0][0].data, "cal:nav:2024-11");
        assert_eq!(rows[0][1].text, "December 2024");
        assert_eq!(rows[0][2].data, "cal:nav:2025-01");
        assert_eq!(rows.last().unwrap()[0].data, "cal:cancel");
        let days: Vec<&InlineButton> = rows
            .iter()
            .flatten()
            .filter(|b| b.data.starts_with("cal:day:"))
            .collect();
        assert_eq!(days.len(), 31);
        assert_eq!(days[0].text, "1");
        assert_eq!(days[0].data, "cal:day:2024-12-01");
    }

    #[test]
    fn task_list_uses_indices() {
        let Keyboard::Inline(rows) = task_list(&["Docs".to_string(), "Review".to_string()]) else {
            panic!("task list must be inline");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0].text, "Review");
        assert_eq!(rows[1][0].data, "task:1");
    }

    #[test]
    fn timezone_choice_offers_other_and_skip() {
        let Keyboard::Reply(rows) = timezone_choice() else {
            panic!("timezone choice must be a reply keyboard");
        };
        assert_eq!(rows[0][1], "Moscow (UTC+3)");
        assert_eq!(rows.last().unwrap(), &vec![intent::OTHER.to_string(), intent::SKIP.to_string()]);
    }
}
