// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Situational facts: the current date plus operator-configured lines.

use chrono::NaiveDate;

/// The date line as it appears in the prompt.
pub fn date_line(today: NaiveDate) -> String {
    format!("Today's date is {}.", today.format("%A, %B %-d, %Y"))
}

/// Builds the situational segments in order: the date (if enabled), then each
/// non-blank extra line.
pub fn situational_lines(today: NaiveDate, include_date: bool, extra: &[String]) -> Vec<String> {
    let date = include_date.then(|| date_line(today));
    date.into_iter()
        .chain(
            extra
                .iter()
                .filter(|line| !line.trim().is_empty())
                .cloned(),
        )
        .collect()
}
