//! Locates the quarter/year header rows of a summary sheet and the column for a period.

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{Grid, HeaderLocation, ReportingPeriod};
use crate::utils::char_set;

static QUARTER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\dQ|Q\d").unwrap());
static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderRows {
    pub quarter_row: usize,
    pub year_row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLookup {
    Found(HeaderLocation),
    HeaderNotFound,
    ColumnNotFound(HeaderRows),
}

impl HeaderLookup {
    pub fn location(&self) -> Option<HeaderLocation> {
        match self {
            HeaderLookup::Found(loc) => Some(*loc),
            _ => None,
        }
    }
}

fn count_matching(row: &[String], pattern: &Regex) -> usize {
    row.iter().filter(|cell| pattern.is_match(cell)).count()
}

/// The quarter row is the first row with several quarter-like cells; the year row must
/// be the row right after it.
pub fn find_header_rows(grid: &Grid) -> Option<HeaderRows> {
    let quarter_row = grid
        .rows()
        .position(|row| count_matching(row, &QUARTER_TOKEN) > 1)?;

    let Some(next) = grid.row(quarter_row + 1) else {
        debug!("Quarter header at row {} is the last row", quarter_row);
        return None;
    };

    let years = next
        .iter()
        .filter(|cell| YEAR_TOKEN.is_match(cell.trim()))
        .count();
    if years > 1 {
        Some(HeaderRows {
            quarter_row,
            year_row: quarter_row + 1,
        })
    } else {
        debug!(
            "Row {} after quarter header has {} year cell(s), expected several",
            quarter_row + 1,
            years
        );
        None
    }
}

/// Quarter cells compare by character set, so "3Q" and "Q3" are the same label.
pub fn column_matches(quarter_cell: &str, year_cell: &str, period: &ReportingPeriod) -> bool {
    char_set(&quarter_cell.trim().to_uppercase()) == char_set(&period.quarter.as_str().to_uppercase())
        && year_cell.trim() == period.year
}

pub fn find_period_column(grid: &Grid, rows: HeaderRows, period: &ReportingPeriod) -> Option<usize> {
    let width = grid.column_count();
    (0..width).find(|&col| {
        column_matches(
            grid.cell(rows.quarter_row, col),
            grid.cell(rows.year_row, col),
            period,
        )
    })
}

/// Finds the header pair and the column holding `period`.
pub fn locate(grid: &Grid, period: &ReportingPeriod) -> HeaderLookup {
    let Some(rows) = find_header_rows(grid) else {
        info!("No quarter/year header rows found in sheet");
        return HeaderLookup::HeaderNotFound;
    };

    match find_period_column(grid, rows, period) {
        Some(column) => {
            info!(
                "Header rows {}/{}; column {} holds {}",
                rows.quarter_row, rows.year_row, column, period
            );
            HeaderLookup::Found(HeaderLocation {
                quarter_row_index: rows.quarter_row,
                year_row_index: rows.year_row,
                target_column_index: column,
            })
        }
        None => {
            info!("No column for {} under header rows {}/{}", period, rows.quarter_row, rows.year_row);
            HeaderLookup::ColumnNotFound(rows)
        }
    }
}
