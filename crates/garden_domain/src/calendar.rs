use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: usize = 7;

/// One position of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
}

/// Lays a month out on a seven column grid, padding the first and last row
/// with days from the neighbouring months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarGridBuilder {
    week_start: Weekday,
}

impl Default for CalendarGridBuilder {
    fn default() -> Self {
        Self::new(Weekday::Sun)
    }
}

impl CalendarGridBuilder {
    pub fn new(week_start: Weekday) -> Self {
        Self { week_start }
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// Column of `date` counted from 1, where 1 is the configured week start.
    pub fn weekday_index(&self, date: NaiveDate) -> u32 {
        let from_monday = date.weekday().num_days_from_monday();
        let start = self.week_start.num_days_from_monday();
        (from_monday + 7 - start) % 7 + 1
    }

    pub fn build(&self, reference: NaiveDate) -> MonthGrid {
        let first = first_of_month(reference);
        let last = last_of_month(reference);
        let leading = self.weekday_index(first) - 1;
        let trailing = DAYS_PER_WEEK as u32 - self.weekday_index(last);

        let mut cells = Vec::with_capacity(
            leading as usize + last.day() as usize + trailing as usize,
        );
        for back in (1..=leading).rev() {
            if let Some(date) = first.checked_sub_days(Days::new(u64::from(back))) {
                cells.push(CalendarCell {
                    date,
                    in_current_month: false,
                });
            }
        }
        cells.extend(
            first
                .iter_days()
                .take_while(|date| *date <= last)
                .map(|date| CalendarCell {
                    date,
                    in_current_month: true,
                }),
        );
        // A month ending on the last column gets no spill-over row.
        if trailing > 0 {
            cells.extend(
                last.iter_days()
                    .skip(1)
                    .take(trailing as usize)
                    .map(|date| CalendarCell {
                        date,
                        in_current_month: false,
                    }),
            );
        }

        tracing::trace!(month = %first, cells = cells.len(), "built month grid");
        MonthGrid {
            month: first,
            week_start: self.week_start,
            cells,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    month: NaiveDate,
    week_start: Weekday,
    cells: Vec<CalendarCell>,
}

impl MonthGrid {
    /// First day of the displayed month.
    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn cells(&self) -> &[CalendarCell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<CalendarCell> {
        self.cells
    }

    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    pub fn title(&self) -> String {
        self.month.format("%B %Y").to_string()
    }

    pub fn weekday_headers(&self) -> [Weekday; DAYS_PER_WEEK] {
        let mut headers = [self.week_start; DAYS_PER_WEEK];
        for idx in 1..DAYS_PER_WEEK {
            headers[idx] = headers[idx - 1].succ();
        }
        headers
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|cell| cell.date == date)
    }

    pub fn previous(&self) -> MonthGrid {
        CalendarGridBuilder::new(self.week_start).build(shift_month(self.month, -1))
    }

    pub fn next(&self) -> MonthGrid {
        CalendarGridBuilder::new(self.week_start).build(shift_month(self.month, 1))
    }
}

/// Moves `date` by `months`, clamping the day to the target month's length.
/// Dates that would leave chrono's range are returned unchanged.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let total_months =
        i64::from(date.year()) * 12 + i64::from(date.month0()) + i64::from(months);
    let Ok(target_year) = i32::try_from(total_months.div_euclid(12)) else {
        return date;
    };
    let target_month = (total_months.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(target_year, target_month));
    NaiveDate::from_ymd_opt(target_year, target_month, day).unwrap_or(date)
}

/// Length of `month` in `year`, read off the day before the next month starts.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year.saturating_add(1), 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(days_in_month(date.year(), date.month()))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_grid_shape(grid: &MonthGrid, reference: NaiveDate) {
        let cells = grid.cells();
        assert!(!cells.is_empty());
        assert_eq!(cells.len() % DAYS_PER_WEEK, 0, "grid for {reference}");
        assert_eq!(
            cells.iter().filter(|cell| cell.date == reference).count(),
            1
        );
        for pair in cells.windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
        for cell in cells {
            let same_month =
                cell.date.year() == reference.year() && cell.date.month() == reference.month();
            assert_eq!(cell.in_current_month, same_month, "cell {}", cell.date);
        }
        let month_days = cells.iter().filter(|cell| cell.in_current_month).count() as u32;
        assert_eq!(month_days, days_in_month(reference.year(), reference.month()));
    }

    #[test]
    fn march_2024_starting_on_friday() {
        let grid = CalendarGridBuilder::new(Weekday::Sun).build(date(2024, 3, 1));
        let cells = grid.cells();
        assert_grid_shape(&grid, date(2024, 3, 1));

        let leading: Vec<NaiveDate> = cells
            .iter()
            .take_while(|cell| !cell.in_current_month)
            .map(|cell| cell.date)
            .collect();
        assert_eq!(leading.first(), Some(&date(2024, 2, 25)));
        assert_eq!(leading.last(), Some(&date(2024, 2, 29)));
        assert_eq!(leading.len(), 5);

        let trailing: Vec<NaiveDate> = cells
            .iter()
            .rev()
            .take_while(|cell| !cell.in_current_month)
            .map(|cell| cell.date)
            .collect();
        assert_eq!(trailing.len(), 6);
        assert_eq!(cells.last().map(|cell| cell.date), Some(date(2024, 4, 6)));
        assert_eq!(cells.len(), 42);
        assert_eq!(grid.title(), "March 2024");
    }

    #[test]
    fn month_ending_on_last_column_has_no_trailing_days() {
        // February 2026 runs Sunday 1st to Saturday 28th.
        let grid = CalendarGridBuilder::new(Weekday::Sun).build(date(2026, 2, 14));
        assert_grid_shape(&grid, date(2026, 2, 14));
        assert_eq!(grid.cells().len(), 28);
        assert!(grid.cells().iter().all(|cell| cell.in_current_month));

        // August 2024 ends on a Saturday but starts mid-week.
        let grid = CalendarGridBuilder::new(Weekday::Sun).build(date(2024, 8, 31));
        assert_eq!(grid.cells().last().map(|cell| cell.date), Some(date(2024, 8, 31)));
    }

    #[test]
    fn monday_start_shifts_columns() {
        let builder = CalendarGridBuilder::new(Weekday::Mon);
        assert_eq!(builder.weekday_index(date(2024, 3, 4)), 1);
        assert_eq!(builder.weekday_index(date(2024, 3, 3)), 7);

        let grid = builder.build(date(2024, 3, 15));
        assert_grid_shape(&grid, date(2024, 3, 15));
        assert_eq!(grid.cells()[0].date, date(2024, 2, 26));
        assert_eq!(grid.weekday_headers()[0], Weekday::Mon);
        assert_eq!(grid.weekday_headers()[6], Weekday::Sun);
    }

    #[test]
    fn handles_year_boundaries_and_leap_februaries() {
        let builder = CalendarGridBuilder::default();
        for reference in [
            date(2023, 12, 31),
            date(2024, 1, 1),
            date(2024, 2, 29),
            date(2023, 2, 1),
            date(2000, 2, 10),
            date(1900, 2, 10),
        ] {
            let grid = builder.build(reference);
            assert_grid_shape(&grid, reference);
            for week in grid.weeks() {
                assert_eq!(week.len(), DAYS_PER_WEEK);
                assert_eq!(builder.weekday_index(week[0].date), 1);
            }
        }
    }

    #[test]
    fn every_day_of_a_year_yields_a_whole_grid() {
        let builder = CalendarGridBuilder::new(Weekday::Wed);
        for reference in date(2024, 1, 1).iter_days().take(366) {
            assert_grid_shape(&builder.build(reference), reference);
        }
    }

    #[test]
    fn navigation_moves_between_months() {
        let grid = CalendarGridBuilder::default().build(date(2024, 12, 10));
        assert_eq!(grid.next().month(), date(2025, 1, 1));
        assert_eq!(grid.previous().month(), date(2024, 11, 1));
        assert_eq!(grid.next().previous(), grid);
    }

    #[test]
    fn shift_month_clamps_day() {
        assert_eq!(shift_month(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(shift_month(date(2023, 1, 31), 1), date(2023, 2, 28));
        assert_eq!(shift_month(date(2024, 3, 31), -1), date(2024, 2, 29));
        assert_eq!(shift_month(date(2024, 1, 15), -13), date(2022, 12, 15));
        assert_eq!(shift_month(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn shift_month_survives_extreme_offsets() {
        let reference = date(2024, 1, 15);
        assert_eq!(shift_month(reference, i32::MAX), reference);
        assert_eq!(shift_month(reference, i32::MIN), reference);
        assert_eq!(shift_month(NaiveDate::MIN, -1), NaiveDate::MIN);
    }

    #[test]
    fn month_lengths_follow_leap_rules() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(NaiveDate::MAX.year(), 12), 31);
    }
}
