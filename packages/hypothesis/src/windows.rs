//! Time-Window Classifier.
//!
//! Derives the study calendar from the hurricane interval and the buffer
//! magnitudes, and labels individual dates against it.
//!
//! The "before" case window is `[start - cases_before, end]` and the
//! "after" window is `[end, end + cases_after]`: both contain the hurricane
//! end date.

use chrono::{Days, NaiveDate};
use hurricane_impact_exposure::ingest::is_weekday;
use hurricane_impact_exposure_models::{DateWindow, Observation};

use crate::{HypothesisError, config::WindowConfig};

/// The windows of one study.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyWindows {
    hurricane: DateWindow,
    mobility: DateWindow,
    before_cases: DateWindow,
    after_cases: DateWindow,
}

/// Labels of a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct WindowLabels {
    pub is_weekday: bool,
    pub in_hurricane_range: bool,
    pub in_mobility_range: bool,
    pub in_before_covid_window: bool,
    pub in_after_covid_window: bool,
}

impl WindowLabels {
    /// Control row: a weekday outside the hurricane window.
    #[must_use]
    pub const fn in_population(&self) -> bool {
        self.is_weekday && !self.in_hurricane_range
    }

    /// Treatment row: a weekday inside the hurricane window.
    #[must_use]
    pub const fn in_sample(&self) -> bool {
        self.is_weekday && self.in_hurricane_range
    }
}

impl StudyWindows {
    /// Builds the study windows around `hurricane`.
    ///
    /// # Errors
    ///
    /// Returns [`HypothesisError::InvalidWindow`] if the hurricane interval
    /// is reversed or a buffer runs off the supported calendar.
    pub fn new(hurricane: DateWindow, buffers: &WindowConfig) -> Result<Self, HypothesisError> {
        if hurricane.start > hurricane.end {
            return Err(HypothesisError::InvalidWindow {
                message: format!("hurricane window {hurricane} is reversed"),
            });
        }

        let mobility = DateWindow::new(
            shift_back(hurricane.start, buffers.mobility_buffer_days)?,
            shift_forward(hurricane.end, buffers.mobility_buffer_days)?,
        );
        let before_cases = DateWindow::new(
            shift_back(hurricane.start, buffers.cases_before_days)?,
            hurricane.end,
        );
        let after_cases = DateWindow::new(
            hurricane.end,
            shift_forward(hurricane.end, buffers.cases_after_days)?,
        );

        Ok(Self {
            hurricane,
            mobility,
            before_cases,
            after_cases,
        })
    }

    #[must_use]
    pub const fn hurricane(&self) -> DateWindow {
        self.hurricane
    }

    /// `[start - mobility_buffer, end + mobility_buffer]`.
    #[must_use]
    pub const fn mobility(&self) -> DateWindow {
        self.mobility
    }

    #[must_use]
    pub const fn before_cases(&self) -> DateWindow {
        self.before_cases
    }

    #[must_use]
    pub const fn after_cases(&self) -> DateWindow {
        self.after_cases
    }

    /// Labels `date` against every window.
    #[must_use]
    pub fn classify(&self, date: NaiveDate) -> WindowLabels {
        self.labels(date, is_weekday(date))
    }

    /// Labels a panel row, trusting the weekday flag set at ingestion.
    #[must_use]
    pub fn classify_row(&self, row: &Observation) -> WindowLabels {
        self.labels(row.date, row.is_weekday)
    }

    fn labels(&self, date: NaiveDate, is_weekday: bool) -> WindowLabels {
        WindowLabels {
            is_weekday,
            in_hurricane_range: self.hurricane.contains(date),
            in_mobility_range: self.mobility.contains(date),
            in_before_covid_window: self.before_cases.contains(date),
            in_after_covid_window: self.after_cases.contains(date),
        }
    }

    /// Every date of the mobility range with its labels.
    pub fn calendar(&self) -> impl Iterator<Item = (NaiveDate, WindowLabels)> + '_ {
        self.mobility
            .days()
            .map(move |date| (date, self.classify(date)))
    }
}

fn shift_back(date: NaiveDate, days: u32) -> Result<NaiveDate, HypothesisError> {
    date.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| HypothesisError::InvalidWindow {
            message: format!("{date} minus {days} days is out of range"),
        })
}

fn shift_forward(date: NaiveDate, days: u32) -> Result<NaiveDate, HypothesisError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| HypothesisError::InvalidWindow {
            message: format!("{date} plus {days} days is out of range"),
        })
}
