//! Electoral term calendar
//!
//! Start and end dates of the Bundestag's electoral terms. Used to check
//! that a sitting date is consistent with the term encoded in its session id.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

type Ymd = (i32, u32, u32);

/// One electoral term with inclusive start and end day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElectoralTerm {
    pub number: u32,
    start: Ymd,
    end: Ymd,
}

impl ElectoralTerm {
    const fn new(number: u32, start: Ymd, end: Ymd) -> Self {
        Self { number, start, end }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.start.0, self.start.1, self.start.2)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.end.0, self.end.1, self.end.2)
    }

    /// Whether `date` lies within the term, both ends inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        let key = (date.year(), date.month(), date.day());
        self.start <= key && key <= self.end
    }
}

/// Terms 1 to 20
pub const ELECTORAL_TERMS: [ElectoralTerm; 20] = [
    ElectoralTerm::new(1, (1949, 9, 7), (1953, 10, 5)),
    ElectoralTerm::new(2, (1953, 10, 6), (1957, 10, 14)),
    ElectoralTerm::new(3, (1957, 10, 15), (1961, 10, 16)),
    ElectoralTerm::new(4, (1961, 10, 17), (1965, 10, 18)),
    ElectoralTerm::new(5, (1965, 10, 19), (1969, 10, 19)),
    ElectoralTerm::new(6, (1969, 10, 20), (1972, 12, 12)),
    ElectoralTerm::new(7, (1972, 12, 13), (1976, 12, 13)),
    ElectoralTerm::new(8, (1976, 12, 14), (1980, 11, 3)),
    ElectoralTerm::new(9, (1980, 11, 4), (1983, 3, 28)),
    ElectoralTerm::new(10, (1983, 3, 29), (1987, 2, 17)),
    ElectoralTerm::new(11, (1987, 2, 18), (1990, 12, 19)),
    ElectoralTerm::new(12, (1990, 12, 20), (1994, 11, 9)),
    ElectoralTerm::new(13, (1994, 11, 10), (1998, 10, 25)),
    ElectoralTerm::new(14, (1998, 10, 26), (2002, 10, 16)),
    ElectoralTerm::new(15, (2002, 10, 17), (2005, 10, 17)),
    ElectoralTerm::new(16, (2005, 10, 18), (2009, 10, 26)),
    ElectoralTerm::new(17, (2009, 10, 27), (2013, 10, 21)),
    ElectoralTerm::new(18, (2013, 10, 22), (2017, 10, 23)),
    ElectoralTerm::new(19, (2017, 10, 24), (2021, 10, 26)),
    ElectoralTerm::new(20, (2021, 10, 27), (2025, 10, 29)),
];

/// Term in session on `date`, if any
pub fn term_for_date(date: NaiveDate) -> Option<u32> {
    ELECTORAL_TERMS
        .iter()
        .find(|term| term.contains(date))
        .map(|term| term.number)
}
