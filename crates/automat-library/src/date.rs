//! Calendar dates.

use std::cmp::Ordering;
use std::fmt;

use automat_core::{Automat, LocationId, Object};

/// A calendar date written as `YYYY-MM-DD`.
///
/// Only the shape of the text is checked; `2014-02-31` is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

impl Date {
    /// Creates a date from its parts.
    pub fn new(year: u16, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Parses `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        let digits = |range: std::ops::Range<usize>| -> Option<u16> {
            let part = &text[range];
            if !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse().ok()
        };
        Some(Self {
            year: digits(0..4)?,
            month: u8::try_from(digits(5..7)?).ok()?,
            day: u8::try_from(digits(8..10)?).ok()?,
        })
    }

    /// Year part.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Month part.
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day part.
    pub fn day(&self) -> u8 {
        self.day
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Object for Date {
    fn name(&self) -> &str {
        "Date"
    }

    fn clone_object(&self, _rt: &Automat) -> Box<dyn Object> {
        Box::new(*self)
    }

    fn text(&self, _rt: &Automat, _here: LocationId) -> String {
        self.to_string()
    }

    fn set_text(&mut self, rt: &mut Automat, here: LocationId, text: &str) {
        match Date::parse(text) {
            Some(date) => {
                *self = date;
                rt.clear_error(here);
            }
            None => {
                rt.report_error(
                    here,
                    format!(
                        "Invalid date format. The Date object expects dates in the format YYYY-MM-DD. The provided date was: {text}."
                    ),
                );
            }
        }
    }

    fn compare(
        &self,
        _rt: &Automat,
        _here: LocationId,
        other: &dyn Object,
        _other_here: LocationId,
    ) -> Option<Ordering> {
        other.as_any().downcast_ref::<Date>().map(|other| self.cmp(other))
    }
}
