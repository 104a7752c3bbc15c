//! In-memory sales table.
//!
//! A `Dataset` is built once at startup and never mutated afterwards; every
//! query borrows it immutably, so one instance can be shared by any number of
//! sessions (wrap it in an `Arc` when threads are involved).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::AddAssign;

use crate::dimension::{Dimension, Region};
use crate::error::DataError;

/// Placeholder stored for missing categorical values.
pub const MISSING: &str = "none";

/// Sales figures in millions of units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sales {
    pub north_america: f64,
    pub europe: f64,
    pub japan: f64,
    pub others: f64,
    pub global: f64,
}

impl Sales {
    pub fn new(north_america: f64, europe: f64, japan: f64, others: f64, global: f64) -> Self {
        Self {
            north_america,
            europe,
            japan,
            others,
            global,
        }
    }

    /// Regional figures with `global` set to their sum.
    pub fn from_regions(north_america: f64, europe: f64, japan: f64, others: f64) -> Self {
        Self::new(
            north_america,
            europe,
            japan,
            others,
            north_america + europe + japan + others,
        )
    }

    pub fn get(&self, region: Region) -> f64 {
        match region {
            Region::NorthAmerica => self.north_america,
            Region::Europe => self.europe,
            Region::Japan => self.japan,
            Region::Others => self.others,
            Region::Global => self.global,
        }
    }
}

impl AddAssign for Sales {
    fn add_assign(&mut self, rhs: Self) {
        self.north_america += rhs.north_america;
        self.europe += rhs.europe;
        self.japan += rhs.japan;
        self.others += rhs.others;
        self.global += rhs.global;
    }
}

/// Inclusive year interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(a: i32, b: i32) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    /// Clamps both ends into `bounds`. A range entirely outside `bounds`
    /// collapses onto the nearest bound year.
    pub fn clamp_to(&self, bounds: YearRange) -> YearRange {
        let min = self.min.clamp(bounds.min, bounds.max);
        let max = self.max.clamp(bounds.min, bounds.max);
        YearRange { min, max }
    }

    pub fn is_within(&self, bounds: YearRange) -> bool {
        bounds.min <= self.min && self.max <= bounds.max
    }
}

/// One title on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub name: String,
    pub platform: String,
    pub company: String,
    pub publisher: String,
    pub genre: String,
    pub console: String,
    pub year: i32,
    pub sales: Sales,
}

impl SalesRecord {
    pub fn value(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Platform => &self.platform,
            Dimension::Company => &self.company,
            Dimension::Publisher => &self.publisher,
            Dimension::Genre => &self.genre,
            Dimension::Console => &self.console,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<SalesRecord>,
    bounds: YearRange,
    distinct: [Vec<String>; 5],
}

impl Dataset {
    /// Wraps already-cleaned records. Fails only when `rows` is empty, since a
    /// dataset without rows has no year bounds.
    pub fn new(rows: Vec<SalesRecord>) -> Result<Self, DataError> {
        let first = rows.first().ok_or(DataError::NoRows)?.year;
        let bounds = rows.iter().fold(YearRange::new(first, first), |acc, r| YearRange {
            min: acc.min.min(r.year),
            max: acc.max.max(r.year),
        });
        let distinct = Dimension::ALL.map(|dim| {
            rows.iter()
                .map(|r| r.value(dim))
                .collect::<BTreeSet<&str>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        });
        Ok(Self {
            rows,
            bounds,
            distinct,
        })
    }

    pub fn rows(&self) -> &[SalesRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Observed `[min, max]` year over all rows.
    pub fn year_bounds(&self) -> YearRange {
        self.bounds
    }

    /// Sorted distinct values of `dimension` over the unfiltered table.
    pub fn distinct_values(&self, dimension: Dimension) -> &[String] {
        &self.distinct[dimension.index()]
    }

    pub fn contains_value(&self, dimension: Dimension, value: &str) -> bool {
        self.distinct_values(dimension)
            .binary_search_by(|v| v.as_str().cmp(value))
            .is_ok()
    }

    /// Sum of all sales inside `years`, ignoring categorical filters.
    pub fn totals_in(&self, years: YearRange) -> Sales {
        let mut total = Sales::default();
        for row in self.rows.iter().filter(|r| years.contains(r.year)) {
            total += row.sales;
        }
        total
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(
        platform: &str,
        company: &str,
        publisher: &str,
        genre: &str,
        console: &str,
        year: i32,
        sales: Sales,
    ) -> SalesRecord {
        SalesRecord {
            name: format!("{platform}-{genre}-{year}"),
            platform: platform.to_string(),
            company: company.to_string(),
            publisher: publisher.to_string(),
            genre: genre.to_string(),
            console: console.to_string(),
            year,
            sales,
        }
    }

    /// Small table with enough overlap to exercise cross-filtering.
    pub fn small() -> Dataset {
        Dataset::new(vec![
            record("PS4", "Sony", "EA", "Sports", "Home", 2015, Sales::from_regions(2.0, 1.5, 0.2, 0.3)),
            record("PS4", "Sony", "Ubisoft", "Action", "Home", 2016, Sales::from_regions(1.0, 1.0, 0.5, 0.5)),
            record("XOne", "Microsoft", "EA", "Sports", "Home", 2015, Sales::from_regions(1.5, 0.5, 0.0, 0.0)),
            record("3DS", "Nintendo", "Nintendo", "Action", "Handheld", 2013, Sales::from_regions(1.0, 1.0, 3.0, 0.0)),
            record("PSV", "Sony", "Ubisoft", "Action", "Handheld", 2013, Sales::from_regions(0.2, 0.2, 0.5, 0.1)),
            record("Wii", "Nintendo", "Nintendo", "Sports", "Home", 2008, Sales::from_regions(4.0, 3.0, 1.0, 1.0)),
        ])
        .unwrap()
    }
}
