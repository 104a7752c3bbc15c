//! Aggregation and projection of the filtered rows for display.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::dataset::{Dataset, Sales, SalesRecord, YearRange};
use crate::dimension::{Dimension, Region};
use crate::logging::{self, v_str, ProfileScope};
use crate::state::{Selection, SelectionState};

/// Regional sums for one value of the grouping key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub sales: Sales,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: i32,
    pub global: f64,
}

/// Global sales per year for one value of the grouping key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub key: String,
    pub points: Vec<YearPoint>,
}

/// Set when the filtered rows cover exactly one year; a single point cannot
/// be drawn as a line and is shown as an annotated marker instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendMarker {
    pub year: i32,
    pub key: String,
    pub global: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Trend {
    pub series: Vec<TrendSeries>,
    pub marker: Option<TrendMarker>,
}

/// Percent of the period's sales covered by the selection, one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Shares {
    pub north_america: f64,
    pub europe: f64,
    pub japan: f64,
    pub others: f64,
    pub global: f64,
}

impl Shares {
    pub fn get(&self, region: Region) -> f64 {
        match region {
            Region::NorthAmerica => self.north_america,
            Region::Europe => self.europe,
            Region::Japan => self.japan,
            Region::Others => self.others,
            Region::Global => self.global,
        }
    }

    fn between(selected: &Sales, period: &Sales) -> Self {
        let share = |r| percent(selected.get(r), period.get(r));
        Self {
            north_america: share(Region::NorthAmerica),
            europe: share(Region::Europe),
            japan: share(Region::Japan),
            others: share(Region::Others),
            global: share(Region::Global),
        }
    }
}

/// `part / whole * 100` rounded half away from zero to one decimal; zero
/// when `whole` is not positive.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round1(part / whole * 100.0)
    } else {
        0.0
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTitle {
    pub rank: usize,
    pub name: String,
    pub platform: String,
    pub genre: String,
    pub global: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingPage {
    /// Zero-based.
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total_rows: usize,
    pub entries: Vec<RankedTitle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult<'a> {
    pub grouping: Dimension,
    pub years: YearRange,
    pub rows: Vec<&'a SalesRecord>,
    /// Sums over `rows`.
    pub totals: Sales,
    /// Sums over the year range with no categorical filter; share denominator.
    pub period_totals: Sales,
    /// Sorted by global sales, descending; ties by key ascending.
    pub grouped: Vec<GroupTotal>,
    pub trend: Trend,
    pub shares: Shares,
    /// No row matched; every sum and share is zero.
    pub empty: bool,
}

impl<'a> AggregationResult<'a> {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows ordered by global sales (descending, then name, then table order)
    /// and cut to one page. A `page_size` of zero is treated as one.
    pub fn ranking(&self, page: usize, page_size: usize) -> RankingPage {
        let page_size = page_size.max(1);
        let mut ordered: Vec<&SalesRecord> = self.rows.clone();
        ordered.sort_by(|a, b| {
            b.sales
                .global
                .total_cmp(&a.sales.global)
                .then_with(|| a.name.cmp(&b.name))
        });

        let total_rows = ordered.len();
        let page_count = total_rows.div_ceil(page_size);
        let start = page.saturating_mul(page_size);
        let entries = ordered
            .into_iter()
            .enumerate()
            .skip(start)
            .take(page_size)
            .map(|(i, row)| RankedTitle {
                rank: i + 1,
                name: row.name.clone(),
                platform: row.platform.clone(),
                genre: row.genre.clone(),
                global: row.sales.global,
            })
            .collect();

        RankingPage {
            page,
            page_size,
            page_count,
            total_rows,
            entries,
        }
    }
}

/// Applies all five selections and the year range, then derives the grouped
/// totals, trend and regional shares for `grouping`.
pub fn aggregate<'a>(
    dataset: &'a Dataset,
    selection: &Selection,
    years: YearRange,
    grouping: Dimension,
) -> AggregationResult<'a> {
    let _scope = ProfileScope::with_context("aggregate", "aggregate", &[("grouping", v_str(grouping.as_str()))]);

    let rows: Vec<&SalesRecord> = dataset
        .rows()
        .iter()
        .filter(|r| selection.matches(r))
        .filter(|r| years.contains(r.year))
        .collect();

    let mut totals = Sales::default();
    for row in &rows {
        totals += row.sales;
    }
    let period_totals = dataset.totals_in(years);
    let empty = rows.is_empty();
    if empty {
        let selected: usize = Dimension::ALL.iter().map(|d| selection.get(*d).len()).sum();
        logging::log_empty_selection(selected, years.min, years.max);
    }

    AggregationResult {
        grouping,
        years,
        grouped: group_totals(&rows, grouping),
        trend: trend(&rows, grouping),
        shares: if empty { Shares::default() } else { Shares::between(&totals, &period_totals) },
        totals,
        period_totals,
        rows,
        empty,
    }
}

pub fn aggregate_state<'a>(dataset: &'a Dataset, state: &SelectionState) -> AggregationResult<'a> {
    aggregate(dataset, &state.selection, state.years, state.grouping)
}

fn group_totals(rows: &[&SalesRecord], grouping: Dimension) -> Vec<GroupTotal> {
    let mut by_key: BTreeMap<&str, Sales> = BTreeMap::new();
    for row in rows {
        *by_key.entry(row.value(grouping)).or_default() += row.sales;
    }
    let mut grouped: Vec<GroupTotal> = by_key
        .into_iter()
        .map(|(key, sales)| GroupTotal {
            key: key.to_string(),
            sales,
        })
        .collect();
    // stable: equal totals keep the ascending key order from the map
    grouped.sort_by(|a, b| b.sales.global.total_cmp(&a.sales.global));
    grouped
}

fn trend(rows: &[&SalesRecord], grouping: Dimension) -> Trend {
    let mut cells: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    let mut years = BTreeSet::new();
    for row in rows {
        *cells.entry((row.value(grouping), row.year)).or_default() += row.sales.global;
        years.insert(row.year);
    }

    let mut series: Vec<TrendSeries> = Vec::new();
    for ((key, year), global) in cells {
        match series.last_mut() {
            Some(s) if s.key == key => s.points.push(YearPoint { year, global }),
            _ => series.push(TrendSeries {
                key: key.to_string(),
                points: vec![YearPoint { year, global }],
            }),
        }
    }

    let marker = match (years.len(), series.first()) {
        (1, Some(first)) => first.points.first().map(|p| TrendMarker {
            year: p.year,
            key: first.key.clone(),
            global: p.global,
        }),
        _ => None,
    };

    Trend { series, marker }
}
