//! Cross-filter resolution for the dropdown options.
//!
//! Each dimension's options are narrowed by the year range and by the
//! selections on the *other* four dimensions. A dimension's own selection is
//! never applied to itself.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::dataset::{Dataset, YearRange};
use crate::dimension::Dimension;
use crate::logging::{v_str, ProfileScope};
use crate::state::{Selection, SelectionState};

/// Options that remain selectable for `dimension`, sorted ascending
/// (byte-wise, case-sensitive).
///
/// Never includes a value without at least one row matching the year range
/// and the other dimensions' selections. An empty vector is a valid answer
/// when those filters exclude each other.
pub fn available_options(
    dataset: &Dataset,
    dimension: Dimension,
    selection: &Selection,
    years: YearRange,
) -> Vec<String> {
    let _scope = ProfileScope::with_context("resolver", "available_options", &[("dimension", v_str(dimension.as_str()))]);

    let bounds = dataset.year_bounds();
    let unconstrained = bounds.is_within(years) && dimension.others().all(|d| selection.get(d).is_empty());
    if unconstrained {
        return dataset.distinct_values(dimension).to_vec();
    }

    dataset
        .rows()
        .iter()
        .filter(|row| years.contains(row.year))
        .filter(|row| selection.matches_except(row, Some(dimension)))
        .map(|row| row.value(dimension))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Options for all five dimensions, each resolved independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSets {
    #[serde(rename = "Platform")]
    pub platform: Vec<String>,
    #[serde(rename = "Company")]
    pub company: Vec<String>,
    #[serde(rename = "Publisher")]
    pub publisher: Vec<String>,
    #[serde(rename = "Genre")]
    pub genre: Vec<String>,
    #[serde(rename = "Console")]
    pub console: Vec<String>,
}

impl OptionSets {
    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::Platform => &self.platform,
            Dimension::Company => &self.company,
            Dimension::Publisher => &self.publisher,
            Dimension::Genre => &self.genre,
            Dimension::Console => &self.console,
        }
    }
}

pub fn all_options(dataset: &Dataset, state: &SelectionState) -> OptionSets {
    let resolve = |dim| available_options(dataset, dim, &state.selection, state.years);
    OptionSets {
        platform: resolve(Dimension::Platform),
        company: resolve(Dimension::Company),
        publisher: resolve(Dimension::Publisher),
        genre: resolve(Dimension::Genre),
        console: resolve(Dimension::Console),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::small;

    #[test]
    fn test_unfiltered_returns_all_distinct() {
        let ds = small();
        let opts = available_options(&ds, Dimension::Platform, &Selection::default(), ds.year_bounds());
        assert_eq!(opts, ["3DS", "PS4", "PSV", "Wii", "XOne"]);
    }

    #[test]
    fn test_range_wider_than_bounds_is_unfiltered() {
        let ds = small();
        let opts = available_options(&ds, Dimension::Genre, &Selection::default(), YearRange::new(1900, 2100));
        assert_eq!(opts, ds.distinct_values(Dimension::Genre));
        let narrow = available_options(&ds, Dimension::Genre, &Selection::default(), YearRange::new(2008, 2013));
        assert_eq!(narrow, ["Action", "Sports"]);
    }

    #[test]
    fn test_other_dimensions_narrow() {
        let ds = small();
        let sel = Selection::default().with(Dimension::Company, ["Sony"]);
        let opts = available_options(&ds, Dimension::Platform, &sel, ds.year_bounds());
        assert_eq!(opts, ["PS4", "PSV"]);
    }

    #[test]
    fn test_own_selection_ignored() {
        let ds = small();
        let sel = Selection::default().with(Dimension::Platform, ["Wii"]);
        let opts = available_options(&ds, Dimension::Platform, &sel, ds.year_bounds());
        assert_eq!(opts.len(), 5);
        let genres = available_options(&ds, Dimension::Genre, &sel, ds.year_bounds());
        assert_eq!(genres, ["Sports"]);
    }

    #[test]
    fn test_conjunctive_across_dimensions() {
        let ds = small();
        let sel = Selection::default()
            .with(Dimension::Company, ["Sony"])
            .with(Dimension::Console, ["Handheld"]);
        let opts = available_options(&ds, Dimension::Platform, &sel, ds.year_bounds());
        assert_eq!(opts, ["PSV"]);
    }

    #[test]
    fn test_year_range_narrows() {
        let ds = small();
        let opts = available_options(&ds, Dimension::Platform, &Selection::default(), YearRange::new(2015, 2016));
        assert_eq!(opts, ["PS4", "XOne"]);
    }

    #[test]
    fn test_contradictory_filters_yield_empty() {
        let ds = small();
        let sel = Selection::default()
            .with(Dimension::Company, ["Microsoft"])
            .with(Dimension::Console, ["Handheld"]);
        assert!(available_options(&ds, Dimension::Genre, &sel, ds.year_bounds()).is_empty());
    }

    #[test]
    fn test_all_options_symmetric() {
        let ds = small();
        let st = SelectionState::initial(&ds, Dimension::Platform)
            .with_selection(Selection::default().with(Dimension::Genre, ["Action"]));
        let all = all_options(&ds, &st);
        for dim in Dimension::ALL {
            assert_eq!(all.get(dim), available_options(&ds, dim, &st.selection, st.years).as_slice());
        }
        assert_eq!(all.genre, ["Action", "Sports"]);
    }
}
