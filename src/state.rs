use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dataset::{Dataset, SalesRecord, YearRange};
use crate::dimension::Dimension;

/// Selected values per dimension. An empty set means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    #[serde(rename = "Platform")]
    pub platform: BTreeSet<String>,
    #[serde(rename = "Company")]
    pub company: BTreeSet<String>,
    #[serde(rename = "Publisher")]
    pub publisher: BTreeSet<String>,
    #[serde(rename = "Genre")]
    pub genre: BTreeSet<String>,
    #[serde(rename = "Console")]
    pub console: BTreeSet<String>,
}

impl Selection {
    pub fn get(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Platform => &self.platform,
            Dimension::Company => &self.company,
            Dimension::Publisher => &self.publisher,
            Dimension::Genre => &self.genre,
            Dimension::Console => &self.console,
        }
    }

    pub fn get_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Platform => &mut self.platform,
            Dimension::Company => &mut self.company,
            Dimension::Publisher => &mut self.publisher,
            Dimension::Genre => &mut self.genre,
            Dimension::Console => &mut self.console,
        }
    }

    pub fn set<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.get_mut(dimension) = values.into_iter().map(Into::into).collect();
    }

    /// Builder-style `set`.
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(dimension, values);
        self
    }

    pub fn is_empty(&self) -> bool {
        Dimension::ALL.iter().all(|d| self.get(*d).is_empty())
    }

    /// True when `row` satisfies every non-empty selection except the one on
    /// `skip`. Passing `None` applies all five.
    pub fn matches_except(&self, row: &SalesRecord, skip: Option<Dimension>) -> bool {
        Dimension::ALL
            .iter()
            .filter(|d| Some(**d) != skip)
            .all(|d| {
                let wanted = self.get(*d);
                wanted.is_empty() || wanted.contains(row.value(*d))
            })
    }

    pub fn matches(&self, row: &SalesRecord) -> bool {
        self.matches_except(row, None)
    }

    /// Drops values that never occur in the unfiltered dataset.
    pub fn retain_known(&mut self, dataset: &Dataset) -> usize {
        let mut dropped = 0;
        for dim in Dimension::ALL {
            let set = self.get_mut(dim);
            let before = set.len();
            set.retain(|v| dataset.contains_value(dim, v));
            dropped += before - set.len();
        }
        dropped
    }
}

/// Everything a session controls: the five selections, the year slider and
/// the grouping key used by the charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selection: Selection,
    pub years: YearRange,
    pub grouping: Dimension,
}

impl SelectionState {
    /// Empty selections over the dataset's full year bounds.
    pub fn initial(dataset: &Dataset, grouping: Dimension) -> Self {
        Self {
            selection: Selection::default(),
            years: dataset.year_bounds(),
            grouping,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn with_grouping(mut self, grouping: Dimension) -> Self {
        self.grouping = grouping;
        self
    }

    /// Restores the state invariants against `dataset`: the year range is
    /// reordered and clamped into the observed bounds, and selected values
    /// absent from the dataset are removed. Returns the number of dropped
    /// values.
    pub fn sanitize(&mut self, dataset: &Dataset) -> usize {
        self.years = YearRange::new(self.years.min, self.years.max).clamp_to(dataset.year_bounds());
        self.selection.retain_known(dataset)
    }

    pub fn sanitized(mut self, dataset: &Dataset) -> Self {
        self.sanitize(dataset);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::small;

    #[test]
    fn test_initial_covers_full_bounds() {
        let ds = small();
        let st = SelectionState::initial(&ds, Dimension::Genre);
        assert_eq!(st.years, ds.year_bounds());
        assert!(st.selection.is_empty());
        assert_eq!(st.grouping, Dimension::Genre);
    }

    #[test]
    fn test_matches_except_skips_one_dimension() {
        let ds = small();
        let sel = Selection::default()
            .with(Dimension::Platform, ["Wii"])
            .with(Dimension::Genre, ["Sports"]);
        let ps4_sports = &ds.rows()[0];
        assert!(!sel.matches(ps4_sports));
        assert!(sel.matches_except(ps4_sports, Some(Dimension::Platform)));
        assert!(!sel.matches_except(ps4_sports, Some(Dimension::Genre)));
    }

    #[test]
    fn test_sanitize_clamps_and_drops_unknown() {
        let ds = small();
        let mut st = SelectionState::initial(&ds, Dimension::Platform)
            .with_selection(Selection::default().with(Dimension::Platform, ["PS4", "Dreamcast"]))
            .with_years(YearRange { min: 2020, max: 1990 });
        let dropped = st.sanitize(&ds);
        assert_eq!(dropped, 1);
        assert_eq!(st.years, ds.year_bounds());
        assert_eq!(st.selection.platform.len(), 1);
    }

    #[test]
    fn test_selection_deserializes_partial() {
        let sel: Selection = serde_json::from_str(r#"{"Genre": ["Action"]}"#).unwrap();
        assert!(sel.platform.is_empty());
        assert!(sel.genre.contains("Action"));
    }
}
