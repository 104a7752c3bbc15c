//! One recompute step for a dashboard session, plus query-string decoding of
//! the session's selection.

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate_state, AggregationResult, RankingPage};
use crate::dataset::{Dataset, YearRange};
use crate::dimension::Dimension;
use crate::error::QueryError;
use crate::logging::{self, obj, Domain, Level};
use crate::resolver::{all_options, OptionSets};
use crate::state::{Selection, SelectionState};

pub const EMPTY_NOTICE: &str = "No data for this combination, please choose another period of time";

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView<'a> {
    pub state: SelectionState,
    pub options: OptionSets,
    pub aggregation: AggregationResult<'a>,
    pub ranking: RankingPage,
    pub notice: Option<&'static str>,
}

/// Resolves every dropdown and recomputes the charts for `state`, with the
/// ranking table cut to the zero-based `page`.
pub fn recompute<'a>(dataset: &'a Dataset, state: &SelectionState, page: usize, page_size: usize) -> DashboardView<'a> {
    let options = all_options(dataset, state);
    let aggregation = aggregate_state(dataset, state);
    let ranking = aggregation.ranking(page, page_size);
    let notice = aggregation.empty.then_some(EMPTY_NOTICE);

    if logging::enabled(Level::Debug, Domain::Filter) {
        let counts: Vec<(&str, serde_json::Value)> = Dimension::ALL
            .iter()
            .map(|d| (d.as_str(), serde_json::json!(options.get(*d).len())))
            .collect();
        logging::log(Level::Debug, Domain::Filter, "options_resolved", obj(&counts));
    }

    DashboardView {
        state: state.clone(),
        options,
        aggregation,
        ranking,
        notice,
    }
}

impl SelectionState {
    /// Decodes `platform=..&genre=..&year_min=..&year_max=..&group_by=..`.
    ///
    /// Dimension keys may repeat; each occurrence adds one value. Missing
    /// keys keep the defaults of [`SelectionState::initial`]. The result is
    /// sanitised against `dataset`.
    pub fn from_query(dataset: &Dataset, query: &str, default_grouping: Dimension) -> Result<Self, QueryError> {
        let mut selection = Selection::default();
        let bounds = dataset.year_bounds();
        let mut year_min = bounds.min;
        let mut year_max = bounds.max;
        let mut grouping = default_grouping;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "year_min" => year_min = parse_year("year_min", &value)?,
                "year_max" => year_max = parse_year("year_max", &value)?,
                "group_by" => grouping = value.parse()?,
                other => {
                    if let Some(dim) = Dimension::ALL.iter().find(|d| d.query_key() == other) {
                        if !value.is_empty() {
                            selection.get_mut(*dim).insert(value.into_owned());
                        }
                    }
                }
            }
        }

        Ok(SelectionState::initial(dataset, grouping)
            .with_selection(selection)
            .with_years(YearRange::new(year_min, year_max))
            .sanitized(dataset))
    }
}

/// Partial selection as sent by a client; absent fields take the initial
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    pub selection: Selection,
    pub years: Option<YearRange>,
    pub grouping: Option<Dimension>,
}

impl SelectionRequest {
    pub fn into_state(self, dataset: &Dataset, default_grouping: Dimension) -> SelectionState {
        let mut state = SelectionState::initial(dataset, self.grouping.unwrap_or(default_grouping))
            .with_selection(self.selection);
        if let Some(years) = self.years {
            state = state.with_years(years);
        }
        state.sanitized(dataset)
    }
}

fn parse_year(key: &'static str, value: &str) -> Result<i32, QueryError> {
    value.trim().parse().map_err(|_| QueryError::BadYear {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::small;

    #[test]
    fn test_query_decodes_repeated_values() {
        let ds = small();
        let st = SelectionState::from_query(&ds, "platform=PS4&platform=PSV&year_min=2013&group_by=Genre", Dimension::Platform)
            .unwrap();
        assert_eq!(st.selection.platform.len(), 2);
        assert_eq!(st.years, YearRange { min: 2013, max: 2016 });
        assert_eq!(st.grouping, Dimension::Genre);
    }

    #[test]
    fn test_query_percent_decoding_and_unknown_values() {
        let ds = small();
        let st = SelectionState::from_query(&ds, "company=Sony&publisher=Bandai+Namco&foo=bar", Dimension::Platform).unwrap();
        assert!(st.selection.company.contains("Sony"));
        // not in the dataset, dropped by sanitize
        assert!(st.selection.publisher.is_empty());
    }

    #[test]
    fn test_query_rejects_bad_year() {
        let ds = small();
        let err = SelectionState::from_query(&ds, "year_min=abc", Dimension::Platform).unwrap_err();
        assert_eq!(
            err,
            QueryError::BadYear {
                key: "year_min",
                value: "abc".to_string()
            }
        );
        assert!(SelectionState::from_query(&ds, "group_by=Year", Dimension::Platform).is_err());
    }

    #[test]
    fn test_query_clamps_years() {
        let ds = small();
        let st = SelectionState::from_query(&ds, "year_min=1900&year_max=2100", Dimension::Platform).unwrap();
        assert_eq!(st.years, ds.year_bounds());
    }

    #[test]
    fn test_request_fills_defaults() {
        let ds = small();
        let req: SelectionRequest = serde_json::from_str(r#"{"selection": {"Genre": ["Sports"]}, "years": {"min": 2016, "max": 2000}}"#).unwrap();
        let st = req.into_state(&ds, Dimension::Company);
        assert_eq!(st.grouping, Dimension::Company);
        assert_eq!(st.years, YearRange { min: 2008, max: 2016 });
        assert!(st.selection.genre.contains("Sports"));
    }

    #[test]
    fn test_recompute_sets_notice_when_empty() {
        let ds = small();
        let st = SelectionState::initial(&ds, Dimension::Platform).with_selection(
            Selection::default()
                .with(Dimension::Company, ["Microsoft"])
                .with(Dimension::Genre, ["Action"]),
        );
        let view = recompute(&ds, &st, 0, 15);
        assert!(view.aggregation.empty);
        assert_eq!(view.notice, Some(EMPTY_NOTICE));
        assert!(view.ranking.entries.is_empty());
        // each dropdown still offers values that combine with the others
        assert_eq!(view.options.company, ["Nintendo", "Sony"]);
        assert_eq!(view.options.genre, ["Sports"]);
    }

    #[test]
    fn test_recompute_serializes() {
        let ds = small();
        let st = SelectionState::initial(&ds, Dimension::Genre);
        let view = recompute(&ds, &st, 0, 3);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["options"]["Platform"].as_array().unwrap().len(), 5);
        assert_eq!(json["ranking"]["entries"].as_array().unwrap().len(), 3);
        assert_eq!(json["aggregation"]["empty"], false);
        assert!(json["notice"].is_null());
    }

    #[test]
    fn test_recompute_builds_requested_page() {
        let ds = small();
        let st = SelectionState::initial(&ds, Dimension::Platform);
        let view = recompute(&ds, &st, 1, 4);
        assert_eq!(view.ranking.page, 1);
        assert_eq!(view.ranking.entries.len(), 2);
        assert_eq!(view.ranking.entries[0].rank, 5);
    }
}
