//! Categorical dimensions and sales regions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the five categorical attributes a row can be filtered or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Platform,
    Company,
    Publisher,
    Genre,
    Console,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Platform,
        Dimension::Company,
        Dimension::Publisher,
        Dimension::Genre,
        Dimension::Console,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Platform => "Platform",
            Dimension::Company => "Company",
            Dimension::Publisher => "Publisher",
            Dimension::Genre => "Genre",
            Dimension::Console => "Console",
        }
    }

    /// Lowercase key used in query strings.
    pub fn query_key(&self) -> &'static str {
        match self {
            Dimension::Platform => "platform",
            Dimension::Company => "company",
            Dimension::Publisher => "publisher",
            Dimension::Genre => "genre",
            Dimension::Console => "console",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Dimension::Platform => 0,
            Dimension::Company => 1,
            Dimension::Publisher => 2,
            Dimension::Genre => 3,
            Dimension::Console => 4,
        }
    }

    /// The other four dimensions, in declaration order.
    pub fn others(self) -> impl Iterator<Item = Dimension> {
        Dimension::ALL.into_iter().filter(move |d| *d != self)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dimension: {0}")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "platform" => Ok(Dimension::Platform),
            "company" | "platform company" => Ok(Dimension::Company),
            "publisher" => Ok(Dimension::Publisher),
            "genre" => Ok(Dimension::Genre),
            "console" | "type of console" => Ok(Dimension::Console),
            _ => Err(UnknownDimension(s.to_string())),
        }
    }
}

/// Sales geography. `Global` is the reported total, not a computed sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    Japan,
    Others,
    Global,
}

impl Region {
    /// The four geographies, without the global total.
    pub const GEOGRAPHIES: [Region; 4] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::Japan,
        Region::Others,
    ];

    pub const ALL: [Region; 5] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::Japan,
        Region::Others,
        Region::Global,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Japan => "Japan",
            Region::Others => "Others",
            Region::Global => "Global",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension_aliases() {
        assert_eq!("Platform".parse::<Dimension>().unwrap(), Dimension::Platform);
        assert_eq!(" genre ".parse::<Dimension>().unwrap(), Dimension::Genre);
        assert_eq!("Platform Company".parse::<Dimension>().unwrap(), Dimension::Company);
        assert_eq!("type of console".parse::<Dimension>().unwrap(), Dimension::Console);
        assert!("Year".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_others_excludes_self() {
        for dim in Dimension::ALL {
            let others: Vec<_> = dim.others().collect();
            assert_eq!(others.len(), 4);
            assert!(!others.contains(&dim));
        }
    }

    #[test]
    fn test_index_matches_all_order() {
        for (i, dim) in Dimension::ALL.iter().enumerate() {
            assert_eq!(dim.index(), i);
        }
    }

    #[test]
    fn test_dimension_serializes_as_column_name() {
        let v = serde_json::to_value(Dimension::Publisher).unwrap();
        assert_eq!(v, "Publisher");
    }
}
