//! Deterministic synthetic sales table for demos and randomised tests.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::dataset::{Dataset, Sales, SalesRecord};
use crate::error::DataError;

// (platform, company, console, first year, last year)
const PLATFORMS: [(&str, &str, &str, i32, i32); 10] = [
    ("NES", "Nintendo", "stationary", 1983, 1994),
    ("GB", "Nintendo", "portable", 1989, 2001),
    ("PS", "Sony", "stationary", 1994, 2003),
    ("N64", "Nintendo", "stationary", 1996, 2002),
    ("PS2", "Sony", "stationary", 2000, 2011),
    ("XB", "Microsoft", "stationary", 2001, 2008),
    ("DS", "Nintendo", "portable", 2004, 2014),
    ("Wii", "Nintendo", "stationary", 2006, 2016),
    ("X360", "Microsoft", "stationary", 2005, 2016),
    ("PS4", "Sony", "stationary", 2013, 2020),
];

const PUBLISHERS: [&str; 6] = ["Activision", "Electronic Arts", "Nintendo", "Sega", "Ubisoft", "none"];

const GENRES: [&str; 8] = [
    "Action", "Adventure", "Platform", "Puzzle", "Racing", "Role-Playing", "Shooter", "Sports",
];

/// Builds `rows` records from `seed`. The same seed always yields the same
/// table. `rows` is raised to one so the result always has year bounds.
pub fn sample_dataset(seed: u64, rows: usize) -> Result<Dataset, DataError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..rows.max(1))
        .map(|i| {
            let (platform, company, console, first, last) = PLATFORMS[rng.gen_range(0..PLATFORMS.len())];
            let publisher = PUBLISHERS.choose(&mut rng).copied().unwrap_or("none");
            let genre = GENRES.choose(&mut rng).copied().unwrap_or("Action");
            let year = rng.gen_range(first..=last);
            // long-tailed: most titles sell little, a few sell a lot
            let scale: f64 = rng.gen::<f64>().powi(3) * 10.0;
            let na = round2(scale * rng.gen_range(0.2..0.6));
            let eu = round2(scale * rng.gen_range(0.1..0.4));
            let jp = if company == "Nintendo" || company == "Sony" {
                round2(scale * rng.gen_range(0.05..0.4))
            } else {
                round2(scale * rng.gen_range(0.0..0.05))
            };
            let others = round2(scale * rng.gen_range(0.0..0.1));
            SalesRecord {
                name: format!("{} Title {}", genre, i + 1),
                platform: platform.to_string(),
                company: company.to_string(),
                publisher: publisher.to_string(),
                genre: genre.to_string(),
                console: console.to_string(),
                year,
                sales: Sales::from_regions(na, eu, jp, others),
            }
        })
        .collect();
    Dataset::new(records)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
