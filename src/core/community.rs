use crate::core::reading::Reading;
use crate::core::score::Band;
use clap::ValueEnum;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// WQI at or above which a reading counts as good quality.
pub const GOOD_QUALITY_MIN: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortBy {
    #[default]
    Date,
    Location,
    Ph,
    Turbidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum QualityFilter {
    #[default]
    All,
    Good,
    Poor,
}

impl QualityFilter {
    pub fn accepts(self, wqi: u8) -> bool {
        match self {
            Self::All => true,
            Self::Good => wqi >= GOOD_QUALITY_MIN,
            Self::Poor => wqi < GOOD_QUALITY_MIN,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub filter: QualityFilter,
}

pub fn matches_search(reading: &Reading, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    reading.location.to_lowercase().contains(&needle)
        || reading.username.to_lowercase().contains(&needle)
}

pub fn select<'a>(readings: &'a [Reading], query: &ListQuery) -> Vec<&'a Reading> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty());

    let mut selected: Vec<&Reading> = readings
        .iter()
        .filter(|reading| needle.is_none_or(|needle| matches_search(reading, needle)))
        .filter(|reading| query.filter.accepts(reading.wqi()))
        .collect();

    selected.sort_by(|a, b| compare(a, b, query.sort_by));
    selected
}

fn compare(a: &Reading, b: &Reading, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Date => b.created_at.cmp(&a.created_at),
        SortBy::Location => a
            .location
            .to_lowercase()
            .cmp(&b.location.to_lowercase()),
        SortBy::Ph => b.ph.total_cmp(&a.ph),
        SortBy::Turbidity => a.turbidity.total_cmp(&b.turbidity),
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub unique_locations: usize,
    pub contributors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_wqi: Option<f64>,
    pub bands: BTreeMap<Band, usize>,
}

impl Stats {
    pub fn from_readings(readings: &[Reading]) -> Self {
        let locations: HashSet<&str> = readings.iter().map(|r| r.location.as_str()).collect();
        let contributors: HashSet<&str> = readings.iter().map(|r| r.username.as_str()).collect();

        let mut bands: BTreeMap<Band, usize> = Band::ALL.iter().map(|band| (*band, 0)).collect();
        let mut wqi_sum = 0_u64;
        for reading in readings {
            let wqi = reading.wqi();
            wqi_sum += u64::from(wqi);
            *bands.entry(Band::for_score(wqi)).or_default() += 1;
        }

        let mean_wqi = (!readings.is_empty()).then(|| {
            let mean = wqi_sum as f64 / readings.len() as f64;
            (mean * 10.0).round() / 10.0
        });

        Self {
            total: readings.len(),
            unique_locations: locations.len(),
            contributors: contributors.len(),
            mean_wqi,
            bands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn reading(id: i64, location: &str, username: &str, ph: f64, turbidity: f64, day: u32) -> Reading {
        Reading {
            id,
            user_id: format!("user-{username}"),
            location: location.to_string(),
            username: username.to_string(),
            ph,
            turbidity,
            latitude: None,
            legacy_latitude: None,
            longitude: None,
            created_at: Utc
                .with_ymd_and_hms(2024, 3, day, 12, 0, 0)
                .single()
                .expect("valid date"),
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading(1, "Kathmandu", "sita", 7.0, 0.5, 1),
            reading(2, "pokhara", "ram", 6.2, 3.0, 3),
            reading(3, "Butwal", "sita", 9.8, 30.0, 2),
            reading(4, "Chitwan", "Kathmandu-lab", 5.0, 100.0, 4),
        ]
    }

    fn ids(selected: &[&Reading]) -> Vec<i64> {
        selected.iter().map(|reading| reading.id).collect()
    }

    #[test]
    fn default_query_lists_newest_first() {
        let readings = sample();
        let selected = select(&readings, &ListQuery::default());
        assert_eq!(ids(&selected), vec![4, 2, 3, 1]);
    }

    #[test]
    fn search_matches_location_or_username_case_insensitively() {
        let readings = sample();
        let query = ListQuery {
            search: Some("KATHMANDU".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(ids(&select(&readings, &query)), vec![4, 1]);

        let query = ListQuery {
            search: Some("sit".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(ids(&select(&readings, &query)), vec![3, 1]);
    }

    #[test]
    fn blank_search_matches_everything() {
        let readings = sample();
        let query = ListQuery {
            search: Some("   ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(select(&readings, &query).len(), 4);
    }

    #[test]
    fn surrounding_whitespace_in_search_is_ignored() {
        let readings = sample();
        let query = ListQuery {
            search: Some(" Kathmandu  ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(ids(&select(&readings, &query)), vec![4, 1]);
    }

    #[test]
    fn quality_filter_splits_at_seventy() {
        let readings = sample();
        let good = ListQuery {
            filter: QualityFilter::Good,
            ..ListQuery::default()
        };
        let poor = ListQuery {
            filter: QualityFilter::Poor,
            ..ListQuery::default()
        };
        assert_eq!(ids(&select(&readings, &good)), vec![2, 1]);
        assert_eq!(ids(&select(&readings, &poor)), vec![4, 3]);
        assert!(QualityFilter::Good.accepts(70));
        assert!(QualityFilter::Poor.accepts(69));
    }

    #[test]
    fn sorts_by_each_column() {
        let readings = sample();
        let by = |sort_by| {
            ids(&select(
                &readings,
                &ListQuery {
                    sort_by,
                    ..ListQuery::default()
                },
            ))
        };
        assert_eq!(by(SortBy::Location), vec![3, 4, 1, 2]);
        assert_eq!(by(SortBy::Ph), vec![3, 1, 2, 4]);
        assert_eq!(by(SortBy::Turbidity), vec![1, 2, 3, 4]);
    }

    #[test]
    fn stats_count_distinct_locations_and_contributors() {
        let stats = Stats::from_readings(&sample());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.unique_locations, 4);
        assert_eq!(stats.contributors, 3);
        assert_eq!(stats.mean_wqi, Some(60.0));
        assert_eq!(stats.bands[&Band::Excellent], 1);
        assert_eq!(stats.bands[&Band::Good], 1);
        assert_eq!(stats.bands[&Band::Fair], 0);
        assert_eq!(stats.bands[&Band::Poor], 2);
    }

    #[test]
    fn stats_of_nothing_have_no_mean() {
        let stats = Stats::from_readings(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean_wqi, None);
        assert_eq!(stats.bands.len(), Band::ALL.len());
    }
}
