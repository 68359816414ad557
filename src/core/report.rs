use crate::core::community::Stats;
use crate::core::reading::Reading;
use crate::core::score::{Assessment, Band};
use crate::session::User;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredReading<'a> {
    #[serde(flatten)]
    pub reading: &'a Reading,
    pub wqi: u8,
    pub band: Band,
    pub label: &'static str,
}

impl<'a> From<&'a Reading> for ScoredReading<'a> {
    fn from(reading: &'a Reading) -> Self {
        let band = reading.band();
        Self {
            reading,
            wqi: reading.wqi(),
            band,
            label: band.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityReport<'a> {
    pub stats: &'a Stats,
    pub readings: Vec<ScoredReading<'a>>,
}

impl<'a> CommunityReport<'a> {
    pub fn new(stats: &'a Stats, selected: &[&'a Reading]) -> Self {
        Self {
            stats,
            readings: selected.iter().map(|reading| ScoredReading::from(*reading)).collect(),
        }
    }
}

pub fn print_assessment(assessment: &Assessment) {
    println!(
        "Water Quality Index: {}/100 ({})",
        assessment.wqi,
        assessment.band.colored()
    );
    println!("  pH {:<10} -> {}", assessment.ph, assessment.ph_score);
    println!(
        "  turbidity {:<6} -> {} ({} NTU)",
        assessment.turbidity, assessment.turbidity_score, assessment.turbidity
    );
}

pub fn print_stats(stats: &Stats) {
    println!("{} Total Measurements", stats.total.to_string().bold());
    println!("{} Unique Locations", stats.unique_locations.to_string().bold());
    println!("{} Contributors", stats.contributors.to_string().bold());
    if let Some(mean) = stats.mean_wqi {
        println!("{} Mean WQI", format!("{mean:.1}").bold());
    }

    if stats.total > 0 {
        println!();
        for (band, count) in &stats.bands {
            println!("{:>10}  {}", band.colored(), count);
        }
    }
}

pub fn print_community(report: &CommunityReport<'_>) {
    print_stats(report.stats);
    println!();

    if report.readings.is_empty() {
        println!("No data found matching your criteria");
        return;
    }

    for scored in &report.readings {
        let reading = scored.reading;
        println!(
            "{} by {}  [WQI: {}]",
            reading.location.bold(),
            reading.username,
            scored.wqi
        );
        println!("  pH Level   {}", reading.ph);
        println!("  Turbidity  {} NTU", reading.turbidity);
        println!("  Date       {}", reading.created_at.format("%Y-%m-%d"));
        println!("  Water Quality: {}", scored.band.colored());
        println!();
    }
}

pub fn print_uploaded(reading: &Reading) {
    println!("{}", "Water quality data uploaded successfully!".green());
    println!(
        "{} WQI {} ({})",
        placed_location(reading),
        reading.wqi(),
        reading.band().colored()
    );
}

fn placed_location(reading: &Reading) -> String {
    match reading.coordinates() {
        Some((lat, lng)) => format!("{} ({lat:.5}, {lng:.5})", reading.location),
        None => reading.location.clone(),
    }
}

pub fn print_user(user: &User) {
    println!("signed in as {}", user.display_name().bold());
    if let Some(email) = &user.email {
        println!("email: {email}");
    }
    println!("id: {}", user.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn scored_reading_flattens_row_fields() {
        let reading = Reading {
            id: 5,
            user_id: "u1".to_string(),
            location: "Janakpur".to_string(),
            username: "mina".to_string(),
            ph: 8.8,
            turbidity: 12.0,
            latitude: Some(26.7),
            legacy_latitude: None,
            longitude: Some(85.9),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(ScoredReading::from(&reading)).expect("serializes");

        assert_eq!(value["id"], 5);
        assert_eq!(value["location"], "Janakpur");
        assert_eq!(value["wqi"], 60);
        assert_eq!(value["band"], "fair");
        assert_eq!(value["label"], "Fair");
    }

    #[test]
    fn placed_location_omits_missing_coordinates() {
        let mut reading = Reading {
            id: 9,
            user_id: "u1".to_string(),
            location: "Biratnagar".to_string(),
            username: "mina".to_string(),
            ph: 7.0,
            turbidity: 0.5,
            latitude: Some(26.4525),
            legacy_latitude: None,
            longitude: Some(87.2718),
            created_at: Utc::now(),
        };
        assert_eq!(placed_location(&reading), "Biratnagar (26.45250, 87.27180)");

        reading.latitude = None;
        assert_eq!(placed_location(&reading), "Biratnagar");
    }
}
