mod cli;
mod config;
mod core;
mod logging;
mod providers;
mod session;
mod utils;

use crate::cli::{Cli, Commands, CommonArgs, MapFormat};
use crate::config::LoadedConfig;
use crate::core::community::{self, ListQuery, Stats};
use crate::core::reading::{Measurement, Reading};
use crate::core::{account, map, report, score, upload};
use crate::providers::opencage::OpenCageGeocoder;
use crate::providers::supabase::SupabaseClient;
use crate::providers::{AuthProvider, ReadingStore, SignUpOutcome};
use crate::session::SessionStore;
use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Score(args) => {
            let assessment = score::Assessment::new(args.ph, args.turbidity);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else {
                report::print_assessment(&assessment);
            }

            match args.min_score {
                Some(min) if assessment.wqi < min => {
                    eprintln!("WQI {} is below min-score {}", assessment.wqi, min);
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
        Commands::Init => {
            let path = std::env::current_dir()?.join(config::CONFIG_FILE_NAME);
            config::write_default_config(&path)?;
            println!("created {}", path.display());
            Ok(0)
        }
        Commands::Signup(args) => {
            account::validate_credentials(&args.email, &args.password)?;
            let loaded = load(&args.common)?;
            let client = SupabaseClient::from_config(&loaded.config.store)?;
            let sessions = SessionStore::from_config(&loaded.config.auth)?;

            match client.sign_up(args.email.trim(), &args.password, args.name.as_deref())? {
                SignUpOutcome::SignedIn(session) => {
                    sessions.save(&session)?;
                    report::print_user(&session.user);
                }
                SignUpOutcome::ConfirmationRequired(user) => {
                    println!(
                        "account created for {}; confirm the e-mail we sent, then run `nephranet login`",
                        user.email.as_deref().unwrap_or(args.email.trim())
                    );
                }
            }
            Ok(0)
        }
        Commands::Login(args) => {
            let loaded = load(&args.common)?;
            let client = SupabaseClient::from_config(&loaded.config.store)?;
            let sessions = SessionStore::from_config(&loaded.config.auth)?;

            let session = client.sign_in(args.email.trim(), &args.password)?;
            sessions.save(&session)?;
            info!("session stored in {}", sessions.path().display());
            report::print_user(&session.user);
            Ok(0)
        }
        Commands::Logout(args) => {
            let loaded = load(&args)?;
            let sessions = SessionStore::from_config(&loaded.config.auth)?;

            if let Some(session) = sessions.load()? {
                // The local session goes away even when the remote call fails.
                match SupabaseClient::from_config(&loaded.config.store)
                    .and_then(|client| client.sign_out(&session))
                {
                    Ok(()) => debug!("remote session revoked"),
                    Err(err) => warn!("remote sign out failed: {err:#}"),
                }
            }

            if sessions.clear()? {
                println!("signed out");
            } else {
                println!("not signed in");
            }
            Ok(0)
        }
        Commands::Whoami(args) => {
            let loaded = load(&args)?;
            let sessions = SessionStore::from_config(&loaded.config.auth)?;
            let Some(session) = sessions.load()? else {
                println!("not signed in");
                return Ok(1);
            };

            if json_output(&args, &loaded) {
                println!("{}", serde_json::to_string_pretty(&session.user)?);
            } else {
                report::print_user(&session.user);
            }
            Ok(0)
        }
        Commands::Upload(args) => {
            let loaded = load(&args.common)?;
            let client = SupabaseClient::from_config(&loaded.config.store)?;
            let sessions = SessionStore::from_config(&loaded.config.auth)?;
            let Some(session) = sessions.active(&client)? else {
                bail!("Please sign in to upload data (run `nephranet login`)");
            };
            let measurement = Measurement::new(args.location, args.ph, args.turbidity);

            // A bad form fails before the geocoder key is even looked up;
            // `submit` checks it again for its other callers.
            measurement.validate()?;
            let geocoder = OpenCageGeocoder::from_config(&loaded.config.geocoder)?;
            let stored = upload::submit(&client, &geocoder, Some(&session), &measurement)?;

            if json_output(&args.common, &loaded) {
                let scored = report::ScoredReading::from(&stored);
                println!("{}", serde_json::to_string_pretty(&scored)?);
            } else {
                report::print_uploaded(&stored);
            }
            Ok(0)
        }
        Commands::Community(args) => {
            let loaded = load(&args.common)?;
            let client = SupabaseClient::from_config(&loaded.config.store)?;
            let readings = fetch(&client)?;

            let query = ListQuery {
                search: args.search,
                sort_by: args.sort,
                filter: args.filter,
            };
            let selected = community::select(&readings, &query);
            let stats = Stats::from_readings(&readings);
            let community_report = report::CommunityReport::new(&stats, &selected);

            if json_output(&args.common, &loaded) {
                println!("{}", serde_json::to_string_pretty(&community_report)?);
            } else {
                report::print_community(&community_report);
            }
            Ok(0)
        }
        Commands::Stats(args) => {
            let loaded = load(&args)?;
            let client = SupabaseClient::from_config(&loaded.config.store)?;
            let stats = Stats::from_readings(&fetch(&client)?);

            if json_output(&args, &loaded) {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                report::print_stats(&stats);
            }
            Ok(0)
        }
        Commands::Map(args) => {
            let cwd = std::env::current_dir()?;
            let loaded = config::load_config(args.config.as_deref(), &cwd)?;
            let client = SupabaseClient::from_config(&loaded.config.store)?;
            let readings = fetch(&client)?;

            let points = map::points(&readings);
            let skipped = readings.len() - points.len();
            if skipped > 0 {
                info!("{skipped} reading(s) without usable coordinates left off the map");
            }

            let rendered = match args.format {
                MapFormat::Geojson => serde_json::to_string_pretty(&map::to_geojson(&points))?,
                MapFormat::Html => map::to_html(&points, &loaded.config.map)?,
            };

            match &args.output {
                Some(path) => {
                    write_output(path, &rendered)?;
                    println!("wrote {} point(s) to {}", points.len(), path.display());
                }
                None => println!("{rendered}"),
            }
            Ok(0)
        }
    }
}

fn load(args: &CommonArgs) -> Result<LoadedConfig> {
    let cwd = std::env::current_dir()?;
    let loaded = config::load_config(args.config.as_deref(), &cwd)?;
    match &loaded.source {
        Some(path) => debug!("loaded config from {}", path.display()),
        None => debug!("no config file found; using defaults"),
    }
    Ok(loaded)
}

fn json_output(args: &CommonArgs, loaded: &LoadedConfig) -> bool {
    args.json || loaded.config.general.json
}

fn fetch(store: &dyn ReadingStore) -> Result<Vec<Reading>> {
    let readings = store.list_readings()?;
    info!("fetched {} reading(s)", readings.len());
    Ok(readings)
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("failed writing {}", path.display()))
}
