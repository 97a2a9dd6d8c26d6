use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use skywatch::catalog::{
    CatalogCache, CatalogError, CatalogFilter, CatalogSource, FilterOutcome, TleDirectorySource,
};
use skywatch::config::{parse_timezone, Config, ConfigError};
use skywatch::ephemeris::{EphemerisSampler, SamplingError};
use skywatch::geo::ObserverLocation;
use skywatch::propagator::Propagator;
use skywatch::relative::{
    relative_track_between, InTrackControl, MissDistanceSummary, RelativeError, RicTrack,
};
use skywatch::schedule::{Schedule, DT_FORMAT};
use skywatch::transit::{InvalidSteps, InvalidWindow, SearchWindow, TransitSearch, TransitSummary};

#[derive(Parser)]
#[command(name = "skywatch")]
#[command(about = "Satellite transit and relative-motion analysis")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "skywatch.yaml")]
    config: String,
    /// Print machine-readable JSON instead of tables
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configuration and report catalog quality
    Validate,
    /// List transits over the configured observers
    Transits {
        /// Only show transits over this observer
        #[arg(long)]
        location: Option<String>,
        /// Show start, end and duration instead of rise/set azimuths
        #[arg(long)]
        timeline: bool,
        /// Sample an ephemeris for every transit
        #[arg(long)]
        populate: bool,
        /// Show times in this IANA zone instead of the configured one
        #[arg(long)]
        tz: Option<String>,
    },
    /// Sample the ground track of one object
    Track {
        norad_id: u32,
        /// Span to sample, e.g. "90m"
        #[arg(long, default_value = "90m")]
        span: String,
        /// Add look angles from this observer
        #[arg(long)]
        location: Option<String>,
    },
    /// Relative motion of a secondary object in the primary's RIC frame
    Ric {
        primary: u32,
        secondary: u32,
        #[arg(long, default_value = "6h")]
        span: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Window(#[from] InvalidWindow),
    #[error(transparent)]
    Steps(#[from] InvalidSteps),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Relative(#[from] RelativeError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Timezone(String),
    #[error("Invalid span: {0}")]
    Span(String),
    #[error("Object {0} is not in the filtered catalog")]
    UnknownObject(u32),
    #[error("Unknown observer {0}")]
    UnknownObserver(String),
    #[error("Worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match Config::from_file(&cli.config) {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: Config) -> Result<(), CliError> {
    let observers = config.observer_locations()?;
    let outcome = load_catalog(&config).await?;

    match &cli.command {
        Commands::Validate => validate(&config, &observers, &outcome, cli.json),
        Commands::Transits {
            location,
            timeline,
            populate,
            tz,
        } => {
            let tz = match tz {
                Some(name) => parse_timezone(name).map_err(CliError::Timezone)?,
                None => config.transits.display_timezone(),
            };
            transits(
                &config,
                observers,
                outcome.accepted,
                location.as_deref(),
                *timeline,
                *populate,
                tz,
                cli.json,
            )
            .await
        }
        Commands::Track {
            norad_id,
            span,
            location,
        } => {
            let observer = match location {
                Some(label) => Some(find_observer(&observers, label)?),
                None => None,
            };
            track(&config, &outcome.accepted, *norad_id, span, observer, cli.json)
        }
        Commands::Ric {
            primary,
            secondary,
            span,
        } => ric(&config, &outcome.accepted, *primary, *secondary, span, cli.json),
    }
}

async fn load_catalog(config: &Config) -> Result<FilterOutcome, CliError> {
    let source: Arc<dyn CatalogSource> =
        Arc::new(TleDirectorySource::new(config.catalog.tle_folder.clone()));
    let cache = CatalogCache::new(config.catalog.cache_ttl);
    let catalog = cache.get_or_refresh(&config.catalog.group, source).await?;

    let filter = CatalogFilter::new(config.filter.clone());
    Ok(filter.filter(catalog.iter().cloned().collect(), Utc::now()))
}

fn window_start(config: &Config) -> DateTime<Utc> {
    config.transits.start.unwrap_or_else(Utc::now)
}

fn parse_span(span: &str) -> Result<Duration, CliError> {
    humantime::parse_duration(span)
        .map_err(|e| CliError::Span(e.to_string()))
        .and_then(|d| Duration::from_std(d).map_err(|e| CliError::Span(e.to_string())))
}

fn find_object(
    objects: &[Arc<dyn Propagator>],
    norad_id: u32,
) -> Result<Arc<dyn Propagator>, CliError> {
    objects
        .iter()
        .find(|o| o.identity().norad_id == norad_id)
        .cloned()
        .ok_or(CliError::UnknownObject(norad_id))
}

fn find_observer(
    observers: &[ObserverLocation],
    label: &str,
) -> Result<ObserverLocation, CliError> {
    observers
        .iter()
        .find(|o| o.label().eq_ignore_ascii_case(label))
        .cloned()
        .ok_or_else(|| CliError::UnknownObserver(label.to_string()))
}

#[derive(Serialize)]
struct CatalogReport<'a> {
    group: &'a str,
    observers: &'a [ObserverLocation],
    total_queried: usize,
    accepted: usize,
    dropped: BTreeMap<&'static str, usize>,
}

fn validate(
    config: &Config,
    observers: &[ObserverLocation],
    outcome: &FilterOutcome,
    json: bool,
) -> Result<(), CliError> {
    let report = CatalogReport {
        group: &config.catalog.group,
        observers,
        total_queried: outcome.total_queried(),
        accepted: outcome.accepted.len(),
        dropped: outcome.dropped_by_reason(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Configuration is valid ({} observers)", observers.len());
    for observer in observers {
        println!("  {}", observer);
    }
    println!(
        "Catalog {}: {} of {} objects accepted",
        report.group, report.accepted, report.total_queried
    );
    for (reason, count) in &report.dropped {
        println!("  dropped {:>4} {}", count, reason);
    }
    for rejection in &outcome.rejected {
        println!("  {}: {}", rejection.identity, rejection.reason);
    }
    Ok(())
}

#[derive(Serialize)]
struct TransitReport {
    summary: TransitSummary,
    schedule: Schedule,
}

async fn transits(
    config: &Config,
    observers: Vec<ObserverLocation>,
    objects: Vec<Arc<dyn Propagator>>,
    location: Option<&str>,
    timeline: bool,
    populate: bool,
    tz: Tz,
    json: bool,
) -> Result<(), CliError> {
    let window = SearchWindow::starting_at(window_start(config), config.transits.window)?;
    let detector = config.detector()?;
    log::info!(
        "Searching {} objects over {} observers from {} with {}° minimum elevation",
        objects.len(),
        observers.len(),
        window.start().format(DT_FORMAT),
        detector.min_elevation_deg()
    );

    let sampling = config.sampling.clone();
    let search = tokio::task::spawn_blocking(move || {
        let mut search = TransitSearch::run(&detector, &objects, &observers, window);
        if populate {
            EphemerisSampler::new(sampling.illumination).populate(
                &mut search.transits,
                &objects,
                sampling.max_total_points,
            );
        }
        search
    })
    .await?;

    for failure in &search.failures {
        log::warn!(
            "{} over {}: {}",
            failure.identity,
            failure.observer,
            failure.error
        );
    }

    let schedule = if timeline {
        Schedule::timeline(&search.transits, location)
    } else {
        Schedule::compact(&search.transits, location)
    };
    let summary = search.summary();

    if json {
        let report = TransitReport { summary, schedule };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", schedule.render(tz));
    println!(
        "{} transits by {} of {} objects ({} failures, {} windows dropped)",
        summary.total_transits,
        summary.objects_with_transits,
        summary.objects_queried,
        summary.failures,
        summary.misaligned_windows
    );
    Ok(())
}

fn track(
    config: &Config,
    objects: &[Arc<dyn Propagator>],
    norad_id: u32,
    span: &str,
    observer: Option<ObserverLocation>,
    json: bool,
) -> Result<(), CliError> {
    let object = find_object(objects, norad_id)?;
    let start = window_start(config);
    let end = start + parse_span(span)?;

    let sampler = EphemerisSampler::new(config.sampling.illumination);
    let ephemeris = sampler.sample_complete_span(
        object.as_ref(),
        start,
        end,
        config.sampling.track_points,
        observer.as_ref(),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ephemeris)?);
        return Ok(());
    }

    println!("{}", object.identity());
    for sample in ephemeris.samples() {
        let look = sample
            .look
            .map(|l| {
                format!(
                    "  az {:6.1} el {:5.1} rng {:8.1} km",
                    l.azimuth_deg, l.elevation_deg, l.range_km
                )
            })
            .unwrap_or_default();
        let lit = match sample.sunlit {
            Some(true) => "  sunlit",
            Some(false) => "  eclipsed",
            None => "",
        };
        println!(
            "{}  {:8.3} {:9.3} {:8.1} km{}{}",
            sample.epoch.format(DT_FORMAT),
            sample.latitude_deg,
            sample.longitude_deg,
            sample.altitude_km,
            look,
            lit
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct RicReport<'a> {
    primary: String,
    secondary: String,
    summary: Option<MissDistanceSummary>,
    control_active_samples: usize,
    track: &'a RicTrack,
}

fn ric(
    config: &Config,
    objects: &[Arc<dyn Propagator>],
    primary: u32,
    secondary: u32,
    span: &str,
    json: bool,
) -> Result<(), CliError> {
    let primary = find_object(objects, primary)?;
    let secondary = find_object(objects, secondary)?;
    let start = window_start(config);
    let end = start + parse_span(span)?;
    let n = config.sampling.track_points;

    let sampler = EphemerisSampler::default();
    let primary_track = sampler.sample_complete_span(primary.as_ref(), start, end, n, None)?;
    let secondary_track = sampler.sample_complete_span(secondary.as_ref(), start, end, n, None)?;
    let track = relative_track_between(&primary_track, &secondary_track)?;

    let control = InTrackControl::default();
    let control_active_samples = primary_track
        .states()
        .iter()
        .zip(secondary_track.states().iter())
        .filter_map(|(p, s)| control.acceleration(p, s))
        .filter(|a| a.norm() > 0.0)
        .count();

    let report = RicReport {
        primary: primary.identity().to_string(),
        secondary: secondary.identity().to_string(),
        summary: track.summary(),
        control_active_samples,
        track: &track,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} relative to {}", report.secondary, report.primary);
    match report.summary {
        Some(summary) => println!(
            "  miss distance min {:.1} m at {}, max {:.1} m, mean {:.1} m over {} samples",
            summary.min_m,
            summary.closest_approach.format(DT_FORMAT),
            summary.max_m,
            summary.mean_m,
            summary.samples
        ),
        None => println!("  no comparable epochs"),
    }
    if !track.skipped.is_empty() {
        println!("  {} epochs skipped (degenerate geometry)", track.skipped.len());
    }
    println!(
        "  in-track control beyond {:.0} m would fire on {} samples",
        control.threshold_m, report.control_active_samples
    );
    Ok(())
}
