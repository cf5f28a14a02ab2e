use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use geo_overlay::config::OverlayConfig;
use geo_overlay::live_status::LiveStatus;
use geo_overlay::rerun_logger::RerunLogger;
use geo_overlay::sensors::{self, AuthorizationStatus, CircularTrack, SensorEvent};
use geo_overlay::session::{OverlaySession, SessionStats};
use geo_overlay::sim::{SimulatedLocationService, SimulatedMap};
use geo_overlay::types::{LocationFix, ViewportSize};
use geo_overlay::MapView;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

#[derive(Parser, Debug)]
#[command(name = "geo_overlay_demo")]
#[command(about = "Geo-anchored overlay on a simulated map, driven by simulated or replayed sensors", long_about = None)]
struct Args {
    /// Duration in seconds (0 = continuous)
    #[arg(value_name = "SECONDS", default_value = "30")]
    duration: u64,

    /// JSON overlay config (defaults when omitted)
    #[arg(long)]
    config: Option<String>,

    /// JSON array of recorded fixes to replay instead of the simulated walk
    #[arg(long)]
    track: Option<String>,

    /// Replay speed multiplier
    #[arg(long, default_value = "1.0")]
    speedup: f64,

    /// Radius of the simulated walk around the landmark (meters)
    #[arg(long, default_value = "60.0")]
    radius: f64,

    /// Walking speed (m/s)
    #[arg(long, default_value = "4.0")]
    speed: f64,

    /// Viewport width (points)
    #[arg(long, default_value = "375")]
    width: f32,

    /// Viewport height (points)
    #[arg(long, default_value = "667")]
    height: f32,

    /// Tap the landmark every N seconds (0 = never)
    #[arg(long, default_value = "5")]
    tap_every: u64,

    /// Record overlay state to a Rerun .rrd file
    #[arg(long)]
    rerun: bool,

    /// Output directory
    #[arg(long, default_value = "overlay_sessions")]
    output_dir: String,
}

#[derive(Serialize, Deserialize)]
struct SessionSummary {
    started: String,
    duration_secs: f64,
    config: OverlayConfig,
    final_location: Option<LocationFix>,
    stats: SessionStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("[{}] Geo Overlay Demo Starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Viewport: {}x{}", args.width, args.height);
    println!("  Source: {}", args.track.as_deref().unwrap_or("simulated walk"));
    println!("  Output Dir: {}", args.output_dir);

    std::fs::create_dir_all(&args.output_dir)?;

    let config = match &args.config {
        Some(path) => OverlayConfig::load(path)?,
        None => OverlayConfig::default(),
    };

    let rerun = if args.rerun {
        let path = format!("{}/rerun_{}.rrd", args.output_dir, ts_now_clean());
        Some(RerunLogger::new(&path)?)
    } else {
        None
    };

    let viewport = ViewportSize::new(args.width, args.height);
    let map = Arc::new(SimulatedMap::new(viewport, config.landmark));
    let session = OverlaySession::new(Arc::clone(&map), viewport, config.clone());

    // permission prompt is pending until the first event arrives
    let location_service = SimulatedLocationService::new(AuthorizationStatus::NotDetermined);
    session.activate(&location_service)?;

    let (tx, mut rx) = mpsc::channel::<SensorEvent>(100);
    tx.try_send(SensorEvent::Authorization(AuthorizationStatus::AuthorizedWhenInUse))?;

    let walk = CircularTrack::new(config.landmark, args.radius, args.speed);
    let _location_handle = match &args.track {
        Some(path) => {
            let fixes: Vec<LocationFix> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            println!("[{}] Replaying {} fixes at {}x", ts_now(), fixes.len(), args.speedup);
            tokio::spawn(sensors::replay_loop(tx.clone(), fixes, args.speedup))
        }
        None => tokio::spawn(sensors::location_loop(
            tx.clone(),
            walk.clone(),
            Duration::from_secs(1),
        )),
    };
    let _heading_handle = tokio::spawn(sensors::heading_loop(
        tx.clone(),
        walk,
        Duration::from_millis(250),
    ));
    drop(tx);

    let start = Utc::now();
    let render_clock = Instant::now();
    let mut last_status_update = Utc::now();
    let mut last_tap = 0.0;
    let mut frame_timer = interval(Duration::from_secs_f64(config.scene.first_frame_secs));

    println!("[{}] Rendering...", ts_now());

    loop {
        if args.duration > 0 {
            let elapsed = Utc::now().signed_duration_since(start);
            if elapsed.num_seconds() as u64 >= args.duration {
                println!("[{}] Duration reached, stopping...", ts_now());
                break;
            }
        }

        frame_timer.tick().await;
        let time = render_clock.elapsed().as_secs_f64();
        if let Some(rec) = &rerun {
            rec.set_time(time);
        }

        while let Ok(event) = rx.try_recv() {
            match event {
                SensorEvent::Authorization(status) => {
                    location_service.set_authorization(status);
                    session.handle_authorization_change(status, &location_service)?;
                    // permission dialog dismissed, the screen appears again
                    if status.is_authorized() {
                        session.activate(&location_service)?;
                    }
                }
                SensorEvent::Location(fixes) => {
                    if !location_service.is_updating_location() {
                        continue;
                    }
                    let decision = session.handle_location_update(&fixes)?;
                    if decision.accept {
                        session.handle_region_changing()?;
                    }
                    if let (Some(rec), Some(fix)) = (&rerun, fixes.first()) {
                        rec.log_fix(fix, decision);
                    }
                }
                SensorEvent::Heading(heading) => {
                    if !location_service.is_updating_heading() {
                        continue;
                    }
                    session.handle_heading_update(heading)?;
                    session.handle_region_changing()?;
                    if let Some(rec) = &rerun {
                        rec.log_heading(heading);
                    }
                }
            }
        }

        if let Some(frame) = session.render_tick(time)? {
            if let Some(rec) = &rerun {
                rec.log_frame(&frame);
            }
        }

        if args.tap_every > 0 && time - last_tap >= args.tap_every as f64 {
            let hit = session.handle_tap(map.convert(config.landmark), time)?;
            log::info!("tap at {:.2}s hit {:?}", time, hit);
            if let Some(rec) = &rerun {
                rec.log_tap(hit.is_some());
            }
            last_tap = time;
        }

        // Update live status every 2 seconds
        let now = Utc::now();
        if now.signed_duration_since(last_status_update).num_seconds() >= 2 {
            let uptime = now.signed_duration_since(start).num_seconds().max(0) as u64;
            let status_path = format!("{}/live_status.json", args.output_dir);
            if let Err(e) = LiveStatus::capture(&session, uptime)?.save(&status_path) {
                log::warn!("failed to write live status: {}", e);
            }
            last_status_update = now;
        }
    }

    let final_location = session.accepted_location()?;
    session.deactivate(&location_service)?;

    let stats = session.stats()?;
    let summary = SessionSummary {
        started: start.to_rfc3339(),
        duration_secs: render_clock.elapsed().as_secs_f64(),
        config,
        final_location,
        stats: stats.clone(),
    };
    let filename = format!("{}/overlay_{}_final.json", args.output_dir, ts_now_clean());
    std::fs::write(&filename, serde_json::to_string_pretty(&summary)?)?;
    println!("[{}] Final save to {}", ts_now(), filename);

    let uptime = Utc::now().signed_duration_since(start).num_seconds().max(0) as u64;
    let status_path = format!("{}/live_status_final.json", args.output_dir);
    LiveStatus::capture(&session, uptime)?.save(&status_path)?;

    println!("\n=== Final Stats ===");
    println!(
        "Fixes: {} received, {} accepted ({} cuts), {} rejected",
        stats.fixes_received, stats.fixes_accepted, stats.immediate_cuts, stats.fixes_rejected
    );
    println!("Heading updates: {}", stats.heading_updates);
    println!(
        "Frames: {} rendered, {} skipped",
        stats.frames_rendered, stats.frames_skipped
    );
    println!("Taps: {} ({} on landmark)", stats.taps, stats.landmark_hits);
    if let Some(fix) = final_location {
        println!("Last accepted location: {:.6}, {:.6}", fix.latitude, fix.longitude);
    }

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

fn ts_now_clean() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
