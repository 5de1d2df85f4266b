//! Main localisation executable entry point.
//!
//! # Usage
//!
//! ```text
//! loc_exec <map_path> <dest_x> <dest_y>
//! ```
//!
//! The robot localises itself on the map's street grid and then drives to the intersection at
//! `(dest_x, dest_y)`. Giving `-1 -1` as the destination instead runs the colour calibration and
//! writes the calibration table to the configured file.
//!
//! Pressing Ctrl-C at any point stops the motors and ends the session.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use comms_if::net::zmq;
use log::{error, info, warn};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use structopt::{clap::AppSettings, StructOpt};

// Internal
use loc_lib::{
    auto::{
        loc::LocEngine,
        loc_mgr::LocMgr,
        map::{Coord, Map},
        nav::NavCtrl,
        notify::ToneNotifier,
        path_exec::PathExec,
        run_mission,
    },
    calib,
    colour::{Classifier, ColourTable},
    params::{LocExecParams, NetParams},
    robot::{Rig, RobotClient},
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Calibration table written when no `calibration_file` is configured.
const DEFAULT_CALIBRATION_FILE: &str = "calib.bin";

/// Destination requesting calibration instead of a mission.
const CALIBRATE_DEST: (i64, i64) = (-1, -1);

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "loc_exec",
    about = "Localise on a street grid and drive to a destination intersection",
    setting = AppSettings::AllowNegativeNumbers
)]
struct Args {
    /// Image of the street grid
    #[structopt(parse(from_os_str))]
    map_path: PathBuf,

    /// Destination intersection column, -1 with a row of -1 to calibrate
    dest_x: i64,

    /// Destination intersection row
    dest_y: i64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    let args = Args::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("loc_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Streetbot Localisation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let exec_params: LocExecParams =
        util::params::load("loc_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- CHECK THE MISSION ----

    // The map and destination are checked before anything moves
    let mission = if (args.dest_x, args.dest_y) == CALIBRATE_DEST {
        info!("Calibration requested");
        None
    } else {
        let map = Map::load(&args.map_path)
            .wrap_err_with(|| format!("Could not load the map from {:?}", args.map_path))?;
        info!("Loaded a {}x{} map", map.size_x(), map.size_y());

        let target = destination(&map, args.dest_x, args.dest_y)?;
        info!("Destination: {}", target);

        Some((map, target))
    };

    // ---- INITIALISE THE ROBOT ----

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    ctrlc::set_handler(move || {
        warn!("Shutdown requested");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .wrap_err("Failed to set the Ctrl-C handler")?;

    let zmq_ctx = zmq::Context::new();

    let robot = RobotClient::connect(
        &zmq_ctx,
        &net_params.robot_socket,
        &net_params.robot_endpoint,
    )
    .wrap_err("Failed to connect to the robot")?;

    // ---- CALIBRATION ----

    let (map, target) = match mission {
        Some(m) => m,
        None => {
            let mut rig = Rig::new(
                robot,
                exec_params.rig.clone(),
                Classifier::default(),
                shutdown,
            );

            let path = host::get_sw_root()
                .wrap_err("Could not find the software root")?
                .join(
                    exec_params
                        .calibration_file
                        .as_deref()
                        .unwrap_or(DEFAULT_CALIBRATION_FILE),
                );

            let res = match calib::run(&mut rig, &exec_params.calib, &path) {
                Ok(table) => {
                    info!("Calibrated with {} samples", table.samples().len());
                    Ok(())
                }
                Err(e) if e.is_shutdown() => Ok(()),
                Err(e) => Err(e),
            };

            if let Err(e) = rig.halt() {
                error!("Could not stop the motors: {}", e);
            }
            session.exit();

            return res.wrap_err("Calibration failed");
        }
    };

    // ---- MISSION ----

    let classifier = load_classifier(&exec_params)?;
    let rig = Rig::new(robot, exec_params.rig.clone(), classifier, shutdown);
    let mut nav = NavCtrl::new(rig, exec_params.nav.clone());

    let archiver = Archiver::from_path(&session, "loc_cycles.csv")
        .wrap_err("Failed to create the localisation archive")?;
    let mut loc_mgr = LocMgr::new(
        LocEngine::new(map, exec_params.loc),
        exec_params.loc_mgr.clone(),
    )
    .with_archiver(archiver);

    let path_exec = PathExec::new(exec_params.path_exec.clone());
    let mut notifier = ToneNotifier::new(exec_params.tones.clone());

    let res = match run_mission(
        &mut nav,
        &mut loc_mgr,
        &path_exec,
        &mut notifier,
        target,
        Some(&session),
    ) {
        Ok(state) => {
            info!("Arrived at {} facing {}", target, state.heading);
            Ok(())
        }
        Err(e) if e.is_shutdown() => Ok(()),
        Err(e) => Err(e),
    };

    // Always stop the motors, whatever happened
    if let Err(e) = nav.halt() {
        error!("Could not stop the motors: {}", e);
    }

    session.exit();

    res.wrap_err("Mission failed")
}

/// Check the destination lies on the map.
fn destination(map: &Map, x: i64, y: i64) -> Result<Coord, Report> {
    if x < 0 || y < 0 || x as usize >= map.size_x() || y as usize >= map.size_y() {
        return Err(eyre!(
            "Destination ({}, {}) is outside the {}x{} map",
            x,
            y,
            map.size_x(),
            map.size_y()
        ));
    }

    Ok(Coord::new(x as usize, y as usize))
}

/// Classify with the calibration table if there is one, otherwise with the fixed thresholds.
fn load_classifier(params: &LocExecParams) -> Result<Classifier, Report> {
    let file = match params.calibration_file {
        Some(ref f) => f,
        None => {
            info!("No calibration file configured, using the threshold classifier");
            return Ok(Classifier::default());
        }
    };

    let path = host::get_sw_root()
        .wrap_err("Could not find the software root")?
        .join(file);

    if !path.exists() {
        warn!(
            "Calibration file {:?} not found, using the threshold classifier",
            path
        );
        return Ok(Classifier::default());
    }

    let table = ColourTable::load(&path)
        .wrap_err_with(|| format!("Could not load the calibration table from {:?}", path))?;
    info!(
        "Loaded {} calibration samples from {:?}",
        table.samples().len(),
        path
    );

    Ok(Classifier::Calibrated(table))
}
