use crate::context::AppContext;
use crate::output::warn;
use anyhow::Context;
use std::path::Path;
use tigo_core::health::{HttpProbe, ProbePolicy};
use tigo_core::lifecycle::pm2;
use tigo_core::lifecycle::{
    select_backend, Backend, Controller, NodeLauncher, Pm2, ProcessRecord, StartOutcome,
    StopOutcome, Supervisor,
};
use tigo_core::paths;
use tigo_core::registry::Registry;
use tigo_core::store::JsonStore;

fn controller<'s>(store: &'s mut JsonStore, server_dir: &Path) -> anyhow::Result<Controller<'s>> {
    let probe = HttpProbe::new(ProbePolicy::from_env())?;
    Ok(Controller::new(
        server_dir,
        store,
        Box::new(Pm2::default()),
        Box::new(NodeLauncher),
        Box::new(probe),
    ))
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

pub fn start(ctx: &mut AppContext, directly: bool) -> anyhow::Result<()> {
    let server_dir = ctx.server_dir()?;
    ctx.check_env()?;

    let pm2 = Pm2::default();
    let mut detected = false;
    let backend = select_backend(
        directly,
        ctx.config.default_start_type(),
        ctx.config.pm2_installed(),
        || {
            tracing::debug!("detecting pm2");
            detected = pm2.is_available();
            detected
        },
    );
    if detected {
        ctx.config.set_pm2_installed(true)?;
    }
    tracing::debug!(%backend, "selected start type");

    start_with(ctx, &server_dir, backend).context("failed to start server")?;
    Ok(())
}

/// Start with `backend`, making sure pm2 has its ecosystem config first.
/// Returns false when the user declined every way of starting.
fn start_with(ctx: &mut AppContext, server_dir: &Path, backend: Backend) -> anyhow::Result<bool> {
    let backend = match backend {
        Backend::Pm2 => match ensure_ecosystem(ctx, server_dir)? {
            Some(b) => b,
            None => return Ok(false),
        },
        Backend::Directly => Backend::Directly,
    };
    let outcome = controller(&mut ctx.store, server_dir)?.start(backend)?;
    report_start(ctx, &outcome)?;
    Ok(true)
}

/// Make sure pm2 has an ecosystem file to start from. Offers to download the
/// upstream one, then to start directly instead. `None` means the user
/// declined both.
fn ensure_ecosystem(ctx: &AppContext, server_dir: &Path) -> anyhow::Result<Option<Backend>> {
    let ecosystem = paths::ecosystem_path(server_dir);
    if ecosystem.is_file() {
        return Ok(Some(Backend::Pm2));
    }
    warn("cannot find the ecosystem config for pm2");
    if ctx.confirm(
        "Do you want to download pm2 ecosystem configuration automatically?",
        true,
    )? {
        tracing::debug!("downloading ecosystem.config.js");
        let url = pm2::ecosystem_url();
        match Registry::from_env().and_then(|r| r.download(&url, &ecosystem)) {
            Ok(()) => return Ok(Some(Backend::Pm2)),
            Err(e) => warn(&format!("failed to download ecosystem.config.js: {e}")),
        }
    }
    if ctx.confirm("Fallback to start server directly?", true)? {
        Ok(Some(Backend::Directly))
    } else {
        Ok(None)
    }
}

fn report_start(ctx: &mut AppContext, outcome: &StartOutcome) -> anyhow::Result<()> {
    match outcome {
        StartOutcome::AlreadyRunning { pid } => {
            println!("The server is already started (pid {pid}).");
        }
        StartOutcome::Started {
            backend,
            pid,
            fell_back,
        } => {
            if *fell_back {
                warn("cannot start with pm2, started the server directly instead");
                // pm2 has to be detected again before the next pm2 start
                ctx.config.set_pm2_installed(false)?;
            }
            match (backend, pid) {
                (Backend::Directly, Some(pid)) => {
                    println!("Server started successfully (pid {pid}).")
                }
                _ => println!("Server started successfully with {backend}."),
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// stop
// ---------------------------------------------------------------------------

pub fn stop(ctx: &mut AppContext) -> anyhow::Result<()> {
    let server_dir = ctx.server_dir()?;
    let outcome = controller(&mut ctx.store, &server_dir)?
        .stop()
        .context("failed to stop server")?;
    report_stop(&outcome);
    Ok(())
}

fn report_stop(outcome: &StopOutcome) {
    match outcome {
        StopOutcome::NoRecord => warn(
            "cannot get the type of last run, the server cannot be stopped automatically",
        ),
        StopOutcome::MissingPid => warn(
            "cannot find the last run record, the server may not be running at the moment",
        ),
        StopOutcome::AlreadyGone { pid } => warn(&format!(
            "cannot locate the server (pid {pid}) in the system, it may have exited already"
        )),
        StopOutcome::SupervisorConfigMissing { path } => warn(&format!(
            "cannot stop the server with pm2 because {path} is missing, skipping the stop step"
        )),
        StopOutcome::Stopped { .. } => println!("Server has been stopped."),
    }
}

// ---------------------------------------------------------------------------
// restart
// ---------------------------------------------------------------------------

pub fn restart(ctx: &mut AppContext) -> anyhow::Result<()> {
    let server_dir = ctx.server_dir()?;
    ctx.check_env()?;
    if ProcessRecord::read(&ctx.store).backend.is_none() {
        warn("cannot find the last run information, skipping the stop step");
    }

    let plan = controller(&mut ctx.store, &server_dir)?
        .stop_for_restart()
        .context("failed to stop server")?;
    if let Some(stop) = &plan.stop {
        report_stop(stop);
    }
    if start_with(ctx, &server_dir, plan.backend).context("failed to restart server")? {
        println!("Server has been restarted.");
    }
    Ok(())
}
