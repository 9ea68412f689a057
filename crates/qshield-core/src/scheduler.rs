//! Native timer scheduler: one thread per periodic task.
//!
//! The dashboard lives behind one mutex and each tick holds the lock for its
//! whole read-modify-write-project sequence, so ticks from different timers
//! never interleave. Each timer sleeps on its own stop channel; dropping the
//! sender or sending on it wakes the thread and ends it.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::chart::ChartBackend;
use crate::dashboard::Dashboard;
use crate::display::DisplaySurface;

pub type SharedDashboard<S, C> = Arc<Mutex<Dashboard<S, C>>>;

type Tick<S, C> = fn(&mut Dashboard<S, C>);

struct Timer {
    name: &'static str,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<u64>>,
    ticks: u64,
}

pub struct Scheduler<S, C>
where
    S: DisplaySurface + Send + 'static,
    C: ChartBackend + Send + 'static,
{
    dashboard: SharedDashboard<S, C>,
    timers: Vec<Timer>,
    shut_down: bool,
}

impl<S, C> Scheduler<S, C>
where
    S: DisplaySurface + Send + 'static,
    C: ChartBackend + Send + 'static,
{
    /// Spawn the mutation, chart and event timers with the dashboard's periods.
    pub fn start(dashboard: SharedDashboard<S, C>) -> Self {
        let (mutation, chart, event) = {
            let d = dashboard.lock().unwrap_or_else(|e| e.into_inner());
            let c = d.config();
            (c.mutation_period(), c.chart_period(), c.event_period())
        };

        let timers = vec![
            spawn_timer("mutation", mutation, &dashboard, |d| {
                d.mutation_tick();
            }),
            spawn_timer("chart", chart, &dashboard, |d| {
                d.chart_tick();
            }),
            spawn_timer("event", event, &dashboard, |d| {
                d.event_tick();
            }),
        ];
        log::info!(
            "scheduler started: mutation {}ms, chart {}ms, event {}ms",
            mutation.as_millis(),
            chart.as_millis(),
            event.as_millis()
        );
        Self {
            dashboard,
            timers,
            shut_down: false,
        }
    }

    pub fn dashboard(&self) -> SharedDashboard<S, C> {
        Arc::clone(&self.dashboard)
    }

    /// True while any timer thread is still scheduled.
    pub fn is_running(&self) -> bool {
        self.timers.iter().any(|t| t.stop.is_some())
    }

    /// Ticks completed per timer; final once the scheduler has shut down.
    pub fn tick_counts(&self) -> Vec<(&'static str, u64)> {
        self.timers.iter().map(|t| (t.name, t.ticks)).collect()
    }

    /// Stop and join every timer, then tear the dashboard down. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        for timer in &mut self.timers {
            if let Some(stop) = timer.stop.take() {
                let _ = stop.send(());
            }
        }
        for timer in &mut self.timers {
            if let Some(handle) = timer.handle.take() {
                match handle.join() {
                    Ok(ticks) => timer.ticks = ticks,
                    Err(_) => log::warn!("{} timer panicked", timer.name),
                }
            }
        }

        let mut dashboard = self.dashboard.lock().unwrap_or_else(|e| e.into_inner());
        dashboard.teardown();
        log::info!("scheduler stopped: {:?}", self.tick_counts());
    }
}

impl<S, C> Drop for Scheduler<S, C>
where
    S: DisplaySurface + Send + 'static,
    C: ChartBackend + Send + 'static,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_timer<S, C>(
    name: &'static str,
    period: Duration,
    dashboard: &SharedDashboard<S, C>,
    tick: Tick<S, C>,
) -> Timer
where
    S: DisplaySurface + Send + 'static,
    C: ChartBackend + Send + 'static,
{
    let (stop, rx) = mpsc::channel::<()>();
    let dashboard = Arc::clone(dashboard);
    let spawned = thread::Builder::new()
        .name(format!("qshield-{name}"))
        .spawn(move || {
            let mut ticks = 0u64;
            loop {
                match rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Ok(mut d) = dashboard.lock() else {
                            log::warn!("{name} timer: dashboard lock poisoned, stopping");
                            break;
                        };
                        tick(&mut d);
                        ticks += 1;
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            ticks
        });

    match spawned {
        Ok(handle) => Timer {
            name,
            stop: Some(stop),
            handle: Some(handle),
            ticks: 0,
        },
        Err(e) => {
            log::warn!("could not spawn {name} timer: {e}");
            Timer {
                name,
                stop: None,
                handle: None,
                ticks: 0,
            }
        }
    }
}
