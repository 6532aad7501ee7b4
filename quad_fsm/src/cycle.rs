//! Fixed-period control cycle: schedule → FSM tick → leg feedback.
//!
//! [`RtSettings::apply`] prepares the process once before the loop:
//! locked memory, a prefaulted stack, optional core pinning and
//! `SCHED_FIFO` priority.
//!
//! ## Cycle Loop
//! With the `rt` feature, absolute-time sleep on `CLOCK_MONOTONIC`; a single
//! overrun ends the loop with `CycleError::CycleOverrun`. Without it,
//! `std::thread::sleep` pacing and overruns are only counted.
//!
//! ## Cycle Body
//! Apply due scripted mode requests, run one FSM tick, then feed the leg
//! data back. In simulation the feedback is kinematic loopback of the
//! commanded foot positions.

use std::sync::atomic::{AtomicBool, Ordering};

use heapless::Vec as HVec;
use quad_common::consts::MAX_SCHEDULE_ENTRIES;
use quad_common::fsm::config::ModeRequest;
use quad_common::leg::Leg;
use quad_common::robot::RunningMode;
use tracing::{debug, info, warn};

use crate::config::{self, LoadedConfig, ReloadResult};
use crate::context::ControlContext;
use crate::fsm::ControlFsm;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CycleError {
    /// RT system call failed.
    RtSetup(String),
    /// Runner could not be built from the configuration.
    Config(String),
    /// Cycle overrun detected.
    CycleOverrun {
        /// Actual cycle duration [ns].
        actual_ns: i64,
        /// Configured cycle budget [ns].
        budget_ns: i64,
    },
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RtSetup(msg) => write!(f, "RT setup error: {msg}"),
            Self::Config(msg) => write!(f, "cycle config error: {msg}"),
            Self::CycleOverrun {
                actual_ns,
                budget_ns,
            } => write!(f, "cycle overrun: {actual_ns}ns > {budget_ns}ns budget"),
        }
    }
}

impl std::error::Error for CycleError {}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Stack touched before the loop starts [bytes].
const STACK_PREFAULT_BYTES: usize = 256 * 1024;

/// Valid `SCHED_FIFO` priorities on Linux.
const FIFO_PRIORITY_RANGE: std::ops::RangeInclusive<i32> = 1..=99;

/// Process setup applied once before the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtSettings {
    /// Core to pin the control thread to; `None` leaves affinity alone.
    pub cpu_core: Option<usize>,
    /// `SCHED_FIFO` priority.
    pub priority: i32,
}

impl RtSettings {
    /// Lock memory, prefault the stack, pin and raise the control thread.
    ///
    /// The priority is checked in every build; the system calls are made
    /// only with the `rt` feature.
    pub fn apply(&self) -> Result<(), CycleError> {
        if !FIFO_PRIORITY_RANGE.contains(&self.priority) {
            return Err(CycleError::RtSetup(format!(
                "priority {} outside SCHED_FIFO range {:?}",
                self.priority, FIFO_PRIORITY_RANGE
            )));
        }

        #[cfg(feature = "rt")]
        {
            use nix::sys::mman::{MlockallFlags, mlockall};
            mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
                .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))?;
        }

        prefault_stack();

        #[cfg(feature = "rt")]
        {
            if let Some(cpu) = self.cpu_core {
                pin_to_core(cpu)?;
            }
            raise_priority(self.priority)?;
        }

        debug!(
            "[CYCLE] RT settings applied: cpu_core={:?}, priority={}, rt={}",
            self.cpu_core,
            self.priority,
            cfg!(feature = "rt")
        );
        Ok(())
    }
}

fn prefault_stack() {
    let mut buf = [0u8; STACK_PREFAULT_BYTES];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn pin_to_core(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("cpu {cpu} not available: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(feature = "rt")]
fn raise_priority(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the FSM, its context and the scripted schedule.
pub struct CycleRunner {
    config: LoadedConfig,
    fsm: ControlFsm,
    ctx: ControlContext,
    schedule: HVec<ModeRequest, MAX_SCHEDULE_ENTRIES>,
    next_request: usize,
    tick: u64,
    stats: CycleStats,
    cycle_time_ns: i64,
    /// Cycles between periodic stats log lines.
    log_interval: u64,
}

impl CycleRunner {
    /// Build the runner and enter Passive.
    pub fn new(config: LoadedConfig) -> Result<Self, CycleError> {
        let mut schedule = HVec::new();
        for req in &config.schedule {
            schedule.push(*req).map_err(|_| {
                CycleError::Config(format!(
                    "schedule exceeds {MAX_SCHEDULE_ENTRIES} entries"
                ))
            })?;
        }

        let dt = config.control.controller_dt;
        let cycle_time_ns = (dt * 1e9).round() as i64;
        let log_interval = ((1.0 / dt).round() as u64).max(1);

        let mut ctx = ControlContext::from_config(&config);
        match ctx.params.running_mode {
            RunningMode::Simulation => {
                for leg in Leg::ALL {
                    ctx.legs.datas[leg.index()].p = ctx.stand_up.fallback(leg);
                }
                ctx.legs.data_valid = true;
            }
            RunningMode::Hardware => {
                warn!("[CYCLE] No hardware leg feedback connected, leg data unavailable");
            }
        }

        let mut fsm = ControlFsm::new();
        fsm.initialize(&mut ctx);

        info!(
            "[CYCLE] Runner ready: dt={}s, robot={:?}, mode={:?}, {} scheduled requests",
            dt,
            ctx.quadruped.robot_type,
            ctx.params.running_mode,
            schedule.len()
        );

        Ok(Self {
            config,
            fsm,
            ctx,
            schedule,
            next_request: 0,
            tick: 0,
            stats: CycleStats::new(),
            cycle_time_ns,
            log_interval,
        })
    }

    /// One cycle body, no pacing.
    pub fn step(&mut self) {
        while let Some(req) = self.schedule.get(self.next_request).copied() {
            if req.at_tick > self.tick {
                break;
            }
            info!("[CYCLE] tick {}: scheduled mode request {}", self.tick, req.mode);
            self.fsm.request_mode(&mut self.ctx, req.mode);
            self.next_request += 1;
        }

        self.fsm.run_tick(&mut self.ctx);

        if self.ctx.params.running_mode == RunningMode::Simulation {
            let legs = &mut self.ctx.legs;
            for (data, cmd) in legs.datas.iter_mut().zip(legs.commands.iter()) {
                if !cmd.is_limp() {
                    data.p = cmd.p_des;
                }
            }
        }

        self.tick += 1;
    }

    /// Run until `shutdown` is set or `max_ticks` cycles have executed.
    pub fn run(&mut self, max_ticks: Option<u64>, shutdown: &AtomicBool) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(max_ticks, shutdown)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(max_ticks, shutdown)
        }
    }

    #[inline]
    fn keep_running(&self, max_ticks: Option<u64>, shutdown: &AtomicBool) -> bool {
        !shutdown.load(Ordering::Relaxed) && max_ticks.is_none_or(|max| self.tick < max)
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, max_ticks: Option<u64>, shutdown: &AtomicBool) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.keep_running(max_ticks, shutdown) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

            self.step();

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, 0);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }
            self.log_periodic();

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            if let Ok(woke) = clock_gettime(clock) {
                let latency = timespec_diff_ns(&woke, &next_wake).abs();
                self.stats.max_latency_ns = self.stats.max_latency_ns.max(latency);
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, max_ticks: Option<u64>, shutdown: &AtomicBool) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns.max(0) as u64);

        while self.keep_running(max_ticks, shutdown) {
            let cycle_start = Instant::now();

            self.step();

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);
            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }
            self.log_periodic();

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    fn log_periodic(&self) {
        if self.tick % self.log_interval == 0 {
            let fsm = self.fsm.stats();
            debug!(
                "[CYCLE] tick={} state={} transitions={} estops={} faults={:?} avg={}ns max={}ns overruns={}",
                self.tick,
                self.fsm.state(),
                fsm.transitions,
                fsm.estops,
                self.fsm.faults(),
                self.stats.avg_cycle_ns(),
                self.stats.max_cycle_ns,
                self.stats.overruns
            );
        }
    }

    /// Hot-reload the gain tables. Denied unless settled in Passive.
    pub fn reload_gains(&mut self, gains_toml: &str) -> ReloadResult {
        let result = config::reload_gains(
            &mut self.config,
            gains_toml,
            self.fsm.state(),
            self.fsm.pending().is_some(),
        );
        match &result {
            ReloadResult::Success => {
                self.ctx.gains = self.config.gains;
                info!("[CYCLE] Gain tables reloaded");
            }
            ReloadResult::ValidationFailed(e) | ReloadResult::Denied(e) => {
                warn!("[CYCLE] Gain reload rejected: {e}");
            }
        }
        result
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn fsm(&self) -> &ControlFsm {
        &self.fsm
    }

    #[inline]
    pub fn context(&self) -> &ControlContext {
        &self.ctx
    }

    /// Mutable context, e.g. to inject an orientation estimate.
    #[inline]
    pub fn context_mut(&mut self) -> &mut ControlContext {
        &mut self.ctx
    }

    #[inline]
    pub fn config(&self) -> &LoadedConfig {
        &self.config
    }

    /// Cycles executed so far.
    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let total = ts.tv_nsec() + ns;
    let secs = ts.tv_sec() + total.div_euclid(1_000_000_000);
    let nanos = total.rem_euclid(1_000_000_000);
    TimeSpec::new(secs, nanos)
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}
