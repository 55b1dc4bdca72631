//! Audible alarm: shared alarm state and the supervised buzzer task.
//!
//! Three execution contexts touch the alarm:
//!
//! ```text
//!  Sampler (cooperative) ──start()/stop()──┐
//!                                          ▼
//!  Override ISR ──request_silence()──▶ AlarmState (one atomic word)
//!                                          ▲
//!  Alarm task (own thread) ──should_sound()┘──▶ BuzzerDriver
//! ```
//!
//! ## State word
//!
//! `active` and `silenced` live in one `AtomicU32` and every update is a
//! single CAS, so no reader can observe a torn pair:
//!
//! | Operation           | Transition                                      |
//! |---------------------|-------------------------------------------------|
//! | `arm`               | inactive → `ACTIVE` (silence cleared); else no-op |
//! | `disarm`            | any → `0`                                       |
//! | `request_silence`   | `ACTIVE` → `ACTIVE \| SILENCED`; else no-op     |
//!
//! `request_silence` is lock-free and allocation-free, which makes it the
//! only alarm operation callable from interrupt context.
//!
//! ## Task lifecycle
//!
//! At most one alarm task exists, gated by the `running` flag.  The task
//! sounds `on` then stays quiet for the rest of the period, and checks the
//! state word once per period, so `stop()` and a silence request both take
//! effect within one period.  On exit the buzzer is always left off.  The
//! task re-checks the state after clearing `running`; a `start()` that
//! raced its exit is therefore never lost.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use embedded_hal::pwm::SetDutyCycle;
use log::{error, info, warn};

use crate::app::ports::AlarmPort;
use crate::config::SystemConfig;
use crate::drivers::buzzer::BuzzerDriver;
use crate::drivers::task_pin::{self, ALARM_TASK};
use crate::error::AlarmFault;

const ACTIVE: u32 = 0b01;
const SILENCED: u32 = 0b10;

// ═══════════════════════════════════════════════════════════════
//  Shared state
// ═══════════════════════════════════════════════════════════════

/// The node's one alarm.  Interrupt handlers reach it by address, so it
/// lives in a `static` rather than behind an `Arc`.
pub static ALARM_STATE: AlarmState = AlarmState::new();

/// `active` / `silenced` flag pair shared by the sampler, the alarm task,
/// and the override interrupt.
#[derive(Debug, Default)]
pub struct AlarmState {
    flags: AtomicU32,
}

impl AlarmState {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU32::new(0),
        }
    }

    /// Set `active`.  Returns `true` when this was an inactive → active
    /// transition (the only transition that clears `silenced`).
    pub fn arm(&self) -> bool {
        self.flags
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| {
                (f & ACTIVE == 0).then_some(ACTIVE)
            })
            .is_ok()
    }

    /// Clear both flags.  Returns `true` if the alarm was active.
    pub fn disarm(&self) -> bool {
        self.flags.swap(0, Ordering::SeqCst) & ACTIVE != 0
    }

    /// Set `silenced` if and only if `active`.  Returns `true` when the
    /// request changed the state.  Interrupt-safe.
    pub fn request_silence(&self) -> bool {
        self.flags
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| {
                (f == ACTIVE).then_some(ACTIVE | SILENCED)
            })
            .is_ok()
    }

    pub fn is_active(&self) -> bool {
        self.flags.load(Ordering::SeqCst) & ACTIVE != 0
    }

    pub fn is_silenced(&self) -> bool {
        self.flags.load(Ordering::SeqCst) & SILENCED != 0
    }

    /// `active && !silenced`, read in one load.
    pub fn should_sound(&self) -> bool {
        self.flags.load(Ordering::SeqCst) == ACTIVE
    }
}

// ═══════════════════════════════════════════════════════════════
//  Beep pattern
// ═══════════════════════════════════════════════════════════════

/// One alarm period: `on` audible, then `off` quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPattern {
    pub on: Duration,
    pub off: Duration,
}

impl BeepPattern {
    pub fn from_config(config: &SystemConfig) -> Self {
        let on_ms = config.buzzer_on_ms.min(config.buzzer_period_ms);
        Self {
            on: Duration::from_millis(on_ms as u64),
            off: Duration::from_millis((config.buzzer_period_ms - on_ms) as u64),
        }
    }

    pub fn period(&self) -> Duration {
        self.on + self.off
    }
}

impl Default for BeepPattern {
    fn default() -> Self {
        Self {
            on: Duration::from_millis(50),
            off: Duration::from_millis(950),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Controller
// ═══════════════════════════════════════════════════════════════

struct Shared<P> {
    state: &'static AlarmState,
    pattern: BeepPattern,
    buzzer: Mutex<BuzzerDriver<P>>,
    /// Gate for the at-most-one alarm task.
    running: AtomicBool,
    spawned: AtomicU32,
    faults: AtomicU32,
}

impl<P: SetDutyCycle> Shared<P> {
    fn buzzer(&self) -> MutexGuard<'_, BuzzerDriver<P>> {
        match self.buzzer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record_fault(&self, fault: AlarmFault) {
        self.faults.fetch_add(1, Ordering::Relaxed);
        error!("ALARM: task fault: {}", fault);
    }
}

/// Owner of the alarm task.  `start` / `stop` are the whole control
/// surface; the override interrupt talks to [`AlarmState`] directly.
pub struct AlarmController<P> {
    shared: Arc<Shared<P>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<P> AlarmController<P>
where
    P: SetDutyCycle + Send + 'static,
{
    pub fn new(state: &'static AlarmState, buzzer: BuzzerDriver<P>, pattern: BeepPattern) -> Self {
        Self {
            shared: Arc::new(Shared {
                state,
                pattern,
                buzzer: Mutex::new(buzzer),
                running: AtomicBool::new(false),
                spawned: AtomicU32::new(0),
                faults: AtomicU32::new(0),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Arm the alarm and make sure exactly one task is sounding it.
    /// Idempotent while active; a silenced alarm stays silenced.
    pub fn start(&self) {
        if self.shared.state.arm() {
            info!("ALARM: armed");
        }
        self.ensure_task();
    }

    /// Disarm the alarm.  The task notices within one period and leaves
    /// the buzzer off.
    pub fn stop(&self) {
        if self.shared.state.disarm() {
            info!("ALARM: disarmed");
        }
    }

    /// Same transition the override interrupt performs.
    pub fn request_silence(&self) -> bool {
        let changed = self.shared.state.request_silence();
        if changed {
            info!("ALARM: silenced");
        }
        changed
    }

    pub fn state(&self) -> &'static AlarmState {
        self.shared.state
    }

    /// An alarm task is currently alive.
    pub fn is_task_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Alarm tasks spawned since construction.
    pub fn tasks_spawned(&self) -> u32 {
        self.shared.spawned.load(Ordering::Relaxed)
    }

    /// Alarm tasks that ended on a buzzer fault or failed to spawn.
    pub fn faults(&self) -> u32 {
        self.shared.faults.load(Ordering::Relaxed)
    }

    /// The buzzer is currently driven.
    pub fn is_sounding(&self) -> bool {
        self.shared.buzzer().is_sounding()
    }

    /// Disarm and wait for the task to finish (at most one period).
    pub fn shutdown(&self) {
        self.stop();
        if let Some(handle) = self.take_handle() {
            if handle.join().is_err() {
                warn!("ALARM: task panicked");
            }
        }
    }

    fn handle_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.handle.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn take_handle(&self) -> Option<JoinHandle<()>> {
        self.handle_slot().take()
    }

    fn ensure_task(&self) {
        if !self.shared.state.should_sound() {
            return;
        }
        // Held across gate, spawn, join and store: a second caller either
        // loses the gate or finds the slot already holding a finished task.
        let mut slot = self.handle_slot();
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let shared = Arc::clone(&self.shared);
        match task_pin::spawn_on_core(ALARM_TASK, move || run_alarm_task(&shared)) {
            Ok(handle) => {
                self.shared.spawned.fetch_add(1, Ordering::Relaxed);
                // The previous task already cleared `running` and lost the
                // re-check to us, so it is on its way out.
                if let Some(prev) = slot.replace(handle) {
                    if prev.join().is_err() {
                        warn!("ALARM: previous task panicked");
                    }
                }
            }
            Err(e) => {
                warn!("ALARM: spawn failed: {}", e);
                self.shared.running.store(false, Ordering::SeqCst);
                self.shared.record_fault(AlarmFault::SpawnFailed);
            }
        }
    }
}

impl<P> AlarmPort for AlarmController<P>
where
    P: SetDutyCycle + Send + 'static,
{
    fn start(&self) {
        AlarmController::start(self);
    }

    fn stop(&self) {
        AlarmController::stop(self);
    }

    fn is_active(&self) -> bool {
        self.shared.state.is_active()
    }

    fn is_silenced(&self) -> bool {
        self.shared.state.is_silenced()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alarm task body
// ═══════════════════════════════════════════════════════════════

fn run_alarm_task<P: SetDutyCycle>(shared: &Shared<P>) {
    info!("ALARM: task started");
    loop {
        let outcome = sound_while_armed(shared);

        if let Err(e) = shared.buzzer().silence() {
            warn!("ALARM: could not force buzzer off: {}", e);
        }
        shared.running.store(false, Ordering::SeqCst);

        if let Err(fault) = outcome {
            shared.record_fault(fault);
            break;
        }

        // Re-armed between the last check and clearing `running`.
        if shared.state.should_sound()
            && shared
                .running
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            continue;
        }
        break;
    }
    info!("ALARM: task exited");
}

fn sound_while_armed<P: SetDutyCycle>(shared: &Shared<P>) -> Result<(), AlarmFault> {
    while shared.state.should_sound() {
        shared.buzzer().sound()?;
        std::thread::sleep(shared.pattern.on);
        shared.buzzer().silence()?;
        std::thread::sleep(shared.pattern.off);
    }
    Ok(())
}
