//! Integration tests for the alarm controller, its task, and the override
//! path, against a recording PWM channel.

use std::sync::Barrier;
use std::time::{Duration, Instant};

use airwatch::alarm::{AlarmController, BeepPattern};
use airwatch::drivers::button::OverrideSignal;
use airwatch::drivers::buzzer::BuzzerDriver;

use super::mock_hw::{RecordingPwm, leak_state, wait_until};

const PATTERN: BeepPattern = BeepPattern {
    on: Duration::from_millis(5),
    off: Duration::from_millis(15),
};
/// Generous bound for "within one period" on a loaded CI host.
const SETTLE: Duration = Duration::from_millis(500);
/// Long enough that scheduler jitter is small next to one period.
const SLOW_PATTERN: BeepPattern = BeepPattern {
    on: Duration::from_millis(60),
    off: Duration::from_millis(140),
};
const JITTER: Duration = Duration::from_millis(60);

fn controller() -> (AlarmController<RecordingPwm>, RecordingPwm) {
    controller_with(PATTERN)
}

fn controller_with(pattern: BeepPattern) -> (AlarmController<RecordingPwm>, RecordingPwm) {
    let pwm = RecordingPwm::new();
    let ctl = AlarmController::new(leak_state(), BuzzerDriver::new(pwm.clone(), 50), pattern);
    (ctl, pwm)
}

/// Time from `cancel` until the buzzer's final off write.
fn cancel_latency(
    ctl: &AlarmController<RecordingPwm>,
    pwm: &RecordingPwm,
    cancel: impl FnOnce(),
) -> Duration {
    let at = Instant::now();
    cancel();
    assert!(wait_until(SETTLE * 4, || !ctl.is_task_running()));
    let last = pwm.writes().last().copied().unwrap();
    assert_eq!(last.duty, 0, "buzzer left off");
    last.at.saturating_duration_since(at)
}

#[test]
fn start_sounds_the_beep_pattern() {
    let (ctl, pwm) = controller();
    ctl.start();

    assert!(wait_until(SETTLE, || pwm.on_writes() >= 3));
    assert!(ctl.state().is_active());
    assert!(!ctl.state().is_silenced());
    assert_eq!(ctl.tasks_spawned(), 1);
    ctl.shutdown();
}

#[test]
fn repeated_start_never_yields_two_tasks() {
    let (ctl, pwm) = controller();
    for _ in 0..10 {
        ctl.start();
    }
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 2));
    assert_eq!(ctl.tasks_spawned(), 1);
    assert_eq!(pwm.writer_threads().len(), 1);
    ctl.shutdown();
}

#[test]
fn concurrent_starts_never_yield_two_tasks() {
    let (ctl, pwm) = controller();
    let barrier = Barrier::new(8);
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                barrier.wait();
                ctl.start();
            });
        }
    });

    assert!(wait_until(SETTLE, || pwm.on_writes() >= 2));
    assert_eq!(ctl.tasks_spawned(), 1);
    assert_eq!(pwm.writer_threads().len(), 1);
    ctl.shutdown();
}

#[test]
fn stop_silences_within_a_period_and_restart_sounds_again() {
    let (ctl, pwm) = controller();
    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 1));

    ctl.stop();
    assert!(wait_until(SETTLE, || !ctl.is_task_running()));
    assert!(!pwm.is_on(), "buzzer left off on exit");
    assert!(!ctl.state().is_active());
    assert!(!ctl.state().is_silenced());

    let before = pwm.on_writes();
    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() > before));
    assert_eq!(ctl.tasks_spawned(), 2);
    ctl.shutdown();
}

#[test]
fn stop_resets_silence_so_next_alarm_is_audible() {
    let (ctl, pwm) = controller();
    ctl.start();
    assert!(ctl.request_silence());
    assert!(wait_until(SETTLE, || !ctl.is_task_running()));

    ctl.stop();
    assert!(!ctl.state().is_silenced());

    let before = pwm.on_writes();
    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() > before));
    ctl.shutdown();
}

#[test]
fn override_edge_silences_active_alarm() {
    let (ctl, pwm) = controller();
    let button = OverrideSignal::new(ctl.state());
    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 1));

    assert!(button.on_edge());
    assert!(wait_until(SETTLE, || !ctl.is_task_running()));
    assert!(!pwm.is_on());
    assert!(ctl.state().is_active(), "silence does not disarm");
    assert!(ctl.state().is_silenced());

    // Still Red next cycle: start() must not undo the silence.
    let before = pwm.on_writes();
    ctl.start();
    std::thread::sleep(PATTERN.period() * 3);
    assert_eq!(pwm.on_writes(), before);
    assert_eq!(ctl.tasks_spawned(), 1);
}

#[test]
fn override_edge_while_idle_is_inert() {
    let (ctl, pwm) = controller();
    let button = OverrideSignal::new(ctl.state());

    assert!(!button.on_edge());
    assert!(!ctl.state().is_active());
    assert!(!ctl.state().is_silenced());

    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 1), "earlier edge must not pre-silence");
    ctl.shutdown();
}

#[test]
fn buzzer_fault_ends_task_only() {
    let (ctl, pwm) = controller();
    pwm.set_failing(true);
    ctl.start();

    assert!(wait_until(SETTLE, || ctl.faults() == 1 && !ctl.is_task_running()));
    assert!(ctl.state().is_active(), "fault does not disarm");

    // Hardware recovers; the next Red cycle restarts the task.
    pwm.set_failing(false);
    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 1));
    assert_eq!(ctl.tasks_spawned(), 2);
    ctl.shutdown();
    assert!(!pwm.is_on());
}

#[test]
fn override_silences_within_one_period() {
    let (ctl, pwm) = controller_with(SLOW_PATTERN);
    let button = OverrideSignal::new(ctl.state());
    ctl.start();
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 1));

    let latency = cancel_latency(&ctl, &pwm, || {
        button.on_edge();
    });
    assert!(
        latency <= SLOW_PATTERN.period() + JITTER,
        "silenced after {latency:?}"
    );
}

#[test]
fn stop_quiets_buzzer_within_one_period() {
    let (ctl, pwm) = controller_with(SLOW_PATTERN);
    ctl.start();
    // Land the stop inside the quiet half, the worst case.
    assert!(wait_until(SETTLE, || pwm.on_writes() >= 1 && !pwm.is_on()));

    let latency = cancel_latency(&ctl, &pwm, || ctl.stop());
    assert!(
        latency <= SLOW_PATTERN.period() + JITTER,
        "stopped after {latency:?}"
    );
    ctl.shutdown();
}

#[test]
fn shutdown_joins_every_task_after_concurrent_churn() {
    let (ctl, pwm) = controller();
    let barrier = Barrier::new(4);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                barrier.wait();
                for _ in 0..25 {
                    let at = Instant::now();
                    ctl.start();
                    // start() never waits out a sounding task.
                    assert!(at.elapsed() < PATTERN.period() * 5);
                    ctl.stop();
                }
            });
        }
    });

    ctl.start();
    assert!(wait_until(SETTLE, || ctl.is_task_running()));
    ctl.shutdown();
    assert!(!ctl.is_task_running());

    // No detached task is left to write after shutdown returned.
    let writes = pwm.writes().len();
    std::thread::sleep(PATTERN.period() * 3);
    assert_eq!(pwm.writes().len(), writes);
    assert!(!pwm.is_on());
}
