//! Cron registry
//!
//! One timer per scheduled pipeline. Each started timer runs in its own
//! tokio task: it sleeps until the next fire time, records the fire, awaits
//! the callback and only then computes the following fire time, so fires of
//! one timer never overlap.

use chrono::{DateTime, Utc};
use cron::Schedule;
use rollout_core::domain::CronJobDescriptor;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Clock, CronError, expression};

/// Number of upcoming fire times reported by descriptors
pub const DEFAULT_NEXT_RUNS: usize = 5;

type FireFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type OnFire = Arc<dyn Fn() -> FireFuture + Send + Sync>;

#[derive(Debug, Default)]
struct TimerState {
    is_started: bool,
    is_running: bool,
    last_run: Option<DateTime<Utc>>,
}

struct Timer {
    name: String,
    schedule: Schedule,
    on_fire: OnFire,
    state: Arc<Mutex<TimerState>>,
    handle: Option<JoinHandle<()>>,
}

/// Owned set of cron timers keyed by name, in registration order
pub struct CronRegistry {
    clock: Arc<dyn Clock>,
    timers: Mutex<Vec<Timer>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CronRegistry {
    /// Creates an empty registry reading time from `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: Mutex::new(Vec::new()),
        }
    }

    /// Creates a stopped timer
    ///
    /// # Arguments
    /// * `name` - Timer key, unique within the registry
    /// * `expression` - Cron expression (5, 6 or 7 fields)
    /// * `on_fire` - Callback awaited on every fire
    pub fn register<F, Fut>(&self, name: &str, expression: &str, on_fire: F) -> Result<(), CronError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let schedule = expression::parse(expression)?;

        let mut timers = lock(&self.timers);
        if timers.iter().any(|timer| timer.name == name) {
            return Err(CronError::DuplicateJob(name.to_string()));
        }

        debug!("Registered cron job '{}' ({})", name, expression);
        timers.push(Timer {
            name: name.to_string(),
            schedule,
            on_fire: Arc::new(move || -> FireFuture { Box::pin(on_fire()) }),
            state: Arc::new(Mutex::new(TimerState::default())),
            handle: None,
        });

        Ok(())
    }

    /// Starts every registered timer that is not running yet
    pub fn start(&self) {
        let mut timers = lock(&self.timers);
        for timer in timers.iter_mut() {
            self.start_timer(timer);
        }
        info!("Started {} cron job(s)", timers.len());
    }

    /// Starts a single timer
    pub fn start_job(&self, name: &str) -> Result<(), CronError> {
        let mut timers = lock(&self.timers);
        let timer = timers
            .iter_mut()
            .find(|timer| timer.name == name)
            .ok_or_else(|| CronError::UnknownJob(name.to_string()))?;

        self.start_timer(timer);
        Ok(())
    }

    /// Aborts every running timer
    pub fn stop(&self) {
        let mut timers = lock(&self.timers);
        for timer in timers.iter_mut() {
            if let Some(handle) = timer.handle.take() {
                handle.abort();
                debug!("Stopped cron job '{}'", timer.name);
            }
            let mut state = lock(&timer.state);
            state.is_started = false;
            state.is_running = false;
        }
    }

    fn start_timer(&self, timer: &mut Timer) {
        if timer.handle.is_some() {
            return;
        }

        lock(&timer.state).is_started = true;

        let name = timer.name.clone();
        let schedule = timer.schedule.clone();
        let on_fire = Arc::clone(&timer.on_fire);
        let state = Arc::clone(&timer.state);
        let clock = Arc::clone(&self.clock);

        timer.handle = Some(tokio::spawn(async move {
            run_timer(name, schedule, clock, state, on_fire).await;
        }));
    }

    // =============================================================================
    // Snapshots
    // =============================================================================

    /// Returns the descriptor of one timer
    pub fn descriptor(&self, name: &str) -> Option<CronJobDescriptor> {
        let timers = lock(&self.timers);
        timers
            .iter()
            .find(|timer| timer.name == name)
            .map(|timer| self.snapshot(timer))
    }

    /// Returns the descriptors of all timers in registration order
    pub fn descriptors(&self) -> Vec<CronJobDescriptor> {
        let timers = lock(&self.timers);
        timers.iter().map(|timer| self.snapshot(timer)).collect()
    }

    /// Next `count` fire times of a timer, from the clock's current time
    pub fn next_runs(&self, name: &str, count: usize) -> Option<Vec<DateTime<Utc>>> {
        self.next_runs_from(name, self.clock.now(), count)
    }

    /// Next `count` fire times of a timer strictly after `from`
    pub fn next_runs_from(
        &self,
        name: &str,
        from: DateTime<Utc>,
        count: usize,
    ) -> Option<Vec<DateTime<Utc>>> {
        let timers = lock(&self.timers);
        timers
            .iter()
            .find(|timer| timer.name == name)
            .map(|timer| timer.schedule.after(&from).take(count).collect())
    }

    pub fn len(&self) -> usize {
        lock(&self.timers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self, timer: &Timer) -> CronJobDescriptor {
        let state = lock(&timer.state);
        CronJobDescriptor {
            name: timer.name.clone(),
            is_started: state.is_started,
            is_running: state.is_running,
            last_run: state.last_run,
            next_runs: timer
                .schedule
                .after(&self.clock.now())
                .take(DEFAULT_NEXT_RUNS)
                .collect(),
        }
    }
}

impl Drop for CronRegistry {
    fn drop(&mut self) {
        for timer in lock(&self.timers).iter_mut() {
            if let Some(handle) = timer.handle.take() {
                handle.abort();
            }
        }
    }
}

/// Timer loop: sleep, fire, repeat until the schedule is exhausted
async fn run_timer(
    name: String,
    schedule: Schedule,
    clock: Arc<dyn Clock>,
    state: Arc<Mutex<TimerState>>,
    on_fire: OnFire,
) {
    loop {
        let last_run = lock(&state).last_run;
        // A frozen clock never passes the last fire, so count from there
        let now = match last_run {
            Some(last) if last > clock.now() => last,
            _ => clock.now(),
        };

        let Some(next) = schedule.after(&now).next() else {
            warn!("Cron job '{}' has no upcoming fire time, stopping", name);
            break;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        debug!("Cron job '{}' fires at {} (in {:?})", name, next, wait);
        tokio::time::sleep(wait).await;

        {
            let mut state = lock(&state);
            state.last_run = Some(next);
            state.is_running = true;
        }

        info!("Cron job '{}' fired", name);
        on_fire().await;

        lock(&state).is_running = false;
    }

    lock(&state).is_started = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::FixedClock;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // 2018-03-13T00:00:00Z, a Tuesday
    const REFERENCE_MILLIS: i64 = 1_520_899_200_000;

    fn registry() -> CronRegistry {
        let clock = FixedClock::from_millis(REFERENCE_MILLIS).unwrap();
        CronRegistry::new(Arc::new(clock))
    }

    fn millis(runs: &[DateTime<Utc>]) -> Vec<i64> {
        runs.iter().map(|run| run.timestamp_millis()).collect()
    }

    #[test]
    fn test_next_runs_noon_on_weekdays() {
        let crons = registry();
        crons.register("noon", "0 0 0 12 * * MON-FRI", || async {}).unwrap();

        let runs = crons.next_runs("noon", 5).unwrap();
        assert_eq!(
            millis(&runs),
            vec![
                1_520_942_400_000,
                1_521_028_800_000,
                1_521_115_200_000,
                1_521_201_600_000,
                1_521_460_800_000,
            ]
        );
    }

    #[test]
    fn test_next_runs_every_five_minutes() {
        let crons = registry();
        crons.register("often", "0 */5 * * * MON-FRI", || async {}).unwrap();

        let runs = crons.next_runs("often", 5).unwrap();
        assert_eq!(
            millis(&runs),
            vec![
                1_520_899_500_000,
                1_520_899_800_000,
                1_520_900_100_000,
                1_520_900_400_000,
                1_520_900_700_000,
            ]
        );
    }

    #[test]
    fn test_next_runs_are_strictly_increasing_from_any_point() {
        let crons = registry();
        crons.register("often", "*/10 * * * * *", || async {}).unwrap();

        let from = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 5).unwrap();
        let runs = crons.next_runs_from("often", from, 5).unwrap();
        assert_eq!(runs.len(), 5);
        assert!(runs.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(runs[0] > from);
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_expressions() {
        let crons = registry();
        crons.register("job", "0 * * * * *", || async {}).unwrap();

        assert_eq!(
            crons.register("job", "0 * * * * *", || async {}),
            Err(CronError::DuplicateJob("job".to_string()))
        );
        assert!(matches!(
            crons.register("other", "not a cron", || async {}),
            Err(CronError::InvalidExpression { .. })
        ));
        assert_eq!(crons.len(), 1);
    }

    #[test]
    fn test_descriptors_keep_registration_order() {
        let crons = registry();
        crons.register("b", "0 * * * * *", || async {}).unwrap();
        crons.register("a", "0 * * * * *", || async {}).unwrap();

        let names: Vec<String> = crons.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);

        let descriptor = crons.descriptor("a").unwrap();
        assert!(!descriptor.is_started);
        assert!(!descriptor.is_running);
        assert!(descriptor.last_run.is_none());
        assert_eq!(descriptor.next_runs.len(), DEFAULT_NEXT_RUNS);
        assert!(crons.descriptor("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_job_records_last_run() {
        let crons = registry();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        crons
            .register("noon", "0 0 0 12 * * MON-FRI", move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();
        crons.register("idle", "0 0 0 12 * * MON-FRI", || async {}).unwrap();

        crons.start_job("noon").unwrap();
        assert!(crons.descriptor("noon").unwrap().is_started);
        assert!(!crons.descriptor("idle").unwrap().is_started);

        tokio::time::sleep(Duration::from_secs(13 * 3600)).await;

        let noon = crons.descriptor("noon").unwrap();
        assert_eq!(
            noon.last_run.map(|run| run.timestamp_millis()),
            Some(1_520_942_400_000)
        );
        assert!(!noon.is_running);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(crons.descriptor("idle").unwrap().last_run.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_running_while_callback_is_pending() {
        let crons = registry();
        let release = Arc::new(tokio::sync::Notify::new());

        let gate = Arc::clone(&release);
        crons
            .register("often", "0 */5 * * * *", move || {
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                }
            })
            .unwrap();

        crons.start_job("often").unwrap();
        tokio::time::sleep(Duration::from_secs(301)).await;

        let firing = crons.descriptor("often").unwrap();
        assert!(firing.is_running);
        assert_eq!(
            firing.last_run.map(|run| run.timestamp_millis()),
            Some(1_520_899_500_000)
        );

        release.notify_one();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let settled = crons.descriptor("often").unwrap();
        assert!(!settled.is_running);
        assert!(settled.is_started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_timers() {
        let crons = registry();
        crons.register("often", "0 */5 * * * *", || async {}).unwrap();

        crons.start();
        assert!(crons.descriptor("often").unwrap().is_started);

        crons.stop();
        tokio::time::sleep(Duration::from_secs(600)).await;

        let descriptor = crons.descriptor("often").unwrap();
        assert!(!descriptor.is_started);
        assert!(descriptor.last_run.is_none());
    }

    #[test]
    fn test_start_unknown_job() {
        let crons = registry();
        assert_eq!(
            crons.start_job("missing"),
            Err(CronError::UnknownJob("missing".to_string()))
        );
    }
}
