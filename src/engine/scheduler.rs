use std::sync::Arc;

use time::OffsetDateTime;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, warn};

use crate::models::{
    config::SchedulerConfig,
    error::{GiveawayError, GiveawayResult},
    giveaway::Giveaway,
};

use super::{
    announce::{render_closed, render_deadline_notice, render_ended_notice, render_ending_soon},
    selection::{RollOutcome, RollParams},
    GiveawayEngine,
};

/// What one scheduler tick did, by giveaway id.
#[derive(Debug, Default)]
pub struct TickReport {
    pub notified: Vec<i64>,
    pub ended: Vec<i64>,
    /// Giveaways without end automation whose host was told the deadline passed.
    pub deadline_passed: Vec<i64>,
    pub rolled: Vec<i64>,
    pub announced: Vec<i64>,
    pub failed: Vec<(i64, GiveawayError)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.notified.is_empty()
            && self.ended.is_empty()
            && self.deadline_passed.is_empty()
            && self.failed.is_empty()
    }
}

impl GiveawayEngine {
    /// Ends entries on a giveaway if nobody else has, and updates its entry
    /// message. `false` when it had already ended.
    async fn close_entries(&self, giveaway: &Giveaway) -> GiveawayResult<bool> {
        if !self.store.mark_ended(giveaway.id).await? {
            return Ok(false);
        }

        if let Some(message_id) = giveaway.announcement_message_id {
            if let Err(err) = self
                .messenger
                .send_or_edit_or_delete_message(
                    giveaway.channel_id,
                    Some(message_id),
                    Some(&render_closed(giveaway)),
                )
                .await
            {
                warn!(
                    "Could not update entry message for giveaway {}. Failed with error: {:?}",
                    giveaway.id, err
                );
            }
        }

        info!("Ended giveaway {}", giveaway.id);
        Ok(true)
    }

    /// Manual End: closes entries regardless of the automation level. Rolling
    /// and announcing stay separate actions.
    pub async fn end_giveaway(&self, giveaway_id: i64) -> GiveawayResult<bool> {
        let giveaway = self
            .store
            .get_giveaway(giveaway_id)
            .await?
            .ok_or(GiveawayError::giveaway_not_found(giveaway_id))?;
        if giveaway.ended {
            return Ok(false);
        }
        self.close_entries(&giveaway).await
    }

    async fn notify_ending_soon(&self, giveaway: &Giveaway, now: OffsetDateTime) -> GiveawayResult<bool> {
        if !self.store.mark_host_notified(giveaway.id).await? {
            return Ok(false);
        }
        self.deliver_dm(giveaway.host_id, &render_ending_soon(giveaway, now))
            .await;
        Ok(true)
    }

    async fn process_end(&self, giveaway: &Giveaway, report: &mut TickReport) -> GiveawayResult<()> {
        let actions = giveaway.end_automation.actions();

        if !actions.end {
            if self.store.mark_deadline_notified(giveaway.id).await? {
                self.deliver_dm(giveaway.host_id, &render_deadline_notice(giveaway))
                    .await;
                report.deadline_passed.push(giveaway.id);
            }
            return Ok(());
        }

        if !self.close_entries(giveaway).await? {
            debug!("Giveaway {} was already ended elsewhere", giveaway.id);
            return Ok(());
        }
        report.ended.push(giveaway.id);

        let mut outcome: Option<RollOutcome> = None;
        if actions.roll {
            match self.roll_and_sign(RollParams::new(giveaway.id)).await {
                Ok(rolled) => {
                    report.rolled.push(giveaway.id);
                    outcome = Some(rolled);
                }
                Err(err @ GiveawayError::InvalidState(_)) => {
                    warn!(
                        "Could not roll giveaway {} at its end. Failed with error: {:?}",
                        giveaway.id, err
                    );
                    self.deliver_dm(
                        giveaway.host_id,
                        &format!(
                            "{} Winners could not be drawn: {err}.",
                            render_ended_notice(giveaway, None)
                        ),
                    )
                    .await;
                    report.failed.push((giveaway.id, err));
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        self.deliver_dm(
            giveaway.host_id,
            &render_ended_notice(giveaway, outcome.as_ref()),
        )
        .await;

        if let (true, Some(outcome)) = (actions.announce, outcome) {
            let prizes = self.store.get_prizes(giveaway.id).await?;
            self.dispatch_announcement(giveaway, &prizes, &outcome.winners)
                .await?;
            report.announced.push(giveaway.id);
        }

        Ok(())
    }

    /// One pass of the end-of-giveaway scheduler. Only a failure to query due
    /// giveaways fails the tick; anything else is confined to its giveaway.
    pub async fn run_scheduler_tick(
        &self,
        now: OffsetDateTime,
        notify_buffer: time::Duration,
    ) -> GiveawayResult<TickReport> {
        let horizon = match now.checked_add(notify_buffer) {
            Some(horizon) => horizon,
            None => {
                warn!(
                    "Notify buffer {} reaches past the last representable date, sending no ending soon notices",
                    notify_buffer
                );
                now
            }
        };
        let due = self.store.due_giveaways(now, horizon).await?;
        let (to_end, to_notify): (Vec<_>, Vec<_>) =
            due.into_iter().partition(|giveaway| giveaway.is_past_end(now));

        let mut report = TickReport::default();

        for giveaway in to_notify
            .iter()
            .filter(|giveaway| giveaway.is_ending_before(now, horizon))
        {
            match self.notify_ending_soon(giveaway, now).await {
                Ok(true) => report.notified.push(giveaway.id),
                Ok(false) => {}
                Err(err) => {
                    error!(
                        "Could not record host notification for giveaway {}. Failed with error: {:?}",
                        giveaway.id, err
                    );
                    report.failed.push((giveaway.id, err));
                }
            }
        }

        for giveaway in &to_end {
            if let Err(err) = self.process_end(giveaway, &mut report).await {
                error!(
                    "Could not end giveaway {}. Failed with error: {:?}",
                    giveaway.id, err
                );
                report.failed.push((giveaway.id, err));
            }
        }

        Ok(report)
    }
}

struct RunningScheduler {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the background polling task. Whoever holds the scheduler decides
/// whether it runs; `start` refuses to spawn a second loop.
pub struct Scheduler {
    config: SchedulerConfig,
    running: Mutex<Option<RunningScheduler>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Scheduler {
            config,
            running: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Spawns the polling loop. Returns `false` if it is already running.
    pub async fn start(&self, engine: Arc<GiveawayEngine>) -> bool {
        let mut running = self.running.lock().await;
        if running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
        {
            return false;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let poll_interval = self.config.poll_interval;
        let notify_buffer = self.config.notify_buffer;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = shutdown_rx.changed() => break,
                }

                let start = std::time::Instant::now();
                match engine
                    .run_scheduler_tick(OffsetDateTime::now_utc(), notify_buffer)
                    .await
                {
                    Ok(report) if report.is_empty() => {}
                    Ok(report) => debug!(
                        "Giveaway tick: {} notified, {} ended, {} past deadline, {} rolled, {} announced, {} failed",
                        report.notified.len(),
                        report.ended.len(),
                        report.deadline_passed.len(),
                        report.rolled.len(),
                        report.announced.len(),
                        report.failed.len()
                    ),
                    Err(err) => error!("Failed to fetch due giveaways: {}", err),
                }
                debug!(
                    "Finished giveaway tick in {}ms",
                    start.elapsed().as_millis()
                );
            }

            info!("Giveaway scheduler stopped");
        });

        info!(
            "Giveaway scheduler started, polling every {:?}",
            poll_interval
        );
        *running = Some(RunningScheduler { shutdown, task });
        true
    }

    /// Signals the loop to stop and waits for the current tick to finish.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };
        let _ = running.shutdown.send(true);
        if let Err(err) = running.task.await {
            error!("Giveaway scheduler task failed: {:?}", err);
        }
    }
}
