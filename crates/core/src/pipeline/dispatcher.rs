//! The dispatch loop.
//!
//! A single task owns the job queues and the in-flight count. Everything
//! else talks to it through [`DispatchCommand`]s, so the queue state has
//! exactly one writer.
//!
//! The loop also keeps a sender to its own channel for re-arming, so the
//! channel never closes by itself. Shutdown is signalled out of band: the
//! builder holds the `watch` sender and dropping it ends the loop once the
//! queues are idle.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::job::BuildJob;
use super::queue::JobQueue;
use super::types::{Stage, WorkerStatus};
use super::worker::WorkerPool;
use crate::metrics;

/// Messages handled by the dispatch loop.
pub(crate) enum DispatchCommand {
    /// Queue a batch's jobs for the primary stage.
    Submit(Vec<BuildJob>),
    /// A dispatched stage finished. `next` goes to the secondary queue.
    StageComplete {
        stage: Stage,
        next: Option<BuildJob>,
    },
    /// Scheduled re-arm.
    Pump,
    Status(oneshot::Sender<QueueSnapshot>),
}

/// Queue state as seen by the dispatch loop.
#[derive(Debug, Clone)]
pub(crate) struct QueueSnapshot {
    pub(crate) capacity: usize,
    pub(crate) in_flight: usize,
    pub(crate) primary_queued: usize,
    pub(crate) secondary_queued: usize,
    pub(crate) workers: Vec<WorkerStatus>,
}

pub(crate) struct Dispatcher {
    queue: JobQueue,
    pool: WorkerPool,
    commands: mpsc::Receiver<DispatchCommand>,
    tx: mpsc::Sender<DispatchCommand>,
    shutdown: watch::Receiver<()>,
    delay: Duration,
    pump_scheduled: bool,
    shutting_down: bool,
}

impl Dispatcher {
    pub(crate) fn new(
        pool: WorkerPool,
        commands: mpsc::Receiver<DispatchCommand>,
        tx: mpsc::Sender<DispatchCommand>,
        shutdown: watch::Receiver<()>,
        delay: Duration,
    ) -> Self {
        Self {
            queue: JobQueue::new(pool.size()),
            pool,
            commands,
            tx,
            shutdown,
            delay,
            pump_scheduled: false,
            shutting_down: false,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(capacity = self.queue.capacity(), "Dispatcher started");

        loop {
            // Buffered commands go first so a batch submitted just before
            // the builder was dropped still runs.
            let command = tokio::select! {
                biased;
                command = self.commands.recv() => command,
                _ = self.shutdown.changed(), if !self.shutting_down => {
                    debug!("Builder dropped, draining queues");
                    self.shutting_down = true;
                    if self.queue.is_idle() {
                        break;
                    }
                    continue;
                }
            };
            let Some(command) = command else {
                break;
            };

            match command {
                DispatchCommand::Submit(jobs) => {
                    for job in jobs {
                        self.queue.push_primary(job);
                    }
                    self.pump();
                }
                DispatchCommand::StageComplete { stage, next } => {
                    self.queue.complete();
                    metrics::IN_FLIGHT.dec();
                    if let Some(job) = next {
                        debug!(media_id = %job.id(), %stage, "Queued for augmentation");
                        self.queue.push_secondary(job);
                    }
                    self.schedule_pump();
                }
                DispatchCommand::Pump => {
                    self.pump_scheduled = false;
                    self.pump();
                }
                DispatchCommand::Status(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }

            if self.shutting_down && self.queue.is_idle() {
                break;
            }
        }

        debug!("Dispatcher stopped");
    }

    /// Dispatches queued jobs until the cap is reached or the queues drain.
    fn pump(&mut self) {
        while let Some((stage, job)) = self.queue.next_job() {
            metrics::IN_FLIGHT.inc();
            self.pool.dispatch(stage, job, self.tx.clone());
        }
    }

    /// Re-arms the pump after the configured delay. At most one re-arm is
    /// pending at a time.
    fn schedule_pump(&mut self) {
        if self.pump_scheduled {
            return;
        }
        self.pump_scheduled = true;

        let tx = self.tx.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            let _ = tx.send(DispatchCommand::Pump).await;
        });
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            capacity: self.queue.capacity(),
            in_flight: self.queue.in_flight(),
            primary_queued: self.queue.primary_len(),
            secondary_queued: self.queue.secondary_len(),
            workers: self.pool.status(),
        }
    }
}
