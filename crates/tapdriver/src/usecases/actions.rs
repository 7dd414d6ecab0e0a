//! Tick-interleaved execution of multi-pointer action batches.
//!
//! Every tick, each chain with work left contributes one primitive. Pauses
//! never reach the driver: the tick sleeps once for the longest pause any
//! chain asked for. A cancel from one chain lifts every other pressed pointer
//! before the next tick starts. The first driver failure aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::{ActionBatch, ElementId, Point, PointerAction, PointerOrigin};
use crate::usecases::action_lock::acquire_action_lock;
use crate::usecases::ports::{
    AutomationDriver, Clock, DriverError, ElementRef, Sleeper, saturating_millis,
};
use crate::usecases::session::Session;

/// What a finished batch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleReport {
    pub ticks: usize,
    pub dispatched: usize,
    pub slept: Duration,
}

pub struct ActionChainScheduler<'a> {
    driver: &'a dyn AutomationDriver,
    sleeper: &'a dyn Sleeper,
    resolve: &'a dyn Fn(&ElementId) -> Result<ElementRef, DriverError>,
}

impl<'a> ActionChainScheduler<'a> {
    pub fn new(
        driver: &'a dyn AutomationDriver,
        sleeper: &'a dyn Sleeper,
        resolve: &'a dyn Fn(&ElementId) -> Result<ElementRef, DriverError>,
    ) -> Self {
        Self {
            driver,
            sleeper,
            resolve,
        }
    }

    fn position(&self, origin: &PointerOrigin) -> Result<Point, DriverError> {
        match origin {
            PointerOrigin::Viewport(point) => Ok(*point),
            PointerOrigin::Element { element, offset } => {
                let element = (self.resolve)(element)?;
                let location = self.driver.rect(&element)?.origin();
                Ok(location.offset(offset.x, offset.y))
            }
        }
    }

    pub fn run(&self, batch: &mut ActionBatch) -> Result<ScheduleReport, DriverError> {
        let mut report = ScheduleReport::default();
        loop {
            let mut still_running = false;
            let mut longest_pause = Duration::ZERO;

            for index in 0..batch.len() {
                let chains = batch.chains_mut();
                let Some(action) = chains[index].advance() else {
                    continue;
                };
                still_running = true;

                match action {
                    PointerAction::Pause(duration) => {
                        longest_pause = longest_pause.max(duration);
                    }
                    PointerAction::Down(origin) => {
                        let at = self.position(&origin)?;
                        let ctx = &mut chains[index].context;
                        self.driver.pointer_down(ctx.pointer_id, at)?;
                        ctx.press(at);
                        report.dispatched += 1;
                    }
                    PointerAction::Move(origin) => {
                        let at = self.position(&origin)?;
                        let ctx = &mut chains[index].context;
                        self.driver.pointer_move(ctx.pointer_id, at)?;
                        ctx.move_to(at);
                        report.dispatched += 1;
                    }
                    PointerAction::Up => {
                        let ctx = &mut chains[index].context;
                        self.driver.pointer_up(ctx.pointer_id, ctx.position)?;
                        ctx.release();
                        report.dispatched += 1;
                    }
                    PointerAction::Cancel => {
                        let ctx = &mut chains[index].context;
                        self.driver.pointer_up(ctx.pointer_id, ctx.position)?;
                        ctx.release();
                        report.dispatched += 1;

                        for (other, chain) in chains.iter_mut().enumerate() {
                            if other == index || !chain.context.pressed {
                                continue;
                            }
                            self.driver
                                .pointer_up(chain.context.pointer_id, chain.context.position)?;
                            chain.context.release();
                        }
                    }
                }
            }

            if !still_running {
                break;
            }
            report.ticks += 1;
            if !longest_pause.is_zero() {
                self.sleeper.sleep(longest_pause);
                report.slept += longest_pause;
            }
        }
        Ok(report)
    }
}

/// Runs a batch against a session, one batch at a time.
pub trait PerformActionsUseCase: Send + Sync {
    fn execute(&self, session: &Session, batch: ActionBatch) -> Result<ScheduleReport, DriverError>;
}

pub struct PerformActionsUseCaseImpl {
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl PerformActionsUseCaseImpl {
    pub fn new(clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { clock, sleeper }
    }
}

impl PerformActionsUseCase for PerformActionsUseCaseImpl {
    #[tracing::instrument(skip(self, session, batch), fields(session_id = %session.id(), chains = batch.len()))]
    fn execute(
        &self,
        session: &Session,
        mut batch: ActionBatch,
    ) -> Result<ScheduleReport, DriverError> {
        if batch.is_empty() {
            return Ok(ScheduleReport::default());
        }
        let start = self.clock.now();
        let timeout = session.lock_timeout();
        let _guard = acquire_action_lock(
            session.action_lock(),
            timeout,
            self.clock.as_ref(),
            self.sleeper.as_ref(),
        )
        .ok_or(DriverError::SessionBusy {
            timeout_ms: saturating_millis(timeout),
        })?;

        let driver = session.driver();
        let resolve = |id: &ElementId| session.resolve(id);
        let scheduler = ActionChainScheduler::new(driver.as_ref(), self.sleeper.as_ref(), &resolve);
        let report = scheduler.run(&mut batch)?;
        debug!(
            ticks = report.ticks,
            dispatched = report.dispatched,
            elapsed_ms = self.clock.elapsed_ms(start),
            "Action batch finished"
        );
        Ok(report)
    }
}
