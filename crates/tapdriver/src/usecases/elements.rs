use std::sync::Arc;

use crate::domain::{ElementId, Locator};
use crate::usecases::implicit_wait::poll_until;
use crate::usecases::ports::{Clock, DriverError, Sleeper};
use crate::usecases::session::Session;

/// Element lookup honouring the session's implicit wait.
pub trait FindElementUseCase: Send + Sync {
    fn find_one(
        &self,
        session: &Session,
        locator: &Locator,
        root: Option<&str>,
    ) -> Result<ElementId, DriverError>;

    fn find_all(
        &self,
        session: &Session,
        locator: &Locator,
        root: Option<&str>,
    ) -> Result<Vec<ElementId>, DriverError>;

    fn active(&self, session: &Session) -> Result<ElementId, DriverError>;
}

pub struct FindElementUseCaseImpl {
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl FindElementUseCaseImpl {
    pub fn new(clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { clock, sleeper }
    }
}

fn not_found(locator: &Locator) -> DriverError {
    DriverError::NoSuchElement(format!(
        "An element could not be located on the page using the given search parameters ({locator})"
    ))
}

impl FindElementUseCase for FindElementUseCaseImpl {
    #[tracing::instrument(skip(self, session), fields(session_id = %session.id(), locator = %locator))]
    fn find_one(
        &self,
        session: &Session,
        locator: &Locator,
        root: Option<&str>,
    ) -> Result<ElementId, DriverError> {
        let root = root.map(|id| session.resolve(id)).transpose()?;
        let driver = session.driver();
        let found = poll_until(
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            session.timeouts().implicit_wait,
            session.poll_interval(),
            || driver.find_element(locator, root.as_ref()),
        )?;
        found
            .map(|element| session.register(element))
            .ok_or_else(|| not_found(locator))
    }

    #[tracing::instrument(skip(self, session), fields(session_id = %session.id(), locator = %locator))]
    fn find_all(
        &self,
        session: &Session,
        locator: &Locator,
        root: Option<&str>,
    ) -> Result<Vec<ElementId>, DriverError> {
        let root = root.map(|id| session.resolve(id)).transpose()?;
        let driver = session.driver();
        let found = poll_until(
            self.clock.as_ref(),
            self.sleeper.as_ref(),
            session.timeouts().implicit_wait,
            session.poll_interval(),
            || {
                driver
                    .find_elements(locator, root.as_ref())
                    .map(|elements| (!elements.is_empty()).then_some(elements))
            },
        )?;
        Ok(session.register_all(found.unwrap_or_default()))
    }

    fn active(&self, session: &Session) -> Result<ElementId, DriverError> {
        session
            .driver()
            .active_element()?
            .map(|element| session.register(element))
            .ok_or_else(|| DriverError::NoSuchElement("No element has focus".to_string()))
    }
}
