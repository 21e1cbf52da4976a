//! Scan Lifecycle Controller
//!
//! Owns the scan state, the last fix and the latest heading, and sequences the
//! two suspension points: location acquisition and the place query.
//!
//! Every acquisition and every scan takes a fresh generation number. A reset
//! bumps the generation, so a collaborator that completes after the user moved
//! on finds a mismatch and its result is dropped.

use futures::{Stream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::state::{
    ScanFault, ScanRejected, ScanSnapshot, ScanState, StatusMessage, TriggerAction, SECTOR_CLEAR,
};
use crate::ai::PlaceQuery;
use crate::config::ScanConfig;
use crate::models::{Fix, Place};
use crate::sensors::{HeadingCell, LocationError, LocationProvider, OrientationReading};

struct Inner {
    state: ScanState,
    fix: Option<Fix>,
    target: Option<Place>,
    message: Option<StatusMessage>,
    generation: u64,
    scan_id: Option<Uuid>,
}

impl Inner {
    fn fail(&mut self, fault: ScanFault) -> ScanState {
        self.state = ScanState::Error;
        self.target = None;
        self.message = Some(StatusMessage::fault(&fault));
        self.state
    }
}

/// Drives one compass session
pub struct ScanController {
    location: Arc<dyn LocationProvider>,
    query: Arc<dyn PlaceQuery>,
    config: ScanConfig,
    inner: Mutex<Inner>,
    heading: HeadingCell,
}

impl ScanController {
    /// Create a controller in its startup state.
    ///
    /// The state is LOCATING when the platform has a location capability and
    /// ERROR otherwise; call [`start`](Self::start) to run the acquisition.
    pub fn new(
        location: Arc<dyn LocationProvider>,
        query: Arc<dyn PlaceQuery>,
        config: ScanConfig,
    ) -> Self {
        let mut inner = Inner {
            state: ScanState::Locating,
            fix: None,
            target: None,
            message: None,
            generation: 0,
            scan_id: None,
        };
        if !location.is_available() {
            inner.fail(ScanFault::CapabilityMissing);
        }

        Self {
            location,
            query,
            config,
            inner: Mutex::new(inner),
            heading: HeadingCell::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ScanState {
        self.lock().state
    }

    pub fn fix(&self) -> Option<Fix> {
        self.lock().fix
    }

    pub fn target(&self) -> Option<Place> {
        self.lock().target.clone()
    }

    pub fn heading(&self) -> f64 {
        self.heading.get()
    }

    pub fn trigger(&self) -> TriggerAction {
        let inner = self.lock();
        TriggerAction::for_state(inner.state, inner.fix.is_some())
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        let inner = self.lock();
        ScanSnapshot {
            state: inner.state,
            message: inner.message.as_ref().map(StatusMessage::shouted),
            target: inner.target.clone(),
            heading: self.heading.get(),
            fix: inner.fix,
            trigger: TriggerAction::for_state(inner.state, inner.fix.is_some()),
            scan_id: inner.scan_id,
        }
    }

    /// Run the initial location acquisition
    pub async fn start(&self) -> ScanState {
        self.acquire().await
    }

    async fn acquire(&self) -> ScanState {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.target = None;
            inner.scan_id = None;

            if !self.location.is_available() {
                warn!("No location capability");
                return inner.fail(ScanFault::CapabilityMissing);
            }

            inner.state = ScanState::Locating;
            inner.message = None;
            inner.generation
        };

        let options = self.config.position;
        info!(
            high_accuracy = options.high_accuracy,
            timeout_ms = options.timeout.as_millis() as u64,
            "Acquiring position"
        );

        let result = tokio::time::timeout(options.timeout, self.location.current_position(&options))
            .await
            .unwrap_or(Err(LocationError::Timeout));

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "Discarding stale location result");
            return inner.state;
        }

        match result {
            Ok(coords) => {
                info!(
                    latitude = coords.latitude,
                    longitude = coords.longitude,
                    "Position acquired"
                );
                inner.fix = Some(Fix::now(coords));
                inner.state = ScanState::Idle;
                inner.state
            }
            Err(e) => {
                warn!(error = %e, "Position acquisition failed");
                inner.fail(ScanFault::Sensor(e))
            }
        }
    }

    /// Run one scan.
    ///
    /// Refused while a collaborator call is outstanding or a result is held.
    /// Otherwise resolves to RESULTS, IDLE (nothing found) or ERROR.
    pub async fn scan(&self) -> Result<ScanState, ScanRejected> {
        let (generation, coords, scan_id) = {
            let mut inner = self.lock();
            match inner.state {
                state if state.is_busy() => return Err(ScanRejected::Busy(state)),
                ScanState::Results => return Err(ScanRejected::ResultHeld),
                _ => {}
            }

            let Some(fix) = inner.fix else {
                warn!("Scan requested without a fix");
                return Ok(inner.fail(ScanFault::NoFix));
            };

            let scan_id = Uuid::new_v4();
            inner.generation += 1;
            inner.state = ScanState::Searching;
            inner.target = None;
            inner.message = None;
            inner.scan_id = Some(scan_id);
            (inner.generation, fix.coords, scan_id)
        };

        let span = info_span!("scan", %scan_id);
        async move {
            info!("Scan started");

            if !self.config.lead_in.is_zero() {
                tokio::time::sleep(self.config.lead_in).await;

                let inner = self.lock();
                if inner.generation != generation {
                    debug!(generation, current = inner.generation, "Scan orphaned during lead-in");
                    return Ok(inner.state);
                }
            }

            let result = self.query.find_places(coords).await;

            let mut inner = self.lock();
            if inner.generation != generation {
                debug!(generation, current = inner.generation, "Discarding stale scan result");
                return Ok(inner.state);
            }

            let state = match result {
                Ok(places) => match places.into_iter().next() {
                    Some(place) => {
                        info!(name = %place.name, distance = %place.distance, "Target acquired");
                        inner.target = Some(place);
                        inner.state = ScanState::Results;
                        inner.state
                    }
                    None => {
                        info!("No candidate found");
                        inner.message = Some(StatusMessage::info(SECTOR_CLEAR));
                        inner.state = ScanState::Idle;
                        inner.state
                    }
                },
                Err(e) => {
                    error!(
                        error = %e,
                        missing_credential = e.is_missing_credential(),
                        "Place query failed"
                    );
                    inner.fail(ScanFault::QueryFailed)
                }
            };
            Ok(state)
        }
        .instrument(span)
        .await
    }

    /// Clear the current result or fault.
    ///
    /// With a fix this returns straight to IDLE. Without one the location
    /// acquisition runs again. Any outstanding collaborator call is orphaned.
    pub async fn reset(&self) -> ScanState {
        {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.target = None;
            inner.message = None;
            inner.scan_id = None;

            if inner.fix.is_some() {
                info!(from = ?inner.state, "Reset to idle");
                inner.state = ScanState::Idle;
                return inner.state;
            }
        }

        info!("Reset without a fix, re-acquiring position");
        self.acquire().await
    }

    /// Perform whatever the primary button currently means
    pub async fn press_trigger(&self) -> Result<ScanState, ScanRejected> {
        match self.trigger() {
            TriggerAction::Scan => self.scan().await,
            TriggerAction::Reset => Ok(self.reset().await),
            TriggerAction::Disabled => Err(ScanRejected::Busy(self.state())),
        }
    }

    /// Record an orientation event; never changes the scan state
    pub fn update_heading(&self, reading: OrientationReading) {
        if let Some(degrees) = reading.heading() {
            self.heading.set(degrees);
        }
    }

    /// Feed headings from an orientation stream until it ends
    pub fn follow_orientation<S>(self: &Arc<Self>, readings: S) -> JoinHandle<()>
    where
        S: Stream<Item = OrientationReading> + Send + 'static,
    {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut readings = Box::pin(readings);
            while let Some(reading) = readings.next().await {
                controller.update_heading(reading);
            }
            debug!("Orientation stream ended");
        })
    }
}
