//! Address geocoding for offsite venues.
//!
//! Lookups run after the registration is stored; a failed or slow lookup only
//! leaves the venue without coordinates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::calendar::Clock;
use super::domain::{Coordinates, RegistrationId};
use super::repository::RegistrationRepository;

/// External address lookup.
pub trait Geocoder: Send + Sync {
    fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeocodeError {
    #[error("no coordinates found for '{address}'")]
    NotFound { address: String },
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
    #[error("geocoding queue is closed")]
    Closed,
}

struct CacheEntry {
    coordinates: Coordinates,
    stored_at: NaiveDateTime,
}

/// TTL cache keyed by the exact address string.
pub struct CachedGeocoder<G> {
    inner: G,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn fresh(&self, address: &str, now: NaiveDateTime) -> Option<Coordinates> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(address)
            .filter(|entry| now - entry.stored_at < self.ttl)
            .map(|entry| entry.coordinates)
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now - entry.stored_at < self.ttl);
        before - entries.len()
    }

    pub fn cached(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let now = self.clock.now();
        if let Some(coordinates) = self.fresh(address, now) {
            debug!(address, "geocode cache hit");
            return Ok(coordinates);
        }

        let coordinates = self.inner.resolve(address)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                address.to_string(),
                CacheEntry {
                    coordinates,
                    stored_at: now,
                },
            );
        Ok(coordinates)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeJob {
    pub registration: RegistrationId,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct GeocodeQueue {
    sender: mpsc::UnboundedSender<GeocodeJob>,
}

impl GeocodeQueue {
    pub fn channel<G, R>(
        geocoder: Arc<G>,
        repository: Arc<R>,
        timeout: Duration,
    ) -> (Self, GeocodeWorker<G, R>)
    where
        G: Geocoder + 'static,
        R: RegistrationRepository + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self { sender },
            GeocodeWorker {
                receiver,
                geocoder,
                repository,
                timeout,
            },
        )
    }

    pub fn enqueue(&self, job: GeocodeJob) -> Result<(), GeocodeError> {
        self.sender.send(job).map_err(|_| GeocodeError::Closed)
    }
}

pub struct GeocodeWorker<G, R> {
    receiver: mpsc::UnboundedReceiver<GeocodeJob>,
    geocoder: Arc<G>,
    repository: Arc<R>,
    timeout: Duration,
}

impl<G, R> GeocodeWorker<G, R>
where
    G: Geocoder + 'static,
    R: RegistrationRepository + 'static,
{
    /// Processes jobs until the queue closes; returns how many venues got coordinates.
    pub async fn run(mut self) -> usize {
        let mut resolved = 0;
        while let Some(job) = self.receiver.recv().await {
            if self.process(&job).await {
                resolved += 1;
            }
        }
        resolved
    }

    async fn process(&self, job: &GeocodeJob) -> bool {
        let geocoder = Arc::clone(&self.geocoder);
        let address = job.address.clone();
        let lookup = tokio::task::spawn_blocking(move || geocoder.resolve(&address));

        let coordinates = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(Ok(coordinates))) => coordinates,
            Ok(Ok(Err(error))) => {
                warn!(registration = %job.registration, %error, "geocoding failed");
                return false;
            }
            Ok(Err(error)) => {
                warn!(registration = %job.registration, %error, "geocoding task aborted");
                return false;
            }
            Err(_) => {
                warn!(
                    registration = %job.registration,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "geocoding timed out"
                );
                return false;
            }
        };

        match self
            .repository
            .set_coordinates(&job.registration, coordinates)
        {
            Ok(()) => {
                info!(
                    registration = %job.registration,
                    latitude = coordinates.latitude,
                    longitude = coordinates.longitude,
                    "venue coordinates stored"
                );
                true
            }
            Err(error) => {
                warn!(registration = %job.registration, %error, "failed to store coordinates");
                false
            }
        }
    }
}
