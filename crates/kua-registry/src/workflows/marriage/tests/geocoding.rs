use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDateTime;

use super::common::*;

use crate::workflows::marriage::calendar::Clock;
use crate::workflows::marriage::domain::{Coordinates, RegistrationId, RegistrationStatus, Venue};
use crate::workflows::marriage::geocoding::{
    CachedGeocoder, GeocodeError, GeocodeQueue, GeocodeWorker, Geocoder,
};
use crate::workflows::marriage::scheduling::SchedulingConfig;
use crate::workflows::marriage::service::MarriageWorkflow;

const KAYU_TANGI: Coordinates = Coordinates {
    latitude: -3.2953,
    longitude: 114.5872,
};

/// Counts lookups and answers every address with the same point.
#[derive(Default)]
struct CountingGeocoder {
    lookups: AtomicUsize,
}

impl Geocoder for CountingGeocoder {
    fn resolve(&self, _address: &str) -> Result<Coordinates, GeocodeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(KAYU_TANGI)
    }
}

impl Geocoder for Arc<CountingGeocoder> {
    fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        self.as_ref().resolve(address)
    }
}

struct FailingGeocoder;

impl Geocoder for FailingGeocoder {
    fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        Err(GeocodeError::NotFound {
            address: address.to_string(),
        })
    }
}

struct SlowGeocoder;

impl Geocoder for SlowGeocoder {
    fn resolve(&self, _address: &str) -> Result<Coordinates, GeocodeError> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(KAYU_TANGI)
    }
}

/// Clock the test can move forward.
struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    fn advance(&self, by: chrono::Duration) {
        let mut now = self.0.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().expect("clock mutex poisoned")
    }
}

#[test]
fn cached_addresses_skip_the_remote_lookup() {
    let inner = Arc::new(CountingGeocoder::default());
    let cache = CachedGeocoder::new(inner.clone(), chrono::Duration::hours(24), clock());

    assert_eq!(cache.resolve("Jl. Kayu Tangi II No. 8"), Ok(KAYU_TANGI));
    assert_eq!(cache.resolve("Jl. Kayu Tangi II No. 8"), Ok(KAYU_TANGI));
    assert_eq!(inner.lookups.load(Ordering::SeqCst), 1);

    cache
        .resolve("Jl. Sultan Adam No. 12")
        .expect("second address");
    assert_eq!(inner.lookups.load(Ordering::SeqCst), 2);
    assert_eq!(cache.cached(), 2);
}

#[test]
fn expired_entries_are_looked_up_again_and_purged() {
    let inner = Arc::new(CountingGeocoder::default());
    let manual = Arc::new(ManualClock(Mutex::new(now())));
    let cache = CachedGeocoder::new(inner.clone(), chrono::Duration::hours(1), manual.clone());

    cache.resolve("Jl. Kayu Tangi").expect("lookup");
    manual.advance(chrono::Duration::minutes(30));
    cache.resolve("Jl. Pramuka").expect("lookup");
    assert_eq!(cache.purge_expired(), 0);

    manual.advance(chrono::Duration::minutes(45));
    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(cache.cached(), 1);

    cache.resolve("Jl. Kayu Tangi").expect("stale entry refreshed");
    assert_eq!(inner.lookups.load(Ordering::SeqCst), 3);
}

#[test]
fn failed_lookups_are_not_cached() {
    let cache = CachedGeocoder::new(FailingGeocoder, chrono::Duration::hours(1), clock());
    match cache.resolve("Alamat tidak dikenal") {
        Err(GeocodeError::NotFound { address }) => assert_eq!(address, "Alamat tidak dikenal"),
        other => panic!("expected lookup failure, got {other:?}"),
    }
    assert_eq!(cache.cached(), 0);
}

fn geocoded_workflow<G: Geocoder + 'static>(
    geocoder: G,
    timeout: Duration,
) -> (
    MarriageWorkflow<MemoryStore, RecordingSink>,
    Arc<MemoryStore>,
    GeocodeWorker<G, MemoryStore>,
) {
    let store = Arc::new(MemoryStore::with_officiants([officiant(1)]));
    let (queue, worker) = GeocodeQueue::channel(Arc::new(geocoder), store.clone(), timeout);
    let workflow = MarriageWorkflow::with_clock(
        store.clone(),
        Arc::new(RecordingSink::default()),
        SchedulingConfig::default(),
        clock(),
    )
    .with_geocoding(queue);
    (workflow, store, worker)
}

fn coordinates_of(store: &MemoryStore, id: &RegistrationId) -> Option<Coordinates> {
    match store.registration(id).venue {
        Venue::Offsite { coordinates, .. } => coordinates,
        Venue::AtOffice => panic!("expected offsite venue"),
    }
}

#[tokio::test]
async fn offsite_submission_gets_coordinates_after_commit() {
    let (workflow, store, worker) =
        geocoded_workflow(CountingGeocoder::default(), Duration::from_secs(1));

    let offsite = workflow
        .registrations()
        .submit(&applicant(1), offsite_submission("2025-06-16", "09:00"))
        .expect("submitted");
    workflow
        .registrations()
        .submit(&applicant(2), submission("2025-06-16", "10:00"))
        .expect("office submission is not geocoded");
    assert_eq!(coordinates_of(&store, &offsite.id), None);

    drop(workflow);
    assert_eq!(worker.run().await, 1);
    assert_eq!(coordinates_of(&store, &offsite.id), Some(KAYU_TANGI));
}

#[tokio::test]
async fn failed_lookup_leaves_the_registration_untouched() {
    let (workflow, store, worker) = geocoded_workflow(FailingGeocoder, Duration::from_secs(1));
    let offsite = workflow
        .registrations()
        .submit(&applicant(1), offsite_submission("2025-06-16", "09:00"))
        .expect("submitted");

    drop(workflow);
    assert_eq!(worker.run().await, 0);
    assert_eq!(coordinates_of(&store, &offsite.id), None);
    assert_eq!(
        store.registration(&offsite.id).status,
        RegistrationStatus::AwaitingFormReview
    );
}

#[tokio::test]
async fn slow_lookup_times_out() {
    let (workflow, store, worker) = geocoded_workflow(SlowGeocoder, Duration::from_millis(20));
    let offsite = workflow
        .registrations()
        .submit(&applicant(1), offsite_submission("2025-06-16", "09:00"))
        .expect("submitted");

    drop(workflow);
    assert_eq!(worker.run().await, 0);
    assert_eq!(coordinates_of(&store, &offsite.id), None);
}

#[test]
fn closed_queue_does_not_block_submission() {
    let (workflow, store, worker) =
        geocoded_workflow(CountingGeocoder::default(), Duration::from_secs(1));
    drop(worker);

    let offsite = workflow
        .registrations()
        .submit(&applicant(1), offsite_submission("2025-06-16", "09:00"))
        .expect("stored even though geocoding is down");
    assert_eq!(coordinates_of(&store, &offsite.id), None);
}
