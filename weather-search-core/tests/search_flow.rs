use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::time::sleep;
use weather_search_core::{
    DisplayView, LocationStore, LookupError, MemoryLocationStore, OrchestratorHandle,
    SearchOrchestrator, SearchSettings, SearchState,
    lookup::memory::{MemoryLookup, sample_snapshot},
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

struct Harness {
    handle: OrchestratorHandle,
    lookup: MemoryLookup,
    store: Arc<MemoryLocationStore>,
    seen: Arc<Mutex<Vec<SearchState>>>,
}

impl Harness {
    fn start(lookup: MemoryLookup, store: MemoryLocationStore) -> Self {
        let store = Arc::new(store);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let handle = SearchOrchestrator::new(
            Arc::new(lookup.clone()),
            Arc::clone(&store) as Arc<dyn LocationStore>,
            SearchSettings::default(),
        )
        .observe(move |state| sink.lock().unwrap().push(state.clone()))
        .spawn();

        Self { handle, lookup, store, seen }
    }

    async fn state(&self) -> SearchState {
        self.handle.state().await.unwrap()
    }

    fn notifications(&self) -> Vec<SearchState> {
        self.seen.lock().unwrap().clone()
    }
}

#[tokio::test(start_paused = true)]
async fn fresh_start_without_saved_location_is_empty() {
    let h = Harness::start(MemoryLookup::new(), MemoryLocationStore::new());
    sleep(ms(1_000)).await;

    let state = h.state().await;
    assert_eq!(state, SearchState::default());
    assert_eq!(state.display(), DisplayView::Empty);
    assert!(h.lookup.calls().is_empty());
    assert!(h.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn saved_location_is_restored_into_detail_view() {
    let lookup = MemoryLookup::new();
    lookup.respond("Paris", sample_snapshot("Paris"), ms(200));
    let h = Harness::start(lookup, MemoryLocationStore::with_saved("Paris"));

    let state = h.state().await;
    assert!(state.is_loading);
    assert_eq!(state.display(), DisplayView::Loading);

    sleep(ms(250)).await;
    let state = h.state().await;
    assert_eq!(h.lookup.calls(), vec!["Paris".to_string()]);
    assert_eq!(state.query_text, "");
    assert!(!state.is_loading);
    assert!(matches!(state.display(), DisplayView::Detail(w) if w.place == "Paris"));
}

#[tokio::test(start_paused = true)]
async fn saved_location_failure_shows_error() {
    let lookup = MemoryLookup::new();
    lookup.fail("Paris", LookupError::transport("offline"), ms(10));
    let h = Harness::start(lookup, MemoryLocationStore::with_saved("Paris"));

    sleep(ms(50)).await;
    let state = h.state().await;
    assert_eq!(state.display(), DisplayView::Error("Network error: offline"));
    // The saved place is kept for the next launch.
    assert_eq!(h.store.load().as_deref(), Some("Paris"));
}

#[tokio::test(start_paused = true)]
async fn short_queries_never_reach_the_lookup() {
    let h = Harness::start(MemoryLookup::new(), MemoryLocationStore::new());

    for text in ["", "L", "Lo", "  "] {
        h.handle.text_changed(text).unwrap();
        sleep(ms(400)).await;
        h.handle.submit().unwrap();
        sleep(ms(10)).await;
    }

    assert!(h.lookup.calls().is_empty());
    let state = h.state().await;
    assert!(!state.is_loading);
    assert_eq!(state.current_weather, None);
    assert_eq!(state.error_message, None);
}

#[tokio::test(start_paused = true)]
async fn fast_typing_only_looks_up_the_final_value() {
    let lookup = MemoryLookup::new();
    lookup.respond("London", sample_snapshot("London"), Duration::ZERO);
    let h = Harness::start(lookup, MemoryLocationStore::new());

    for text in ["L", "Lo", "Lon", "Lond", "Londo", "London"] {
        h.handle.text_changed(text).unwrap();
        sleep(ms(120)).await;
    }
    sleep(ms(400)).await;

    assert_eq!(h.lookup.calls(), vec!["London".to_string()]);
    let state = h.state().await;
    assert!(matches!(state.display(), DisplayView::CompactResult(w) if w.place == "London"));
    assert_eq!(h.store.load().as_deref(), Some("London"));
}

#[tokio::test(start_paused = true)]
async fn superseded_lookup_is_never_applied() {
    let lookup = MemoryLookup::new();
    lookup
        .respond("Lon", sample_snapshot("Longyearbyen"), ms(1_000))
        .respond("London", sample_snapshot("London"), ms(50));
    let h = Harness::start(lookup, MemoryLocationStore::new());

    h.handle.text_changed("Lon").unwrap();
    sleep(ms(350)).await; // "Lon" issued at 300ms
    h.handle.text_changed("London").unwrap();
    sleep(ms(2_000)).await;

    assert_eq!(h.lookup.calls(), vec!["Lon".to_string(), "London".to_string()]);
    let places: Vec<String> = h
        .notifications()
        .into_iter()
        .filter_map(|s| s.current_weather.map(|w| w.place))
        .collect();
    assert_eq!(places, vec!["London".to_string()]);
    assert_eq!(h.store.load().as_deref(), Some("London"));
}

#[tokio::test(start_paused = true)]
async fn older_lookup_settling_after_newer_issue_is_discarded() {
    let lookup = MemoryLookup::new();
    lookup
        .fail("Lon", LookupError::decode("stale"), ms(400))
        .respond("London", sample_snapshot("London"), ms(300));
    let h = Harness::start(lookup, MemoryLocationStore::new());

    h.handle.text_changed("Lon").unwrap(); // issued at 300, would settle at 700
    sleep(ms(350)).await;
    h.handle.text_changed("London").unwrap(); // issued at 650, settles at 950

    sleep(ms(450)).await; // t = 800
    let state = h.state().await;
    assert!(state.is_loading);
    assert_eq!(state.error_message, None);

    sleep(ms(300)).await; // t = 1100
    let state = h.state().await;
    assert!(!state.is_loading);
    assert_eq!(state.error_message, None);
    assert_eq!(state.current_weather.map(|w| w.place).as_deref(), Some("London"));
}

#[tokio::test(start_paused = true)]
async fn submit_supersedes_a_slow_restore() {
    let lookup = MemoryLookup::new();
    lookup
        .respond("Paris", sample_snapshot("Paris"), ms(1_000))
        .respond("Tokyo", sample_snapshot("Tokyo"), ms(100));
    let h = Harness::start(lookup, MemoryLocationStore::with_saved("Paris"));
    sleep(ms(10)).await; // "Paris" is in flight

    h.handle.text_changed("Tokyo").unwrap();
    h.handle.submit().unwrap();
    sleep(ms(2_000)).await;

    assert_eq!(h.lookup.calls(), vec!["Paris".to_string(), "Tokyo".to_string()]);
    let applied: Vec<String> = h
        .notifications()
        .into_iter()
        .filter_map(|s| s.current_weather.map(|w| w.place))
        .collect();
    assert_eq!(applied, vec!["Tokyo".to_string()]);

    let state = h.state().await;
    assert!(!state.is_loading);
    assert!(matches!(state.display(), DisplayView::CompactResult(w) if w.place == "Tokyo"));
    assert_eq!(h.store.load().as_deref(), Some("Tokyo"));
}

#[tokio::test(start_paused = true)]
async fn short_submit_leaves_the_in_flight_lookup_alone() {
    let lookup = MemoryLookup::new();
    lookup.respond("Lon", sample_snapshot("London"), ms(500));
    let h = Harness::start(lookup, MemoryLocationStore::new());

    h.handle.text_changed("Lon").unwrap();
    sleep(ms(350)).await; // "Lon" issued at 300ms
    h.handle.text_changed("Lo").unwrap();
    h.handle.submit().unwrap();
    sleep(ms(1_000)).await;

    assert_eq!(h.lookup.calls(), vec!["Lon".to_string()]);
    let state = h.state().await;
    assert!(!state.is_loading);
    assert_eq!(state.current_weather.map(|w| w.place).as_deref(), Some("London"));
}

#[tokio::test(start_paused = true)]
async fn decode_failure_surfaces_its_description() {
    let lookup = MemoryLookup::new();
    let error = LookupError::decode("missing field `current`");
    lookup.fail("Gotham", error.clone(), ms(20));
    let h = Harness::start(lookup, MemoryLocationStore::new());

    h.handle.text_changed("Gotham").unwrap();
    sleep(ms(400)).await;

    let state = h.state().await;
    assert_eq!(state.error_message, Some(error.to_string()));
    assert_eq!(state.current_weather, None);
    assert!(!state.is_loading);
    assert!(h.store.load().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_save_does_not_change_displayed_result() {
    let lookup = MemoryLookup::new();
    lookup.respond("Nairobi", sample_snapshot("Nairobi"), Duration::ZERO);
    let h = Harness::start(lookup, MemoryLocationStore::failing());

    h.handle.text_changed("Nairobi").unwrap();
    sleep(ms(400)).await;

    let state = h.state().await;
    assert_eq!(state.current_weather.map(|w| w.place).as_deref(), Some("Nairobi"));
    assert_eq!(state.error_message, None);
    assert!(h.store.load().is_none());
}

#[tokio::test(start_paused = true)]
async fn clearing_the_search_returns_to_detail_view() {
    let lookup = MemoryLookup::new();
    lookup.respond("Berlin", sample_snapshot("Berlin"), Duration::ZERO);
    let h = Harness::start(lookup, MemoryLocationStore::new());

    h.handle.text_changed("Berlin").unwrap();
    sleep(ms(400)).await;
    assert!(matches!(h.state().await.display(), DisplayView::CompactResult(_)));

    h.handle.text_changed("").unwrap();
    sleep(ms(400)).await;
    assert!(matches!(h.state().await.display(), DisplayView::Detail(_)));
    assert_eq!(h.lookup.calls(), vec!["Berlin".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_orchestrator() {
    let lookup = MemoryLookup::new();
    let h = Harness::start(lookup.clone(), MemoryLocationStore::new());

    h.handle.text_changed("Vienna").unwrap();
    drop(h);
    sleep(ms(1_000)).await;

    // The pending debounce timer was aborted with the task.
    assert!(lookup.calls().is_empty());
}
