//! Integration tests for the file backed ingestion engine
//!
//! Tests cover:
//! - Scenario start/stop persistence
//! - Preliminary and finalizing signal events
//! - Mentions on signals and on nested annotation containers
//! - Element lookups and scenario isolation

use emissor_common::{Annotation, Mention, Modality, Scenario, Segment, Signal};
use emissor_data::media::LocalMediaSource;
use emissor_data::storage::{FileScenarioStore, ScenarioStore};
use emissor_data::{DataError, EmissorDataStore, FlushPolicy};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Test helper: engine persisting every event below a temp folder
fn setup() -> (TempDir, EmissorDataStore) {
    let dir = TempDir::new().unwrap();
    let engine = EmissorDataStore::new(
        Arc::new(FileScenarioStore::open(dir.path()).unwrap()),
        Arc::new(LocalMediaSource::new(dir.path())),
        FlushPolicy::Immediate,
    );
    (dir, engine)
}

/// Test helper: independent reader of the persisted scenario folder
fn reader(dir: &TempDir) -> FileScenarioStore {
    FileScenarioStore::open(dir.path()).unwrap()
}

fn scenario(modality: &str, end: Option<i64>) -> Scenario {
    let mut signals = BTreeMap::new();
    signals.insert(modality.to_string(), format!("./{}", modality));
    Scenario::new_instance("sc_1", 0, end, "", signals)
}

/// Apply a signal and flush, as the service does per event
fn add_signal(engine: &mut EmissorDataStore, signal: Signal) {
    engine.add_signal(signal).unwrap();
    engine.flush().unwrap();
}

fn add_mention(engine: &mut EmissorDataStore, mention: Mention) {
    engine.add_mention(mention).unwrap();
    engine.flush().unwrap();
}

// =============================================================================
// Scenario lifecycle
// =============================================================================

#[test]
fn test_scenario_start() {
    let (dir, mut engine) = setup();

    engine.start_scenario(scenario("image", None)).unwrap();

    let actual = reader(&dir).load_document("sc_1").unwrap().scenario;
    assert_eq!(actual.id, "sc_1");
    assert_eq!(actual.ruler.container_id, "sc_1");
    assert_eq!(actual.start(), 0);
    assert_eq!(actual.end(), None);
    assert_eq!(actual.context, serde_json::json!(""));
    assert_eq!(actual.signals.get("image").map(String::as_str), Some("./image"));
}

#[test]
fn test_scenario_stop() {
    let (dir, mut engine) = setup();

    engine.start_scenario(scenario("image", None)).unwrap();
    engine.stop_scenario(scenario("image", Some(1))).unwrap();

    let actual = reader(&dir).load_document("sc_1").unwrap().scenario;
    assert_eq!(actual, scenario("image", Some(1)));
    assert_eq!(engine.current_scenario_id(), None);
}

#[test]
fn test_second_start_always_fails() {
    let (_dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();

    assert!(matches!(
        engine.start_scenario(scenario("audio", None)),
        Err(DataError::AlreadyOpen { .. })
    ));
    let other = Scenario::new_instance("sc_2", 0, None, "", BTreeMap::new());
    assert!(matches!(
        engine.start_scenario(other),
        Err(DataError::AlreadyOpen { .. })
    ));
    assert_eq!(engine.current_scenario_id().as_deref(), Some("sc_1"));
}

#[test]
fn test_stop_unopened_scenario_fails() {
    let (_dir, mut engine) = setup();

    assert!(matches!(
        engine.stop_scenario(scenario("audio", Some(1))),
        Err(DataError::NotOpen { current: None, .. })
    ));
}

// =============================================================================
// Signals
// =============================================================================

#[test]
fn test_signal_start() {
    let (dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();

    let audio = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 2);
    add_signal(&mut engine, audio.clone());

    let store = reader(&dir);
    assert_eq!(store.load_document("sc_1").unwrap().scenario, scenario("audio", None));
    let actual = store.load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].id, audio.id);
    assert_eq!(actual[0].time.start, 0);
    assert_eq!(actual[0].time.end, None);
    assert_eq!(actual[0].time.container_id, "sc_1");
    assert_eq!(actual[0].ruler.bounds, vec![0, 0, -1, 2]);
}

#[test]
fn test_signal_stop() {
    let (dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();

    let start = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 2);
    add_signal(&mut engine, start.clone());
    let stop = Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 2).with_id(&start.id);
    add_signal(&mut engine, stop);

    let actual = reader(&dir).load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].id, start.id);
    assert_eq!(actual[0].time.start, 0);
    assert_eq!(actual[0].time.end, Some(1));
    assert_eq!(actual[0].time.container_id, "sc_1");
    assert_eq!(actual[0].ruler.bounds, vec![0, 0, 1, 2]);
}

#[test]
fn test_multiple_signals() {
    let (dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();

    let first = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 2);
    add_signal(&mut engine, first.clone());
    add_signal(
        &mut engine,
        Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 2).with_id(&first.id),
    );

    let second = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 2);
    add_signal(&mut engine, second.clone());
    add_signal(
        &mut engine,
        Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 2).with_id(&second.id),
    );

    let actual = reader(&dir).load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(actual.len(), 2);
    assert_eq!(actual[0].id, first.id);
    assert_eq!(actual[1].id, second.id);
    assert_eq!(actual[0].ruler.bounds, vec![0, 0, 1, 2]);
    assert_eq!(actual[1].ruler.bounds, vec![0, 0, 1, 2]);
}

#[test]
fn test_events_without_open_scenario_are_dropped() {
    let (dir, mut engine) = setup();

    let audio = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 2);
    engine.add_signal(audio.clone()).unwrap();
    engine
        .add_mentions(vec![Mention::new("men_1", vec![Segment::atomic(&audio.id)], vec![])])
        .unwrap();
    engine.flush().unwrap();

    assert!(!dir.path().join("sc_1").exists());
    assert!(engine.get_signal(&audio.id).is_none());

    // Same after a scenario was stopped
    engine.start_scenario(scenario("audio", None)).unwrap();
    engine.stop_scenario(scenario("audio", Some(1))).unwrap();
    engine.add_signal(audio).unwrap();
    engine.flush().unwrap();
    assert!(reader(&dir)
        .load_modality("sc_1", Modality::Audio)
        .unwrap()
        .is_empty());
}

// =============================================================================
// Mentions
// =============================================================================

#[test]
fn test_add_mention() {
    let (dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();
    let audio = Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 2);
    add_signal(&mut engine, audio.clone());

    let mention = Mention::new(
        "men_1",
        vec![audio.ruler.bounding_box(0, 0, 1, 1)],
        vec![Annotation::new("test_annotation", "annotation", "1.0", 0)],
    );
    add_mention(&mut engine, mention);

    let actual = reader(&dir).load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].id, audio.id);
    assert_eq!(actual[0].mentions.len(), 1);
    assert_eq!(actual[0].mentions[0].id, "men_1");
}

#[test]
fn test_add_mention_on_annotation() {
    let (dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();
    let audio = Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 2);
    add_signal(&mut engine, audio.clone());

    let token = Annotation::token("test_annotation");
    let token_segment = token.container_segment().unwrap();
    add_mention(
        &mut engine,
        Mention::new("men_1", vec![audio.ruler.bounding_box(0, 0, 1, 1)], vec![token]),
    );
    add_mention(
        &mut engine,
        Mention::new(
            "men_2",
            vec![token_segment],
            vec![Annotation::new("test_annotation", "annotation", "1.0", 0)],
        ),
    );

    let actual = reader(&dir).load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].id, audio.id);
    assert_eq!(actual[0].mentions.len(), 2);
    assert_eq!(actual[0].mentions[0].id, "men_1");
    assert_eq!(actual[0].mentions[1].id, "men_2");
}

#[test]
fn test_unresolved_mention_fails_batch() {
    let (_dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();
    let audio = Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 2);
    add_signal(&mut engine, audio.clone());

    let result = engine.add_mentions(vec![
        Mention::new("men_1", vec![Segment::atomic(&audio.id)], vec![]),
        Mention::new("men_2", vec![Segment::atomic("never-seen")], vec![]),
    ]);

    assert!(matches!(
        result,
        Err(DataError::UnknownContainer { scenario_id, .. }) if scenario_id == "sc_1"
    ));
}

#[test]
fn test_mentions_between_open_and_finalize_are_kept() {
    let (dir, mut engine) = setup();
    engine.start_scenario(scenario("audio", None)).unwrap();

    let open = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 1);
    add_signal(&mut engine, open.clone());
    add_mention(&mut engine, Mention::new("m1", vec![Segment::atomic(&open.id)], vec![]));
    add_mention(&mut engine, Mention::new("m2", vec![Segment::atomic(&open.id)], vec![]));

    let finalize = Signal::audio_for_scenario("sc_1", 0, Some(1), "", 1, 1).with_id(&open.id);
    add_signal(&mut engine, finalize);

    let actual = reader(&dir).load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].time.end, Some(1));
    assert!(actual[0].files.is_empty());
    assert_eq!(
        actual[0].mentions.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
        vec!["m1", "m2"]
    );
}

// =============================================================================
// Lookups
// =============================================================================

#[test]
fn test_mention_on_open_signal_survives_finalize() {
    let (dir, mut engine) = setup();
    engine
        .start_scenario(Scenario::new_instance("sc_1", 0, None, "", BTreeMap::new()))
        .unwrap();

    let a1 = Signal::audio_for_scenario("sc_1", 0, None, "", -1, 1).with_id("a1");
    engine.add_signal(a1).unwrap();
    engine
        .add_mention(Mention::new("m1", vec![Segment::atomic("a1")], vec![]))
        .unwrap();

    // Finalize with one file reference; the media is not available here
    let finalize = Signal::audio_for_scenario("sc_1", 0, Some(1), "cltl-storage:audio/a1", 1, 1).with_id("a1");
    engine.add_signal(finalize).unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.scenario_for_element("m1").unwrap(), "sc_1");
    let stored = engine.get_signal("a1").unwrap();
    assert_eq!(stored.mentions.len(), 1);
    assert_eq!(stored.mentions[0].id, "m1");
    assert_eq!(stored.time.end, Some(1));
    assert!(stored.files.is_empty());

    let persisted = reader(&dir).load_modality("sc_1", Modality::Audio).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].mentions.len(), 1);
}

#[test]
fn test_same_scenario_for_signal_mention_and_nested_annotation() {
    let (_dir, mut engine) = setup();
    engine.start_scenario(scenario("text", None)).unwrap();
    let text = Signal::text_for_scenario("sc_1", 0, Some(1), "hello world");
    engine.add_signal(text.clone()).unwrap();

    let token = Annotation::token("hello");
    let token_id = token.nested_container_id().unwrap().to_string();
    engine
        .add_mention(Mention::new("m1", vec![Segment::new(&text.id, vec![0, 5])], vec![token]))
        .unwrap();
    engine
        .add_mention(Mention::new("m2", vec![Segment::atomic(&token_id)], vec![]))
        .unwrap();

    for id in [text.id.as_str(), "m1", "m2"] {
        assert_eq!(engine.scenario_for_element(id).unwrap(), "sc_1");
    }
}

#[test]
fn test_no_id_leaks_into_next_scenario() {
    let (_dir, mut engine) = setup();
    engine.start_scenario(scenario("text", None)).unwrap();
    let text = Signal::text_for_scenario("sc_1", 0, Some(1), "hi");
    engine.add_signal(text.clone()).unwrap();
    engine
        .add_mention(Mention::new("m1", vec![Segment::atomic(&text.id)], vec![]))
        .unwrap();
    engine.stop_scenario(scenario("text", Some(2))).unwrap();

    engine
        .start_scenario(Scenario::new_instance("sc_2", 3, None, "", BTreeMap::new()))
        .unwrap();

    assert!(engine.session().index().is_empty());
    assert_eq!(engine.session().signal_count(), 0);
    assert!(matches!(
        engine.scenario_for_element("m1"),
        Err(DataError::NotFound(_))
    ));
    assert!(matches!(
        engine.add_mention(Mention::new("m2", vec![Segment::atomic(&text.id)], vec![])),
        Err(DataError::UnknownContainer { .. })
    ));
}
