// Playback highlighting driven by onset reports

use score_sync_wasm::models::{RenderedTree, TimePoint, Timemap};
use score_sync_wasm::playback::{PlaybackOptions, PlaybackSynchronizer, TaskKind};

fn player(points: Vec<TimePoint>) -> PlaybackSynchronizer {
    let mut player = PlaybackSynchronizer::new(PlaybackOptions::default());
    player.set_timemap(Timemap::new(points).unwrap(), None);
    player
}

fn scenario_a() -> PlaybackSynchronizer {
    player(vec![
        TimePoint::new(0.0, &["n1"], &[]),
        TimePoint::new(500.0, &["n2"], &["n1"]),
        TimePoint::new(1000.0, &[], &["n2"]),
    ])
}

/// Two voices with overlapping notes and a rest gap
fn overlapping() -> PlaybackSynchronizer {
    player(vec![
        TimePoint::new(0.0, &["a1", "b1"], &[]),
        TimePoint::new(250.0, &["a2"], &["a1"]),
        TimePoint::new(500.0, &["a3"], &["a2", "b1"]),
        TimePoint::new(750.0, &[], &["a3"]),
        TimePoint::new(1000.0, &["b2"], &[]),
        TimePoint::new(1500.0, &[], &["b2"]),
    ])
}

fn sorted(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids
}

#[test]
fn test_scenario_a() {
    let mut player = scenario_a();
    let tree = RenderedTree::default();

    let update = player.seek(0.0);
    assert!(update.change.is_empty());
    assert!(player.highlighted().is_empty());

    let update = player.on_time_advance(0.0, &tree);
    assert_eq!(update.change.added, vec!["n1"]);
    assert!(update.scheduled.is_empty());

    let update = player.on_time_advance(500.0, &tree);
    assert_eq!(update.change.added, vec!["n2"]);
    assert_eq!(update.change.removed, vec!["n1"]);
    let stop = update
        .scheduled
        .iter()
        .find(|task| task.kind == TaskKind::Stop)
        .unwrap();
    assert_eq!(stop.delay, 500.0);
}

#[test]
fn test_seek_then_advance_matches_continuous_play() {
    let onsets = [0.0, 250.0, 500.0, 750.0, 1000.0, 1500.0];
    let tree = RenderedTree::default();
    for t in [0.0, 100.0, 250.0, 499.5, 600.0, 750.0, 900.0, 1000.0, 1400.0, 2000.0] {
        let mut continuous = overlapping();
        for &onset in onsets.iter().filter(|&&o| o < t) {
            continuous.on_time_advance(onset, &tree);
        }
        continuous.on_time_advance(t, &tree);

        let mut jumped = overlapping();
        jumped.seek(t);
        jumped.on_time_advance(t, &tree);

        assert_eq!(
            sorted(continuous.highlighted()),
            sorted(jumped.highlighted()),
            "highlight differs at {} ms",
            t
        );
    }
}

#[test]
fn test_rewind_equals_fresh_seek() {
    let tree = RenderedTree::default();
    let mut rewound = overlapping();
    for t in [0.0, 250.0, 500.0, 1000.0] {
        rewound.on_time_advance(t, &tree);
    }
    rewound.on_time_advance(300.0, &tree);

    let mut fresh = overlapping();
    fresh.seek(300.0);
    fresh.on_time_advance(300.0, &tree);

    assert_eq!(rewound.highlighted(), fresh.highlighted());
    assert_eq!(rewound.cursor().index(), fresh.cursor().index());
    assert_eq!(sorted(rewound.highlighted()), vec!["a2", "b1"]);
}

#[test]
fn test_note_ending_before_a_silence_is_closed_by_a_task() {
    let mut player = overlapping();
    let tree = RenderedTree::default();
    player.on_time_advance(0.0, &tree);
    player.on_time_advance(250.0, &tree);
    let update = player.on_time_advance(500.0, &tree);
    // a3 ends at 750 where nothing starts
    let note_off = update
        .scheduled
        .iter()
        .find(|task| task.kind == TaskKind::NoteOff { id: "a3".into() })
        .unwrap();
    assert_eq!(note_off.delay, 250.0);

    let update = player.advance_clock(760.0);
    assert_eq!(update.change.removed, vec!["a3"]);
    assert!(player.highlighted().is_empty());
}

#[test]
fn test_off_page_note_requests_page_flip() {
    let mut player = scenario_a();
    let tree = RenderedTree::from_svg(
        r#"<svg><g id="m1" class="measure"><g id="n1" class="note"><use x="1" y="1"/></g></g></svg>"#,
    )
    .unwrap();
    assert_eq!(player.on_time_advance(0.0, &tree).flip_to, None);
    assert_eq!(player.on_time_advance(500.0, &tree).flip_to.as_deref(), Some("n2"));
}

#[test]
fn test_seek_into_held_note_still_closes_it() {
    let mut player = player(vec![
        TimePoint::new(0.0, &["a"], &[]),
        TimePoint::new(100.0, &["b"], &[]),
        TimePoint::new(200.0, &[], &["a"]),
        TimePoint::new(1000.0, &["c"], &["b"]),
        TimePoint::new(1500.0, &[], &["c"]),
    ]);
    let tree = RenderedTree::default();
    player.seek(150.0);
    let update = player.on_time_advance(150.0, &tree);
    assert_eq!(sorted(player.highlighted()), vec!["a", "b"]);
    // a started before the seek target and ends in a silence at 200
    let note_off = update
        .scheduled
        .iter()
        .find(|task| task.kind == TaskKind::NoteOff { id: "a".into() })
        .unwrap();
    assert_eq!(note_off.delay, 50.0);

    let update = player.advance_clock(250.0);
    assert_eq!(update.change.removed, vec!["a"]);
    assert_eq!(player.highlighted(), &["b".to_string()]);
}

#[test]
fn test_rewind_reschedules_note_offs() {
    let mut player = overlapping();
    let tree = RenderedTree::default();
    for t in [0.0, 250.0, 500.0] {
        player.on_time_advance(t, &tree);
    }
    player.on_time_advance(700.0, &tree);
    // a3 sounds on both sides of the rewind, its first task is void
    let update = player.on_time_advance(600.0, &tree);
    assert!(update.change.is_empty());
    assert!(update
        .scheduled
        .iter()
        .any(|task| task.kind == TaskKind::NoteOff { id: "a3".into() } && task.delay == 150.0));
}
