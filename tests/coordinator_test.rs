// End-to-end flows through the coordinator: engine round trips, selection
// sync between text and rendering, edits and playback following the page

use score_sync_wasm::engine::{Channel, Effect, RenderRequest, RenderResponse, RequestTag, TimerKind};
use score_sync_wasm::models::{BreakPolicy, Timemap};
use score_sync_wasm::pagination::PageTarget;
use score_sync_wasm::sync::{Modifiers, Origin};
use score_sync_wasm::{SyncConfig, SyncCoordinator};
use std::io::Write;

const MEI: &str = r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><body><mdiv><score><section>
<measure xml:id="m1"><staff n="1"><layer n="1"><note xml:id="n1"/><note xml:id="n2"/></layer></staff></measure>
<sb xml:id="sb1"/>
<measure xml:id="m2"><staff n="1"><layer n="1"><note xml:id="n3"/></layer></staff></measure>
</section></score></mdiv></body></music></mei>"#;

const PAGE_1: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
<g id="m1" class="measure"><g id="s1" class="staff" data-n="1"><g id="l1" class="layer" data-n="1">
<g id="n1" class="note"><use x="10" y="50"/></g><g id="n2" class="note"><use x="20" y="50"/></g>
</g></g></g></svg>"#;

const PAGE_2: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
<g id="m2" class="measure"><g id="s2" class="staff" data-n="1"><g id="l2" class="layer" data-n="1">
<g id="n3" class="note"><use x="10" y="50"/></g>
</g></g></g></svg>"#;

fn coordinator() -> SyncCoordinator {
    SyncCoordinator::new(SyncConfig {
        break_policy: BreakPolicy::Line,
        ..Default::default()
    })
}

/// Tag of the last request sent on `channel`
fn last_tag(effects: &[Effect], channel: Channel) -> RequestTag {
    effects
        .iter()
        .rev()
        .find_map(|e| match e {
            Effect::Render { request } if request.channel() == channel => Some(request.tag()),
            _ => None,
        })
        .unwrap()
}

fn rendered(tag: RequestTag, svg: &str) -> RenderResponse {
    RenderResponse::Rendered {
        tag,
        svg: svg.to_string(),
        page_count: None,
    }
}

fn highlights(effects: &[Effect]) -> Vec<(Vec<String>, Vec<String>)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Highlight { change } => Some((change.added.clone(), change.removed.clone())),
            _ => None,
        })
        .collect()
}

/// Loaded and showing page 1
fn on_first_page() -> SyncCoordinator {
    let mut c = coordinator();
    let effects = c.load(MEI).unwrap();
    c.handle_response(rendered(last_tag(&effects, Channel::Render), PAGE_1));
    c
}

#[test]
fn test_click_moves_text_cursor_and_echo_is_ignored() {
    let mut c = on_first_page();
    let effects = c.click("n2", Modifiers::default());
    let offset = MEI.find(r#"<note xml:id="n2""#).unwrap();
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::MoveTextCursor { offset: o, .. } if *o == offset)));
    assert_eq!(highlights(&effects), vec![(vec!["n2".to_string()], vec![])]);

    // the editor reports the cursor move it was told to make
    assert!(c.cursor_moved(offset, Origin::Synchronizer).is_empty());
    assert_eq!(c.view_state().selection.ids(), &["n2".to_string()]);
}

#[test]
fn test_cursor_on_other_page_flips_and_highlights_after_render() {
    let mut c = on_first_page();
    c.click("n1", Modifiers::default());

    let offset = MEI.find(r#"xml:id="n3""#).unwrap();
    let effects = c.cursor_moved(offset, Origin::User);
    assert_eq!(highlights(&effects), vec![(vec![], vec!["n1".to_string()])]);
    let page_request = effects.iter().find_map(|e| match e {
        Effect::Render { request: RenderRequest::UpdatePage { tag, markup } } => Some((*tag, markup.clone())),
        _ => None,
    });
    let (tag, markup) = page_request.unwrap();
    assert_eq!(tag.page, 2);
    assert!(markup.unwrap().contains(r#"xml:id="n3""#));
    assert_eq!(c.view_state().pages.current(), 2);

    let effects = c.handle_response(rendered(tag, PAGE_2));
    assert_eq!(highlights(&effects), vec![(vec!["n3".to_string()], vec![])]);
}

#[test]
fn test_response_after_edit_is_stale() {
    let mut c = coordinator();
    let effects = c.load(MEI).unwrap();
    let tag = last_tag(&effects, Channel::Render);
    let edited = MEI.replace(r#"<note xml:id="n2"/>"#, r#"<note xml:id="n2"/><note xml:id="n2b"/>"#);
    c.edit(&edited, 0.0).unwrap();

    c.handle_response(rendered(tag, PAGE_1));
    // markup version moved on, the page stays unrendered
    assert!(c.rendered().is_empty());
    assert!(!c.is_busy());
}

#[test]
fn test_edits_are_debounced() {
    let mut c = on_first_page();
    let edited = MEI.replace("n2", "n4");
    let first = c.edit(&edited, 0.0).unwrap();
    let second = c.edit(&edited, 100.0).unwrap();
    assert_eq!(first.len(), 2);
    let render_token = |effects: &[Effect]| {
        effects.iter().find_map(|e| match e {
            Effect::StartTimer { timer: TimerKind::Render, token, .. } => Some(*token),
            _ => None,
        })
    };
    let stale = render_token(&first).unwrap();
    let fresh = render_token(&second).unwrap();

    assert!(c.timer_fired(TimerKind::Render, stale).is_empty());
    assert!(c.tick(450.0).is_empty());
    let effects = c.timer_fired(TimerKind::Render, fresh);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Render { request: RenderRequest::UpdateData { markup, .. } } if markup.contains("n4")
    )));
    let effects = c.tick(500.0);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Render { request: RenderRequest::ComputeTimemap { .. } }
    )));
}

/// Loaded, page 1 shown and the timemap installed
fn ready_to_play() -> SyncCoordinator {
    let mut c = coordinator();
    let effects = c.load(MEI).unwrap();
    c.handle_response(rendered(last_tag(&effects, Channel::Render), PAGE_1));
    let timemap = Timemap::from_json(
        r#"[{"tstamp":0,"on":["n1"]},{"tstamp":500,"on":["n2"],"off":["n1"]},
            {"tstamp":1000,"on":["n3"],"off":["n2"]},{"tstamp":1500,"off":["n3"]}]"#,
    )
    .unwrap();
    c.handle_response(RenderResponse::Timemap {
        tag: last_tag(&effects, Channel::Timemap),
        timemap,
        aliases: None,
    });
    c
}

#[test]
fn test_playback_follows_to_the_next_page() {
    let mut c = ready_to_play();
    let effects = c.seek(0.0);
    assert_eq!(effects[0], Effect::SeekPlayer { time: 0.0 });
    let effects = c.time_advance(0.0);
    assert!(effects.iter().any(|e| matches!(e, Effect::PlaybackHighlight { change } if change.added == ["n1"])));
    c.time_advance(500.0);

    let effects = c.time_advance(1000.0);
    let flip = effects.iter().find_map(|e| match e {
        Effect::Render { request: RenderRequest::UpdatePage { tag, .. } } => Some(*tag),
        _ => None,
    });
    assert_eq!(flip.unwrap().page, 2);
    // a page turn driven by playback never moves the player
    assert!(!effects.iter().any(|e| matches!(e, Effect::SeekPlayer { .. })));
    assert!(effects.iter().any(|e| matches!(e, Effect::ScheduleTask { .. })));
}

#[test]
fn test_user_page_change_reseeks_playing_player() {
    let mut c = ready_to_play();
    c.seek(0.0);
    c.time_advance(0.0);

    let effects = c.change_page(PageTarget::Forwards);
    let effects = c.handle_response(rendered(last_tag(&effects, Channel::Render), PAGE_2));
    assert!(effects.contains(&Effect::SeekPlayer { time: 1000.0 }));
}

#[test]
fn test_config_files() {
    let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(yaml, "breakPolicy: measure\nspeedMode: false\nrenderDebounceMs: 250").unwrap();
    let config = SyncConfig::load(yaml.path()).unwrap();
    assert_eq!(config.break_policy, BreakPolicy::Measure);
    assert!(!config.speed_mode);
    assert_eq!(config.render_debounce_ms, 250.0);

    let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(json, r#"{{"pageFollow": false, "sourceId": "A"}}"#).unwrap();
    let config = SyncConfig::load(json.path()).unwrap();
    assert!(!config.page_follow);
    assert_eq!(config.source_id.as_deref(), Some("A"));
    assert_eq!(config.break_policy, BreakPolicy::Auto);

    let coordinator = SyncCoordinator::new(config);
    assert_eq!(coordinator.view_state().pages.policy(), BreakPolicy::Auto);
}

#[test]
fn test_unparsable_edit_stops_cursor_moves_until_it_parses() {
    let mut c = coordinator();
    let effects = c.load(MEI).unwrap();
    let tag = last_tag(&effects, Channel::Render);
    let half_typed = MEI.replace("<sb xml:id=\"sb1\"/>", "<measure xml:id=\"mX\"><sta\n<sb xml:id=\"sb1\"/>");
    assert!(c.edit(&half_typed, 0.0).is_err());
    assert!(c.document().is_none());

    // the render for the old text no longer applies
    c.handle_response(rendered(tag, PAGE_1));
    assert!(c.rendered().is_empty());

    // offsets of the old text would land in the wrong place
    let effects = c.click("n2", Modifiers::default());
    assert!(!effects.iter().any(|e| matches!(e, Effect::MoveTextCursor { .. })));

    let fixed = half_typed.replace("<measure xml:id=\"mX\"><sta\n", "");
    c.edit(&fixed, 100.0).unwrap();
    let offset = fixed.find(r#"<note xml:id="n2""#).unwrap();
    let effects = c.click("n2", Modifiers::default());
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::MoveTextCursor { offset: o, .. } if *o == offset)));
}
