//! Supersession scenarios: only the latest query is ever presented.

use super::{RecordingPresenter, TREE, region_body, run, session, stats_body};
use crate::geo::LatLng;
use crate::model::{RegionPath, Selection, SelectionMode};
use crate::region::AdminHierarchy;

fn circle(radius_m: f64) -> Selection {
    Selection::Circle {
        center: LatLng::new(37.5, 127.0),
        radius_m,
        segments: 32,
    }
}

#[test]
fn test_late_response_for_older_query_is_dropped() {
    let mut session = session();
    let mut presenter = RecordingPresenter::default();
    session
        .orchestrator()
        .transport()
        .reply(200, stats_body(200))
        .reply(200, stats_body(100));

    let first = session
        .begin_query(circle(100.0), &mut presenter)
        .expect("valid");
    let second = session
        .begin_query(circle(200.0), &mut presenter)
        .expect("valid");
    assert_eq!((first.token(), second.token()), (1, 2));

    // Token 2 resolves first, then token 1
    assert!(run(&mut session, second, &mut presenter));
    assert!(!run(&mut session, first, &mut presenter));

    assert_eq!(presenter.reports.len(), 1);
    assert_eq!(presenter.reports[0].total_population, 200);
    assert_eq!(session.report().map(|r| r.total_population), Some(200));
}

#[test]
fn test_invalid_query_does_not_supersede() {
    let mut session = session();
    let mut presenter = RecordingPresenter::default();
    session.orchestrator().transport().reply(200, stats_body(5));

    let pending = session
        .begin_query(circle(100.0), &mut presenter)
        .expect("valid");
    assert!(session.begin_query(circle(60_000.0), &mut presenter).is_none());
    assert_eq!(presenter.errors.len(), 1);

    assert!(run(&mut session, pending, &mut presenter));
    assert_eq!(presenter.reports.len(), 1);
}

#[test]
fn test_mode_switch_discards_in_flight_region_result() {
    let mut session = session();
    let mut presenter = RecordingPresenter::default();
    session.switch_mode(SelectionMode::Region);
    session.hierarchy_loaded(AdminHierarchy::from_json(TREE), &mut presenter);
    session.orchestrator().transport().reply(200, region_body(42));

    session.select_province(Some("Seoul")).expect("known province");
    let pending = session.query_region(&mut presenter).expect("province chosen");

    session.switch_mode(SelectionMode::Drawing);
    assert!(!run(&mut session, pending, &mut presenter));

    assert!(presenter.reports.is_empty());
    assert!(session.snapshot().boundary.is_none());
    // The boundary data is still valid and stays cached
    let key = "boundary_sido_Seoul";
    assert_eq!(session.cache_stats().keys, vec![key]);
}

#[test]
fn test_stale_region_result_never_replaces_newer_boundary() {
    let mut session = session();
    let mut presenter = RecordingPresenter::default();
    session.switch_mode(SelectionMode::Region);
    session.hierarchy_loaded(AdminHierarchy::from_json(TREE), &mut presenter);
    session
        .orchestrator()
        .transport()
        .reply(200, region_body(2))
        .reply(200, region_body(1));

    let seoul = session
        .begin_query(
            Selection::Region {
                path: RegionPath::sido("Seoul"),
            },
            &mut presenter,
        )
        .expect("valid");
    let busan = session
        .begin_query(
            Selection::Region {
                path: RegionPath::sido("Busan"),
            },
            &mut presenter,
        )
        .expect("valid");

    assert!(run(&mut session, busan, &mut presenter));
    assert!(!run(&mut session, seoul, &mut presenter));

    let boundary = session.snapshot().boundary.expect("busan boundary");
    assert_eq!(boundary.path, RegionPath::sido("Busan"));
    assert_eq!(session.cache_stats().count, 2);
}

#[test]
fn test_reselecting_active_mode_keeps_query_current() {
    let mut session = session();
    let mut presenter = RecordingPresenter::default();
    session.orchestrator().transport().reply(200, stats_body(42));
    session.select_tool(crate::model::DrawingMode::Circle);

    let pending = session
        .begin_query(circle(100.0), &mut presenter)
        .expect("valid");
    assert_eq!(session.switch_mode(SelectionMode::Drawing), None);
    assert_eq!(session.snapshot().tool, crate::model::DrawingMode::Circle);

    assert!(run(&mut session, pending, &mut presenter));
    assert_eq!(presenter.reports.len(), 1);
}
