use oxps_core::XpsError;
use oxps_core::interp::{PathBuilder, PathSegment};
use oxps_core::model::FillRule;
use oxps_core::parser::parse_path_data;

fn segments(data: &str) -> Vec<PathSegment> {
    let mut path = PathBuilder::new();
    parse_path_data(data, &mut path).expect("parse path data");
    path.segments
}

fn assert_curve(segment: PathSegment, expected: [f64; 6]) {
    let PathSegment::CurveTo(x1, y1, x2, y2, x3, y3) = segment else {
        panic!("expected a curve, got {segment:?}");
    };
    for (got, want) in [x1, y1, x2, y2, x3, y3].into_iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
}

#[test]
fn test_move_line_close() {
    assert_eq!(
        segments("M 0,0 L 10,0 10,10 Z"),
        vec![
            PathSegment::MoveTo(0.0, 0.0),
            PathSegment::LineTo(10.0, 0.0),
            PathSegment::LineTo(10.0, 10.0),
            PathSegment::ClosePath,
        ]
    );
}

#[test]
fn test_relative_commands() {
    assert_eq!(
        segments("m 1,1 l 2,0 h 3 v -4 z"),
        vec![
            PathSegment::MoveTo(1.0, 1.0),
            PathSegment::LineTo(3.0, 1.0),
            PathSegment::LineTo(6.0, 1.0),
            PathSegment::LineTo(6.0, -3.0),
            PathSegment::ClosePath,
        ]
    );
}

#[test]
fn test_relative_move_after_close_starts_from_subpath() {
    assert_eq!(
        segments("M 10,10 L 20,10 Z m 1,1"),
        vec![
            PathSegment::MoveTo(10.0, 10.0),
            PathSegment::LineTo(20.0, 10.0),
            PathSegment::ClosePath,
            PathSegment::MoveTo(11.0, 11.0),
        ]
    );
}

#[test]
fn test_smooth_curve_reflects_control_point() {
    let path = segments("M 0,0 C 1,1 2,1 3,0 S 5,-1 6,0");
    assert_eq!(path.len(), 3);
    assert_curve(path[2], [4.0, -1.0, 5.0, -1.0, 6.0, 0.0]);
}

#[test]
fn test_smooth_curve_after_curve_without_spaces() {
    let path = segments("M0,0 C0,0 10,10 20,0 S30,10 40,0");
    assert_curve(path[2], [30.0, -10.0, 30.0, 10.0, 40.0, 0.0]);
}

#[test]
fn test_smooth_curve_without_previous_curve() {
    let path = segments("M 2,2 S 3,3 4,2");
    assert_curve(path[1], [2.0, 2.0, 3.0, 3.0, 4.0, 2.0]);
}

#[test]
fn test_quadratic_becomes_cubic() {
    let path = segments("M 0,0 Q 3,3 6,0");
    assert_curve(path[1], [2.0, 2.0, 4.0, 2.0, 6.0, 0.0]);
}

#[test]
fn test_arc_is_consumed_but_not_drawn() {
    assert_eq!(
        segments("M 0,0 A 5,5 0 0 1 10,0 L 10,10"),
        vec![PathSegment::MoveTo(0.0, 0.0), PathSegment::LineTo(10.0, 10.0)]
    );
}

#[test]
fn test_fill_rule_command() {
    let mut path = PathBuilder::new();
    parse_path_data("F1 M 0,0 L 1,1", &mut path).expect("parse path data");
    assert_eq!(path.fill_rule, Some(FillRule::NonZero));

    let mut path = PathBuilder::new();
    parse_path_data("F0 M 0,0 L 1,1", &mut path).expect("parse path data");
    assert_eq!(path.fill_rule, Some(FillRule::EvenOdd));
}

#[test]
fn test_missing_coordinate_reports_offset() {
    let mut path = PathBuilder::new();
    let err = parse_path_data("M 1,2 L 3", &mut path).unwrap_err();
    assert!(matches!(err, XpsError::PathParse { pos: 9, .. }), "{err}");
}

#[test]
fn test_unknown_command_is_an_error() {
    let mut path = PathBuilder::new();
    let err = parse_path_data("M 0,0 X 1,1", &mut path).unwrap_err();
    assert!(matches!(err, XpsError::PathParse { pos: 6, .. }), "{err}");
}

#[test]
fn test_lowercase_fill_rule_is_rejected() {
    let mut path = PathBuilder::new();
    let err = parse_path_data("f1 M 0,0", &mut path).unwrap_err();
    assert!(matches!(err, XpsError::PathParse { .. }));
}

#[test]
fn test_empty_data_draws_nothing() {
    assert!(segments("").is_empty());
    assert!(segments("   ").is_empty());
}
