//! Attribute value grammars.
//!
//! Small parsers for the scalar attribute types of fixed-page markup. They
//! return `None` on malformed input; callers turn that into an
//! `InvalidContent` error naming the element and attribute.

use itertools::Itertools;

use crate::model::DashArray;
use crate::utils::{Matrix, Point, Rectangle};

/// Parses a finite double.
pub fn parse_double(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_int(value: &str) -> Option<i32> {
    value.trim().parse().ok()
}

/// Booleans are exactly `true` or `false`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parses `x,y`. The split happens at the last comma.
pub fn parse_point(value: &str) -> Option<Point> {
    let (x, y) = value.trim().rsplit_once(',')?;
    Some((parse_double(x)?, parse_double(y)?))
}

/// Parses six comma-separated doubles.
pub fn parse_matrix(value: &str) -> Option<Matrix> {
    value
        .split(',')
        .map(parse_double)
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .collect_tuple()
}

/// Parses `x,y,width,height`.
pub fn parse_box(value: &str) -> Option<Rectangle> {
    let (x, y, width, height) = value
        .split(',')
        .map(parse_double)
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .collect_tuple()?;
    Some(Rectangle::new(x, y, width, height))
}

/// Parses a whitespace-separated dash array.
pub fn parse_dash_array(value: &str) -> Option<DashArray> {
    value.split_whitespace().map(parse_double).collect()
}

/// Parses the whitespace-separated `x,y` list of a poly segment.
pub fn parse_points(value: &str) -> Option<Vec<Point>> {
    value.split_whitespace().map(parse_point).collect()
}

/// Returns the key of a `{StaticResource key}` reference.
pub fn static_resource_key(value: &str) -> Option<&str> {
    let inner = value.trim().strip_prefix('{')?.strip_suffix('}')?;
    let key = inner.trim_start().strip_prefix("StaticResource")?;
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matrix_requires_six_values() {
        assert_eq!(
            parse_matrix("1,0,0,1,10.5,-3"),
            Some((1.0, 0.0, 0.0, 1.0, 10.5, -3.0))
        );
        assert_eq!(parse_matrix("1,0,0,1,10"), None);
        assert_eq!(parse_matrix("1,0,0,1,10,2,3"), None);
    }

    #[test]
    fn test_parse_bool_is_strict() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("True"), None);
    }

    #[test]
    fn test_static_resource_key() {
        assert_eq!(static_resource_key("{StaticResource Brush1}"), Some("Brush1"));
        assert_eq!(static_resource_key("#FF0000"), None);
        assert_eq!(static_resource_key("{StaticResource }"), None);
    }

    #[test]
    fn test_parse_points() {
        assert_eq!(
            parse_points("0,0 10,5\t20,10"),
            Some(vec![(0.0, 0.0), (10.0, 5.0), (20.0, 10.0)])
        );
        assert_eq!(parse_points("0,0 10"), None);
    }
}
