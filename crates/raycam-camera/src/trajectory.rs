//! Plain-text camera trajectories.
//!
//! One pose per line, whitespace separated:
//!
//! ```text
//! timestamp tx ty tz qx qy qz qw
//! ```
//!
//! The translation is the camera position in world space and the quaternion
//! (`qw` last) rotates camera axes into world axes, so each line is a
//! camera-to-world pose. Blank lines and lines starting with `#` are ignored.

use std::fs;
use std::path::Path;

use raycam_math::{pose_from_tq, Pose};

use crate::error::TrajectoryError;

const FIELDS: usize = 8;

/// Parse trajectory text into `(index, pose)` pairs.
///
/// The timestamp is read as an integer frame index; fractional timestamps are
/// truncated toward zero.
pub fn parse_indexed_trajectory(text: &str) -> Result<Vec<(i64, Pose)>, TrajectoryError> {
    let mut poses = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = i + 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELDS {
            return Err(TrajectoryError::Parse {
                line: line_no,
                reason: format!("expected {FIELDS} fields, found {}", fields.len()),
            });
        }

        let index = parse_index(fields[0]).ok_or_else(|| TrajectoryError::Parse {
            line: line_no,
            reason: format!("invalid timestamp '{}'", fields[0]),
        })?;

        let mut values = [0.0; FIELDS - 1];
        for (slot, field) in values.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TrajectoryError::Parse {
                    line: line_no,
                    reason: format!("invalid number '{field}'"),
                })?;
        }

        let [tx, ty, tz, qx, qy, qz, qw] = values;
        if qx == 0.0 && qy == 0.0 && qz == 0.0 && qw == 0.0 {
            return Err(TrajectoryError::Parse {
                line: line_no,
                reason: "zero quaternion".into(),
            });
        }
        poses.push((index, pose_from_tq([tx, ty, tz], [qx, qy, qz, qw])));
    }

    Ok(poses)
}

fn parse_index(field: &str) -> Option<i64> {
    if let Ok(i) = field.parse::<i64>() {
        return Some(i);
    }
    let f = field.parse::<f64>().ok()?;
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

/// Parse trajectory text into poses, discarding timestamps.
pub fn parse_trajectory(text: &str) -> Result<Vec<Pose>, TrajectoryError> {
    Ok(parse_indexed_trajectory(text)?
        .into_iter()
        .map(|(_, pose)| pose)
        .collect())
}

/// Read a trajectory file into `(index, pose)` pairs.
pub fn read_indexed_trajectory(path: impl AsRef<Path>) -> Result<Vec<(i64, Pose)>, TrajectoryError> {
    let text = fs::read_to_string(path)?;
    parse_indexed_trajectory(&text)
}

/// Read a trajectory file into poses.
pub fn read_trajectory(path: impl AsRef<Path>) -> Result<Vec<Pose>, TrajectoryError> {
    let text = fs::read_to_string(path)?;
    parse_trajectory(&text)
}

/// Format poses as trajectory text, numbering lines from 0.
///
/// Every value is written with six decimals, so reading the text back
/// recovers translations and quaternion components to within `5e-7`.
pub fn format_trajectory(poses: &[Pose]) -> String {
    let mut out = String::new();
    for (i, pose) in poses.iter().enumerate() {
        let t = &pose.translation.vector;
        let q = pose.rotation.coords;
        // coords is (i, j, k, w)
        out.push_str(&format!(
            "{i:05} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6} {:.6}\n",
            t.x, t.y, t.z, q.x, q.y, q.z, q.w
        ));
    }
    out
}

/// Write poses to a trajectory file.
pub fn write_trajectory(path: impl AsRef<Path>, poses: &[Pose]) -> Result<(), TrajectoryError> {
    fs::write(path, format_trajectory(poses))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use raycam_math::{look_at, Point3, Vec3};

    #[test]
    fn test_parse_basic() {
        let text = "\
# index tx ty tz qx qy qz qw
0 1.0 2.0 3.0 0.0 0.0 0.0 1.0

7 0 0 0 0 0 0.7071068 0.7071068
";
        let poses = parse_indexed_trajectory(text).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].0, 0);
        assert_eq!(poses[1].0, 7);
        assert_relative_eq!(poses[0].1.translation.vector, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(
            poses[1].1.rotation.angle(),
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_float_timestamp_truncates() {
        let poses = parse_indexed_trajectory("12.9 0 0 0 0 0 0 1").unwrap();
        assert_eq!(poses[0].0, 12);
        let poses = parse_indexed_trajectory("1305031102.175304 0 0 0 0 0 0 1").unwrap();
        assert_eq!(poses[0].0, 1305031102);
    }

    #[test]
    fn test_wrong_field_count() {
        let err = parse_trajectory("0 0 0 0 0 0 0 1\n1 0 0 0 0 0 1\n").unwrap_err();
        match err {
            TrajectoryError::Parse { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("expected 8 fields"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_number() {
        let err = parse_trajectory("0 0 zero 0 0 0 0 1").unwrap_err();
        assert!(matches!(err, TrajectoryError::Parse { line: 1, .. }));
        let err = parse_trajectory("x 0 0 0 0 0 0 1").unwrap_err();
        assert!(matches!(err, TrajectoryError::Parse { line: 1, .. }));
        let err = parse_trajectory("0 0 0 0 0 0 0 0").unwrap_err();
        assert!(matches!(err, TrajectoryError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_format_layout() {
        let text = format_trajectory(&[Pose::identity(), Pose::identity()]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "00000 0.000000 0.000000 0.000000 0.000000 0.000000 0.000000 1.000000"
        );
        assert!(lines[1].starts_with("00001 "));
    }

    #[test]
    fn test_six_decimal_precision() {
        let pose = pose_from_tq([1.0 / 3.0, -2.0 / 3.0, 1e-9], [0.0, 0.0, 0.0, 1.0]);
        let text = format_trajectory(&[pose]);
        assert!(text.starts_with("00000 0.333333 -0.666667 0.000000 "), "{text}");
        assert!(text.ends_with('\n'));

        let back = parse_trajectory(&text).unwrap();
        let t = back[0].translation.vector;
        assert!((t.x - 1.0 / 3.0).abs() <= 5e-7);
        assert!((t.y + 2.0 / 3.0).abs() <= 5e-7);
        assert_eq!(t.z, 0.0);
    }

    #[test]
    fn test_file_round_trip() {
        let poses: Vec<Pose> = (0..5)
            .map(|i| {
                let a = i as f64 * 0.7;
                let eye = Point3::new(3.0 * a.cos(), 1.5, 3.0 * a.sin());
                look_at(&eye, &Point3::origin(), &Vec3::y()).unwrap()
            })
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.txt");
        write_trajectory(&path, &poses).unwrap();

        let indexed = read_indexed_trajectory(&path).unwrap();
        assert_eq!(indexed.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

        let back = read_trajectory(&path).unwrap();
        assert_eq!(back.len(), poses.len());
        for (a, b) in poses.iter().zip(&back) {
            assert_relative_eq!(a.translation.vector, b.translation.vector, epsilon = 1e-6);
            // Quaternions q and -q are the same rotation
            assert!(a.rotation.angle_to(&b.rotation) < 1e-5);
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_trajectory(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, TrajectoryError::Io(_)));
    }
}
