//! Plain-text `.xyz` point files: one `x y z` triple per line.

use std::io::{BufRead, Write};

use glam::Vec3;

use crate::error::FsError;

/// Write one line per point.
pub fn write_xyz<W: Write>(mut writer: W, points: &[Vec3]) -> Result<(), FsError> {
    for p in points {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse points written by [`write_xyz`].
///
/// Blank lines and lines starting with `#` are skipped. Extra columns
/// after the third (normals, colours) are ignored.
pub fn read_xyz<R: BufRead>(reader: R) -> Result<Vec<Vec3>, FsError> {
    let mut points = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let invalid = || FsError::InvalidPointFile { line: index + 1 };
        let mut fields = trimmed.split_whitespace().map(str::parse::<f32>);
        let mut next = || fields.next().and_then(Result::ok).ok_or_else(invalid);
        points.push(Vec3::new(next()?, next()?, next()?));
    }
    Ok(points)
}

/// File name used when saving a capture, e.g. `points_1700000000.xyz`.
pub fn export_file_name(timestamp_secs: u64) -> String {
    format!("points_{timestamp_secs}.xyz")
}
