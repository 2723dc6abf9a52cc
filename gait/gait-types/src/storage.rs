//! Labeled time-series tables in the plain-text storage format.
//!
//! ```text
//! name <file>
//! datacolumns <n>
//! datarows <m>
//! range <t0> <t1>
//! endheader
//! time<TAB>label_1<TAB>...
//! <value><TAB>...
//! ```
//!
//! Reading accepts any header lines up to `endheader`; an `inDegrees=yes`
//! line marks angular columns as degrees.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::GaitError;
use crate::Result;

/// A labeled table whose first column is conventionally time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionTable {
    /// Table name written to the header.
    pub name: String,
    /// Column labels.
    pub labels: Vec<String>,
    /// Rows of values, one per sample.
    pub rows: Vec<Vec<f64>>,
    /// Whether angular columns are stored in degrees.
    pub in_degrees: bool,
}

impl MotionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
            rows: Vec::new(),
            in_degrees: false,
        }
    }

    /// Mark angular columns as degrees.
    #[must_use]
    pub fn with_degrees(mut self, in_degrees: bool) -> Self {
        self.in_degrees = in_degrees;
        self
    }

    /// Append a row; its length must match the labels.
    pub fn push_row(&mut self, row: Vec<f64>) -> Result<()> {
        if row.len() != self.labels.len() {
            return Err(GaitError::parse(format!(
                "row of {} values for {} columns",
                row.len(),
                self.labels.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Number of samples.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column.
    #[must_use]
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Copy of one column.
    #[must_use]
    pub fn column(&self, label: &str) -> Option<Vec<f64>> {
        let c = self.column_index(label)?;
        Some(self.rows.iter().map(|r| r[c]).collect())
    }

    /// First column.
    #[must_use]
    pub fn time(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|r| r.first().copied().unwrap_or(0.0))
            .collect()
    }

    /// Convert the columns selected by `is_angular` from degrees to radians.
    /// Does nothing unless the table is in degrees.
    pub fn convert_to_radians(&mut self, is_angular: impl Fn(&str) -> bool) {
        if !self.in_degrees {
            return;
        }
        let columns: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| is_angular(l).then_some(i))
            .collect();
        for row in &mut self.rows {
            for &c in &columns {
                row[c] = row[c].to_radians();
            }
        }
        self.in_degrees = false;
    }

    /// Render in the storage format.
    #[must_use]
    pub fn to_storage_string(&self) -> String {
        let time = self.time();
        let (t0, t1) = time
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                (lo.min(t), hi.max(t))
            });
        let (t0, t1) = if time.is_empty() { (0.0, 0.0) } else { (t0, t1) };
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "name {}", self.name);
        let _ = writeln!(out, "datacolumns {}", self.labels.len());
        let _ = writeln!(out, "datarows {}", self.rows.len());
        let _ = writeln!(out, "range {t0:.6} {t1:.6}");
        if self.in_degrees {
            out.push_str("inDegrees=yes\n");
        }
        out.push_str("endheader\n");
        for label in &self.labels {
            let _ = write!(out, "{label}\t");
        }
        out.push('\n');
        for row in &self.rows {
            for value in row {
                let _ = write!(out, "{value:20.8}\t");
            }
            out.push('\n');
        }
        out
    }

    /// Write to `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_storage_string())?;
        Ok(())
    }

    /// Parse the storage format.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let mut name = String::new();
        let mut in_degrees = false;
        let mut found_end = false;
        for line in lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.eq_ignore_ascii_case("endheader") {
                found_end = true;
                break;
            }
            if let Some(rest) = trimmed.strip_prefix("name") {
                name = rest.trim().to_string();
            }
            if let Some((key, value)) = trimmed.split_once('=') {
                if key.trim() == "inDegrees" {
                    in_degrees = value.trim().eq_ignore_ascii_case("yes");
                }
            }
        }
        if !found_end {
            return Err(GaitError::parse("missing endheader line"));
        }
        let labels: Vec<String> = lines
            .by_ref()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| GaitError::parse("missing column labels"))?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let mut table = Self::new(name, labels).with_degrees(in_degrees);
        for (i, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|v| {
                    v.parse::<f64>().map_err(|e| {
                        GaitError::parse(format!("data line {}: {v:?}: {e}", i + 1))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Read from `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> MotionTable {
        let mut t = MotionTable::new(
            "motion",
            vec!["time".into(), "hip_flexion_r".into(), "pelvis_tx".into()],
        );
        t.push_row(vec![0.0, 10.0, 0.0]).unwrap();
        t.push_row(vec![0.5, 20.0, 0.6]).unwrap();
        t
    }

    #[test]
    fn test_header_layout() {
        let text = sample().to_storage_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name motion");
        assert_eq!(lines[1], "datacolumns 3");
        assert_eq!(lines[2], "datarows 2");
        assert_eq!(lines[3], "range 0.000000 0.500000");
        assert_eq!(lines[4], "endheader");
        assert_eq!(lines[5], "time\thip_flexion_r\tpelvis_tx\t");
        assert!(lines[6].starts_with("          0.00000000\t"));
    }

    #[test]
    fn test_parse_written_table() {
        let table = sample();
        let parsed = MotionTable::parse(&table.to_storage_string()).unwrap();
        assert_eq!(parsed.labels, table.labels);
        assert_eq!(parsed.n_rows(), 2);
        assert_relative_eq!(parsed.column("pelvis_tx").unwrap()[1], 0.6);
    }

    #[test]
    fn test_degrees_conversion() {
        let text = "Coordinates\nversion=1\nnRows=1\ninDegrees=yes\nendheader\n\
                    time hip_flexion_r pelvis_tx\n0.0 90.0 1.5\n";
        let mut table = MotionTable::parse(text).unwrap();
        assert!(table.in_degrees);
        table.convert_to_radians(|l| l != "time" && l != "pelvis_tx");
        assert_relative_eq!(table.rows[0][1], std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(table.rows[0][2], 1.5);
        assert!(!table.in_degrees);
    }

    #[test]
    fn test_parse_errors() {
        assert!(MotionTable::parse("name x\n").is_err());
        let bad = "endheader\ntime a\n0.0 abc\n";
        assert!(matches!(
            MotionTable::parse(bad).unwrap_err(),
            GaitError::Parse { .. }
        ));
        let short = "endheader\ntime a\n0.0\n";
        assert!(MotionTable::parse(short).is_err());
    }

    #[test]
    fn test_file_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motion.mot");
        sample().write(&path).unwrap();
        let back = MotionTable::read(&path).unwrap();
        assert_eq!(back.rows, sample().rows);
    }
}
