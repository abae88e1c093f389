//! Typed accessors over text-formatted kernel attribute files (sysfs, hwmon,
//! cpufreq). Every read is a single `read_to_string`; every write is a
//! single `write`. Callers decide what "absent" means — a missing path is
//! `None` from `read_*`, never an error.

use std::fs;
use std::path::{Path, PathBuf};

use ucc_error::{Result, UccError};

/// A single kernel attribute file, addressed by path.
///
/// Read failures (missing file, permission, parse) collapse to `None`;
/// write failures surface as a typed [`UccError`].
#[derive(Debug, Clone)]
pub struct SysfsAttr {
    path: PathBuf,
}

impl SysfsAttr {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_available(&self) -> bool {
        self.path.exists() && fs::metadata(&self.path).map(|m| !m.is_dir()).unwrap_or(false)
    }

    fn read_raw(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok().map(|s| s.trim().to_string())
    }

    pub fn read_string(&self) -> Option<String> {
        self.read_raw()
    }

    pub fn read_i32(&self) -> Option<i32> {
        self.read_raw()?.parse().ok()
    }

    pub fn read_u32(&self) -> Option<u32> {
        self.read_raw()?.parse().ok()
    }

    pub fn read_bool(&self) -> Option<bool> {
        match self.read_raw()?.as_str() {
            "1" | "y" | "Y" | "true" => Some(true),
            "0" | "n" | "N" | "false" => Some(false),
            _ => None,
        }
    }

    /// Parses an integer list that may mix space-separated values and
    /// hyphenated inclusive ranges, e.g. `"0-3 5 7-9"` -> `{0,1,2,3,5,7,8,9}`.
    /// Returned sorted ascending and de-duplicated.
    pub fn read_list_i32(&self) -> Option<Vec<i32>> {
        let raw = self.read_raw()?;
        let mut values = Vec::new();
        for token in raw.split_whitespace() {
            if let Some((lo, hi)) = token.split_once('-') {
                let lo: i32 = lo.parse().ok()?;
                let hi: i32 = hi.parse().ok()?;
                if lo > hi {
                    return None;
                }
                values.extend(lo..=hi);
            } else {
                values.push(token.parse().ok()?);
            }
        }
        values.sort_unstable();
        values.dedup();
        Some(values)
    }

    pub fn read_list_string(&self) -> Option<Vec<String>> {
        let raw = self.read_raw()?;
        Some(raw.split_whitespace().map(str::to_string).collect())
    }

    pub fn write_string(&self, value: &str) -> Result<()> {
        fs::write(&self.path, value)
            .map_err(|e| UccError::hw_write(&self.path, e.to_string()))
    }

    pub fn write_i32(&self, value: i32) -> Result<()> {
        self.write_string(&value.to_string())
    }

    pub fn write_bool(&self, value: bool) -> Result<()> {
        self.write_string(if value { "1" } else { "0" })
    }

    pub fn write_list_i32(&self, values: &[i32]) -> Result<()> {
        let joined = values.iter().map(i32::to_string).collect::<Vec<_>>().join(" ");
        self.write_string(&joined)
    }
}

/// Reads a millidegree-Celsius hwmon temperature attribute into degrees C.
pub fn read_millidegree_c(attr: &SysfsAttr) -> Option<f32> {
    attr.read_i32().map(|m| m as f32 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_hyphenated_ranges() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "0-3 5 7-9").unwrap();
        let attr = SysfsAttr::new(f.path());
        assert_eq!(attr.read_list_i32(), Some(vec![0, 1, 2, 3, 5, 7, 8, 9]));
    }

    #[test]
    fn dedups_and_sorts() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "5 1-3 2").unwrap();
        let attr = SysfsAttr::new(f.path());
        assert_eq!(attr.read_list_i32(), Some(vec![1, 2, 3, 5]));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let attr = SysfsAttr::new("/nonexistent/path/for/test");
        assert_eq!(attr.read_string(), None);
        assert!(!attr.is_available());
    }

    #[test]
    fn millidegree_conversion() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "45000").unwrap();
        let attr = SysfsAttr::new(f.path());
        assert_eq!(read_millidegree_c(&attr), Some(45.0));
    }
}
