//! Scalar readers for sysfs and procfs entries.
//!
//! Kernel device attributes live in per-device files whose paths follow a
//! `<base><id><suffix>` scheme, e.g. base `/sys/class/hwmon/hwmon`, id `3`,
//! suffix `/power1_input`. The readers here construct that path, read the
//! file, and parse the first whitespace-separated token.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;

/// Build the effective path for a numbered device attribute.
#[must_use]
pub fn device_path(base: &str, id: u32, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{base}{id}{suffix}"))
}

/// Read an integer attribute, e.g. a hwmon `*_input` value.
///
/// # Errors
///
/// Returns [`ProbeError::Io`] (with the underlying OS error text) if the
/// file cannot be opened, or [`ProbeError::Parse`] if it holds no integer
/// token. A failed read never yields a stale or zeroed value.
pub fn read_int(base: &str, id: u32, suffix: &str) -> Result<i64, ProbeError> {
    let path = device_path(base, id, suffix);
    let token = read_token(&path)?;
    token.parse::<i64>().map_err(|e| {
        ProbeError::parse_with_source(
            format!("expected integer in {}, found {token:?}", path.display()),
            e,
        )
    })
}

/// Read a floating-point attribute.
///
/// # Errors
///
/// Same failure modes as [`read_int`].
pub fn read_float(base: &str, id: u32, suffix: &str) -> Result<f64, ProbeError> {
    let path = device_path(base, id, suffix);
    let token = read_token(&path)?;
    token.parse::<f64>().map_err(|e| {
        ProbeError::parse_with_source(
            format!("expected number in {}, found {token:?}", path.display()),
            e,
        )
    })
}

/// Read a string attribute, e.g. a hwmon device `name` file.
pub fn read_string(base: &str, id: u32, suffix: &str) -> Result<String, ProbeError> {
    read_token(&device_path(base, id, suffix))
}

/// First whitespace-separated token of a file.
fn read_token(path: &Path) -> Result<String, ProbeError> {
    let content = fs::read_to_string(path)?;
    content
        .split_whitespace()
        .next()
        .map(str::to_owned)
        .ok_or_else(|| ProbeError::parse(format!("{} is empty", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_attr(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn base_for(dir: &Path) -> String {
        format!("{}/dev", dir.display())
    }

    #[test]
    fn read_int_parses_a_device_attribute() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dev3")).unwrap();
        write_attr(&tmp.path().join("dev3"), "power1_input", "5000000\n");

        let value = read_int(&base_for(tmp.path()), 3, "/power1_input").unwrap();
        assert_eq!(value, 5_000_000);
    }

    #[test]
    fn read_float_accepts_integer_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dev0")).unwrap();
        write_attr(&tmp.path().join("dev0"), "freq", "1199999\n");

        let value = read_float(&base_for(tmp.path()), 0, "/freq").unwrap();
        assert!((value - 1_199_999.0).abs() < f64::EPSILON);
    }

    #[test]
    fn read_string_trims_the_trailing_newline() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dev1")).unwrap();
        write_attr(&tmp.path().join("dev1"), "name", "ina260_u14\n");

        let name = read_string(&base_for(tmp.path()), 1, "/name").unwrap();
        assert_eq!(name, "ina260_u14");
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_int(&base_for(tmp.path()), 7, "/power1_input").unwrap_err();
        assert!(matches!(err, ProbeError::Io(_)));
    }

    #[test]
    fn garbage_content_is_a_parse_error_not_garbage_output() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dev0")).unwrap();
        write_attr(&tmp.path().join("dev0"), "curr1_input", "not-a-number\n");

        let err = read_int(&base_for(tmp.path()), 0, "/curr1_input").unwrap_err();
        assert!(matches!(err, ProbeError::Parse { .. }));
    }

    #[test]
    fn empty_file_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dev0")).unwrap();
        write_attr(&tmp.path().join("dev0"), "in1_input", "");

        let err = read_int(&base_for(tmp.path()), 0, "/in1_input").unwrap_err();
        assert!(matches!(err, ProbeError::Parse { .. }));
    }
}
