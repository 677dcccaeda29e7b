use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One training annotation, paired with one exported frame image.
///
/// Records are created at export time, appended to a single JSON array on
/// disk and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub img_name: String,
    pub ts: f64,
    /// Normalized keypoints, flat `[x, y, visibility]` per joint.
    pub keypoints: Vec<f64>,
    /// Normalized bounding-box center `[x, y]`.
    pub center: [f64; 2],
    /// Keypoints of the previously retained frame.
    pub keypoints_prev: Vec<f64>,
    /// Source action/sequence name.
    pub original_sample: String,
}

/// Truncate `path` and write `records` as a fresh JSON array.
pub fn write_new(path: &Path, records: &[AnnotationRecord]) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut file, records)?;
    file.flush()?;
    Ok(())
}

/// Append `records` onto the JSON array already stored at `path`.
///
/// Reads the existing array, extends it and rewrites the file in place from
/// the start. Appending to a file that does not exist is a `MissingInput`
/// error; use `write_new` for the first write.
pub fn append(path: &Path, records: &[AnnotationRecord]) -> Result<()> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut existing: Vec<AnnotationRecord> = serde_json::from_reader(BufReader::new(&file))?;
    existing.extend_from_slice(records);

    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    let mut writer = BufWriter::new(&file);
    serde_json::to_writer(&mut writer, &existing)?;
    writer.flush()?;
    Ok(())
}

/// Read the annotation array back from disk.
pub fn read(path: &Path) -> Result<Vec<AnnotationRecord>> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let file = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, ts: f64) -> AnnotationRecord {
        AnnotationRecord {
            img_name: name.to_string(),
            ts,
            keypoints: vec![0.5, 0.5, 2.0],
            center: [0.5, 0.5],
            keypoints_prev: vec![0.4, 0.4, 2.0],
            original_sample: "cam2_S1_Directions".to_string(),
        }
    }

    #[test]
    fn test_round_trip_field_for_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.json");
        let records = vec![record("a_200.png", 4.0), record("a_205.png", 4.1)];

        write_new(&path, &records).unwrap();
        assert_eq!(read(&path).unwrap(), records);
    }

    #[test]
    fn test_write_new_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.json");

        write_new(&path, &[record("a", 1.0), record("b", 2.0)]).unwrap();
        write_new(&path, &[record("c", 3.0)]).unwrap();

        let back = read(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].img_name, "c");
    }

    #[test]
    fn test_append_extends_existing_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.json");

        write_new(&path, &[record("a", 1.0)]).unwrap();
        append(&path, &[record("b", 2.0), record("c", 3.0)]).unwrap();

        let back = read(&path).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[2].img_name, "c");
    }

    #[test]
    fn test_append_shorter_content_leaves_no_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.json");

        // A long first write followed by a rewrite must not leave stale bytes
        let many: Vec<AnnotationRecord> = (0..50).map(|i| record("x", i as f64)).collect();
        write_new(&path, &many).unwrap();
        write_new(&path, &[record("a", 1.0)]).unwrap();
        append(&path, &[record("b", 2.0)]).unwrap();
        assert_eq!(read(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_append_to_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = append(&dir.path().join("poses.json"), &[record("a", 1.0)]).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(record("a_200.png", 4.0)).unwrap();
        assert!(json.get("img_name").is_some());
        assert!(json.get("keypoints").is_some());
        assert!(json.get("keypoints_prev").is_some());
        assert!(json.get("center").is_some());
        assert!(json.get("original_sample").is_some());
    }
}
