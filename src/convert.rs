use std::path::Path;

use log::{info, warn};
use ndarray::Array2;

use crate::error::{Error, Result};
use crate::event::{Event, EventStream};
use crate::event_log;

/// Name of the event dataset inside each recording file.
const EVENTS_DATASET: &str = "events";

/// Per-recording file name in the raw dataset layout.
const RECORDING_FILE: &str = "Directions.h5";

/// Read the `events` dataset of an HDF5 recording into an `EventStream`.
///
/// Rows are `[t_us, x, y, pol]`; timestamps are rebased to seconds relative
/// to the first event.
pub fn read_h5_events(path: &Path) -> Result<EventStream> {
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let file = hdf5::File::open(path)?;
    let data: Array2<i64> = file.dataset(EVENTS_DATASET)?.read_2d()?;

    if data.ncols() != 4 {
        return Err(Error::invalid_parameter(format!(
            "events dataset must have 4 columns, got {}",
            data.ncols()
        )));
    }

    let mut stream = EventStream::with_capacity(data.nrows());
    let t0 = if data.nrows() > 0 { data[[0, 0]] } else { 0 };
    for row in data.rows() {
        stream.push(Event::new(
            row[1] as u16,
            row[2] as u16,
            row[3] != 0,
            (row[0] - t0) as f64 * 1e-6,
        ));
    }
    Ok(stream)
}

/// Convert one HDF5 recording to an address-event log directory.
///
/// Output layout matches what the export pipeline reads back:
/// `<out_dir>/ch0dvs/data.log`.
pub fn convert_recording(h5_path: &Path, out_dir: &Path, bottle_size: usize) -> Result<()> {
    let stream = read_h5_events(h5_path)?;
    info!(
        "{}: {} events",
        h5_path.display(),
        stream.len()
    );
    event_log::write_event_log(&out_dir.join("ch0dvs"), &stream, bottle_size)
}

/// Convert every `<in_dir>/<sample>/Directions.h5` under a dataset root.
///
/// Paths are explicit parameters; nothing is taken from the process
/// environment. A sample directory without a recording file is warned and
/// skipped; conversion errors inside a present file are fatal.
pub fn convert_dataset(in_dir: &Path, out_dir: &Path, bottle_size: usize) -> Result<usize> {
    if !in_dir.is_dir() {
        return Err(Error::MissingInput(in_dir.to_path_buf()));
    }

    let mut samples: Vec<_> = std::fs::read_dir(in_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    samples.sort();

    let mut converted = 0;
    for sample in &samples {
        let h5_path = in_dir.join(sample).join(RECORDING_FILE);
        if !h5_path.is_file() {
            warn!("{}: no {}, skipping", sample, RECORDING_FILE);
            continue;
        }
        convert_recording(&h5_path, &out_dir.join(sample), bottle_size)?;
        converted += 1;
    }
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = read_h5_events(Path::new("/nonexistent/Directions.h5")).unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_missing_dataset_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_dataset(
            &dir.path().join("absent"),
            dir.path(),
            event_log::DEFAULT_BOTTLE_SIZE,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_empty_dataset_root_converts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let n = convert_dataset(dir.path(), dir.path(), event_log::DEFAULT_BOTTLE_SIZE).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_sample_without_recording_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cam2_S1_Directions")).unwrap();
        let out = tempfile::tempdir().unwrap();
        let n = convert_dataset(dir.path(), out.path(), event_log::DEFAULT_BOTTLE_SIZE).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_h5_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let h5_path = dir.path().join("Directions.h5");
        {
            let file = hdf5::File::create(&h5_path).unwrap();
            let rows: Vec<[i64; 4]> = vec![
                [1_000_000, 10, 20, 1],
                [1_000_500, 11, 20, 0],
                [1_002_000, 12, 21, 1],
            ];
            let flat: Vec<i64> = rows.iter().flatten().copied().collect();
            let data = Array2::from_shape_vec((3, 4), flat).unwrap();
            file.new_dataset_builder()
                .with_data(&data)
                .create(EVENTS_DATASET)
                .unwrap();
        }

        let stream = read_h5_events(&h5_path).unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.ts[0], 0.0); // rebased to first event
        assert!((stream.ts[1] - 0.0005).abs() < 1e-12);
        assert_eq!(stream.x, vec![10, 11, 12]);
        assert_eq!(stream.pol, vec![true, false, true]);

        let out = tempfile::tempdir().unwrap();
        convert_recording(&h5_path, out.path(), event_log::DEFAULT_BOTTLE_SIZE).unwrap();
        let back = event_log::read_event_log(&out.path().join("ch0dvs")).unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back.x, stream.x);
    }
}
