//! Parquet output for the cleaned datasets.

use crate::error::Result;
use crate::pipeline::PipelineOutput;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FIELD_OUTPUT_FILE: &str = "fields.parquet";
pub const WEATHER_OUTPUT_FILE: &str = "weather_aggregates.parquet";

/// Locations and sizes of the files written for one run
#[derive(Debug, Clone)]
pub struct WrittenOutputs {
    pub fields: PathBuf,
    pub weather: PathBuf,
    pub bytes_written: u64,
}

/// Write a frame with Snappy compression and column statistics
pub fn write_parquet(frame: &DataFrame, path: &Path) -> Result<u64> {
    let mut frame = frame.clone();
    let file = File::create(path)?;

    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .with_statistics(StatisticsOptions::default())
        .finish(&mut frame)?;

    let size = std::fs::metadata(path)?.len();
    info!(
        "Wrote {} rows to {} ({} bytes)",
        frame.height(),
        path.display(),
        size
    );
    Ok(size)
}

/// Write both datasets into `dir`, creating it if needed
pub fn write_outputs(output: &PipelineOutput, dir: &Path) -> Result<WrittenOutputs> {
    std::fs::create_dir_all(dir)?;

    let fields = dir.join(FIELD_OUTPUT_FILE);
    let weather = dir.join(WEATHER_OUTPUT_FILE);

    let bytes_written =
        write_parquet(output.fields.frame(), &fields)? + write_parquet(output.weather.frame(), &weather)?;

    Ok(WrittenOutputs {
        fields,
        weather,
        bytes_written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parquet_round_trip_keeps_nulls() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather.parquet");
        let frame = df!(
            "Weather_station_ID" => [0i64, 1],
            "Rainfall" => [Some(15.0), None],
        )
        .unwrap();

        let size = write_parquet(&frame, &path).unwrap();
        assert!(size > 0);

        let read = ParquetReader::new(File::open(&path).unwrap())
            .finish()
            .unwrap();
        assert!(read.equals_missing(&frame));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let frame = df!("a" => [1i64]).unwrap();
        let result = write_parquet(&frame, Path::new("/nonexistent/dir/out.parquet"));
        assert!(result.is_err());
    }
}
