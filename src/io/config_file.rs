//! Prior configuration JSON files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::PriorConfig;
use crate::error::AppError;
use crate::io::atomic::write_atomic;

/// Write a configuration as pretty-printed JSON.
pub fn write_config_json(path: &Path, config: &PriorConfig) -> Result<(), AppError> {
    write_atomic(path, |file| {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, config)
            .map_err(|e| AppError::Io(format!("Failed to write config JSON: {e}")))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|e| AppError::Io(format!("Failed to write config JSON: {e}")))
    })
}

/// Read and validate a configuration JSON file.
pub fn read_config_json(path: &Path) -> Result<PriorConfig, AppError> {
    let file = File::open(path).map_err(|e| AppError::load(path, format!("cannot open file: {e}")))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| AppError::load(path, format!("invalid config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Preset;
    use std::fs;

    #[test]
    fn config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let config = Preset::PrecessingSpin.config().unwrap();
        write_config_json(&path, &config).unwrap();
        assert_eq!(read_config_json(&path).unwrap(), config);
    }

    #[test]
    fn invalid_config_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let config = Preset::PrecessingSpin.config().unwrap();
        write_config_json(&path, &config).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let broken = text.replace("\"is_only_up_aligned_spin\": false", "\"is_only_up_aligned_spin\": true");
        assert_ne!(text, broken);
        fs::write(&path, broken).unwrap();

        let err = read_config_json(&path).unwrap_err();
        assert!(matches!(err, AppError::Load { .. }));
        assert!(err.to_string().contains("is_spin_aligned"), "{err}");
    }
}
