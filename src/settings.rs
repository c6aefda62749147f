//! Transcoder settings
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    ApicizeError, BatchOptions, ExportOptions, ImportOptions, ParserOptions,
    SerializationSaveSuccess, open_data_file, save_data_file,
};

/// Settings shared by export, import and batch operations
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TranscoderSettings {
    #[serde(default)]
    pub export: ExportOptions,
    #[serde(default)]
    pub parser: ParserOptions,
    #[serde(default)]
    pub batch: BatchOptions,
}

impl TranscoderSettings {
    /// Open settings from file; or, if specified, use defaults if the file does not exist
    pub fn open(
        file_name: &Path,
        use_defaults_if_missing: bool,
    ) -> Result<TranscoderSettings, ApicizeError> {
        if file_name.is_file() || !use_defaults_if_missing {
            Ok(open_data_file::<TranscoderSettings>(file_name)?.data)
        } else {
            Ok(TranscoderSettings::default())
        }
    }

    /// Save settings to file
    pub fn save(&self, file_name: &Path) -> Result<SerializationSaveSuccess, ApicizeError> {
        save_data_file(file_name, self).map_err(ApicizeError::from)
    }

    /// Import options derived from these settings
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            parser: self.parser.clone(),
        }
    }
}
