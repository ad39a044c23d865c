use crate::error::{Error, Result, Stage};
use crate::naming::{is_file_name_token, safe_case_token};
use crate::sanitize::{ParcelId, sanitize_identifiers};
use serde::{Deserialize, Serialize};

/// Display strings for the case. They only feed text stamping and export naming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub project_name: String,
    pub case_id: String,
    pub project_manager: String,
    pub carto_code: String,
}

/// Everything the parameter surface supplies for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseParameters {
    #[serde(flatten)]
    pub metadata: CaseMetadata,
    /// Free text: one or more identifiers separated by commas and/or whitespace.
    pub parcels: String,
}

impl CaseParameters {
    /// Sanitized identifiers, or an input error when there are none or the case id is blank or
    /// not usable as a file name.
    pub fn identifiers(&self) -> Result<Vec<ParcelId>> {
        let token = safe_case_token(&self.metadata.case_id);
        if token.is_empty() {
            return Err(Error::InvalidInput {
                stage: Stage::Input,
                message: "case identifier is empty".to_string(),
            });
        }
        if !is_file_name_token(&token) {
            return Err(Error::InvalidInput {
                stage: Stage::Input,
                message: format!(
                    "case identifier {:?} cannot be used as a file name",
                    self.metadata.case_id
                ),
            });
        }
        let ids = sanitize_identifiers(&self.parcels);
        if ids.is_empty() {
            return Err(Error::InvalidInput {
                stage: Stage::Input,
                message: format!("no parcel identifiers in {:?}", self.parcels),
            });
        }
        Ok(ids)
    }
}
