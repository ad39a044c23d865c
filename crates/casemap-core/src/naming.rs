use crate::exhibit::Exhibit;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const EXPORT_EXTENSION: &str = "pdf";

/// Filesystem-safe token for a case identifier.
///
/// Trims surrounding whitespace, then maps each remaining whitespace or hyphen character to one
/// underscore. Applying it to its own output is a no-op.
pub fn safe_case_token(case_id: &str) -> String {
    case_id
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_whitespace() || ch == '-' {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

/// Whether `token` names a single file inside the output directory.
///
/// Path separators and the `.`/`..` components are rejected.
pub fn is_file_name_token(token: &str) -> bool {
    !token.is_empty()
        && token != "."
        && token != ".."
        && !token.contains(['/', '\\', '\0'])
}

/// Deterministic artifact names for one case. A rerun overwrites the same files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportNames {
    pub token: String,
}

impl ExportNames {
    pub fn for_case(case_id: &str) -> Self {
        Self {
            token: safe_case_token(case_id),
        }
    }

    pub fn file_name(&self, exhibit: Exhibit) -> String {
        format!("{}{}.{EXPORT_EXTENSION}", self.token, exhibit.suffix())
    }

    pub fn path_in(&self, dir: &Path, exhibit: Exhibit) -> PathBuf {
        dir.join(self.file_name(exhibit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_and_hyphens_become_underscores() {
        assert_eq!(safe_case_token("23 119498"), "23_119498");
        assert_eq!(safe_case_token("2023-000123-SHOR"), "2023_000123_SHOR");
        assert_eq!(safe_case_token("  PL-24 07  "), "PL_24_07");
    }

    #[test]
    fn token_is_idempotent() {
        for raw in ["23 119498", "2023-000123-SHOR", " a - b ", "already_safe"] {
            let once = safe_case_token(raw);
            assert_eq!(safe_case_token(&once), once);
        }
    }

    #[test]
    fn tokens_that_leave_the_directory_are_not_file_names() {
        assert!(is_file_name_token("2023_000123_SHOR"));
        assert!(is_file_name_token("v1.2"));
        for bad in ["", ".", "..", "../escaped", "2023/001", "a\\b"] {
            assert!(!is_file_name_token(bad), "{bad:?}");
        }
    }

    #[test]
    fn artifact_names_use_fixed_suffixes() {
        let names = ExportNames::for_case("2023-000123-SHOR");
        assert_eq!(
            names.file_name(Exhibit::Aerial),
            "2023_000123_SHOR_Aerial.pdf"
        );
        assert_eq!(
            names.path_in(Path::new("out"), Exhibit::Overlay),
            Path::new("out").join("2023_000123_SHOR_Overlay.pdf")
        );
    }
}
