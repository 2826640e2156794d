//! Error type tests
//!
//! Tests for UpdaterError and its conversions.

#![allow(clippy::expect_used)]

use std::path::Path;

use miette::Diagnostic;

use super::{Severity, UpdaterError, fs, replace, validation};
use crate::domain::ApplicationType;

macro_rules! test_error_contains {
    ($test_name:ident, $err:expr, $($contains:expr),+ $(,)?) => {
        #[test]
        fn $test_name() {
            let err = $err;
            let error_string = err.to_string();
            $(
                assert!(error_string.contains($contains),
                    "Error message should contain '{}', got: {}",
                    $contains,
                    error_string
                );
            )+
        }
    };
}

#[test]
fn test_error_code() {
    let err = validation::not_found(Path::new("/missing"));
    assert_eq!(
        err.code().map(|c| c.to_string()),
        Some("atom_updater::validation::not_found".to_string())
    );
}

#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: UpdaterError = io_err.into();
    assert!(matches!(err, UpdaterError::IoError { .. }));
}

#[test]
fn test_rollback_failed_is_critical() {
    let copy = fs::io_error("disk full");
    let restore = fs::io_error("permission denied");
    let err = replace::rollback_failed(&copy, &restore, Path::new("/app/.backup.1"));

    assert_eq!(err.severity(), Severity::Critical);
    assert_eq!(err.exit_code(), 2);
    let message = err.to_string();
    assert!(message.contains("disk full"));
    assert!(message.contains("permission denied"));
}

#[test]
fn test_other_errors_are_recoverable() {
    let errors = [
        replace::copy_failed(&fs::io_error("boom")),
        replace::backup_failed(&fs::io_error("boom")),
        validation::bundle_argument(Path::new("/x/My.app")),
        UpdaterError::TypeMismatch {
            current: ApplicationType::SingleFile,
            new: ApplicationType::GenericDirectory,
        },
    ];

    for err in errors {
        assert_eq!(err.severity(), Severity::Recoverable, "{err}");
        assert_eq!(err.exit_code(), 1);
    }
}

test_error_contains!(
    test_type_mismatch_message,
    UpdaterError::TypeMismatch {
        current: ApplicationType::SingleFile,
        new: ApplicationType::GenericDirectory,
    },
    "single file",
    "generic directory"
);

test_error_contains!(
    test_unsupported_type_message,
    UpdaterError::UnsupportedType {
        kind: ApplicationType::MacBundle,
    },
    "Unsupported application type",
    "app bundle"
);

test_error_contains!(
    test_nested_paths_message,
    validation::nested(Path::new("/app"), Path::new("/app/update")),
    "/app/update",
    "inside"
);

test_error_contains!(
    test_stat_failed_message,
    fs::stat_failed(
        Path::new("/nope"),
        &std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")
    ),
    "/nope",
    "no such file"
);
