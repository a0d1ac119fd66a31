use pollset::{Error, ErrorKind};

use std::error::Error as _;
use std::io;

#[test]
fn interrupted_is_retryable() {
    let err = Error::Interrupted;

    assert!(err.is_interrupted());
    assert_eq!(err.kind(), ErrorKind::Interrupted);
}

#[test]
fn invalid_argument_names_the_problem() {
    let err = Error::InvalidArgument("descriptor exceeds FD_SETSIZE");

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(!err.is_interrupted());
    assert!(err.to_string().contains("FD_SETSIZE"));
}

#[test]
fn resource_errors_share_a_kind() {
    let too_many = Error::TooManyDescriptors {
        count: 5000,
        limit: 3969,
    };
    let create = Error::CreateResource(io::Error::from(io::ErrorKind::OutOfMemory));

    assert_eq!(too_many.kind(), ErrorKind::ResourceExhausted);
    assert_eq!(create.kind(), ErrorKind::ResourceExhausted);
    assert!(too_many.to_string().contains("5000"));
    assert!(too_many.to_string().contains("3969"));
}

#[test]
fn os_errors_keep_their_source() {
    let create = Error::CreateResource(io::Error::from(io::ErrorKind::PermissionDenied));
    let backend = Error::Backend(io::Error::from(io::ErrorKind::InvalidInput));

    assert!(create.source().is_some());
    assert!(backend.source().is_some());
    assert_eq!(backend.kind(), ErrorKind::BackendFailure);
}
