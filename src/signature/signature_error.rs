use std::error;
use std::fmt;

/// Detailed errors raised when validation of a [`Signature`] fails.
///
/// [`Signature`]: crate::Signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SignatureError {
    UnknownTypeCode,
    SignatureTooLong,
    MissingArrayElementType,
    StructEndedButNotStarted,
    DictEndedButNotStarted,
    StructStartedButNotEnded,
    DictStartedButNotEnded,
    StructHasNoFields,
    DictKeyMustBeBasicType,
    DictEntryHasNoFields,
    DictEntryHasOnlyOneField,
    DictEntryNotInsideArray,
    ExceededMaximumArrayRecursion,
    ExceededMaximumStructRecursion,
    DictEntryHasTooManyFields,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            SignatureError::UnknownTypeCode => "unknown type code in signature",
            SignatureError::SignatureTooLong => "signature exceeds maximum length",
            SignatureError::MissingArrayElementType => "array is missing its element type",
            SignatureError::StructEndedButNotStarted => "struct closed without being opened",
            SignatureError::DictEndedButNotStarted => "dict entry closed without being opened",
            SignatureError::StructStartedButNotEnded => "struct opened but never closed",
            SignatureError::DictStartedButNotEnded => "dict entry opened but never closed",
            SignatureError::StructHasNoFields => "struct has no fields",
            SignatureError::DictKeyMustBeBasicType => "dict entry key must be a basic type",
            SignatureError::DictEntryHasNoFields => "dict entry has no fields",
            SignatureError::DictEntryHasOnlyOneField => "dict entry is missing its value",
            SignatureError::DictEntryNotInsideArray => "dict entry must appear inside an array",
            SignatureError::ExceededMaximumArrayRecursion => "exceeded maximum array nesting",
            SignatureError::ExceededMaximumStructRecursion => "exceeded maximum struct nesting",
            SignatureError::DictEntryHasTooManyFields => "dict entry has more than two fields",
        };

        f.write_str(message)
    }
}

impl error::Error for SignatureError {}
