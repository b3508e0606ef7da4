use super::{SignatureError, MAX_CONTAINER_DEPTH, MAX_SIGNATURE};
use crate::protocol::Type;

/// Validate that `bytes` is a well-formed D-Bus signature.
pub(crate) const fn validate(bytes: &[u8]) -> Result<(), SignatureError> {
    if bytes.len() >= MAX_SIGNATURE {
        return Err(SignatureError::SignatureTooLong);
    }

    let mut pos = 0;

    while pos < bytes.len() {
        match parse_one(bytes, pos, 0, 0) {
            Ok(next) => pos = next,
            Err(error) => return Err(error),
        }
    }

    Ok(())
}

/// Parse a single complete type starting at `pos`, returning the position
/// immediately following it.
const fn parse_one(
    bytes: &[u8],
    pos: usize,
    array_depth: u32,
    struct_depth: u32,
) -> Result<usize, SignatureError> {
    if pos >= bytes.len() {
        return Err(SignatureError::UnknownTypeCode);
    }

    match Type(bytes[pos]) {
        Type::BYTE
        | Type::BOOLEAN
        | Type::INT16
        | Type::UINT16
        | Type::INT32
        | Type::UINT32
        | Type::INT64
        | Type::UINT64
        | Type::DOUBLE
        | Type::STRING
        | Type::OBJECT_PATH
        | Type::SIGNATURE
        | Type::VARIANT
        | Type::UNIX_FD => Ok(pos + 1),
        Type::ARRAY => {
            if array_depth + 1 > MAX_CONTAINER_DEPTH as u32 {
                return Err(SignatureError::ExceededMaximumArrayRecursion);
            }

            if pos + 1 >= bytes.len() {
                return Err(SignatureError::MissingArrayElementType);
            }

            match bytes[pos + 1] {
                b')' | b'}' => Err(SignatureError::MissingArrayElementType),
                b'{' => parse_dict_entry(bytes, pos + 1, array_depth + 1, struct_depth),
                _ => parse_one(bytes, pos + 1, array_depth + 1, struct_depth),
            }
        }
        Type::OPEN_PAREN => {
            if struct_depth + 1 > MAX_CONTAINER_DEPTH as u32 {
                return Err(SignatureError::ExceededMaximumStructRecursion);
            }

            parse_struct_fields(bytes, pos + 1, array_depth, struct_depth + 1, 0)
        }
        Type::CLOSE_PAREN => Err(SignatureError::StructEndedButNotStarted),
        Type::OPEN_BRACE => Err(SignatureError::DictEntryNotInsideArray),
        Type::CLOSE_BRACE => Err(SignatureError::DictEndedButNotStarted),
        _ => Err(SignatureError::UnknownTypeCode),
    }
}

const fn parse_struct_fields(
    bytes: &[u8],
    pos: usize,
    array_depth: u32,
    struct_depth: u32,
    fields: u32,
) -> Result<usize, SignatureError> {
    if pos >= bytes.len() {
        return Err(SignatureError::StructStartedButNotEnded);
    }

    if let b')' = bytes[pos] {
        return if fields == 0 {
            Err(SignatureError::StructHasNoFields)
        } else {
            Ok(pos + 1)
        };
    }

    match parse_one(bytes, pos, array_depth, struct_depth) {
        Ok(next) => parse_struct_fields(bytes, next, array_depth, struct_depth, fields + 1),
        Err(error) => Err(error),
    }
}

const fn is_basic_type(byte: u8) -> bool {
    matches!(
        Type(byte),
        Type::BYTE
            | Type::BOOLEAN
            | Type::INT16
            | Type::UINT16
            | Type::INT32
            | Type::UINT32
            | Type::INT64
            | Type::UINT64
            | Type::DOUBLE
            | Type::STRING
            | Type::OBJECT_PATH
            | Type::SIGNATURE
            | Type::UNIX_FD
    )
}

const fn parse_dict_entry(
    bytes: &[u8],
    open_brace: usize,
    array_depth: u32,
    struct_depth: u32,
) -> Result<usize, SignatureError> {
    let key_pos = open_brace + 1;

    if key_pos >= bytes.len() || bytes[key_pos] == b'}' {
        return Err(SignatureError::DictEntryHasNoFields);
    }

    if !is_basic_type(bytes[key_pos]) {
        return Err(SignatureError::DictKeyMustBeBasicType);
    }

    let after_key = match parse_one(bytes, key_pos, array_depth, struct_depth) {
        Ok(next) => next,
        Err(error) => return Err(error),
    };

    if after_key >= bytes.len() || bytes[after_key] == b'}' {
        return Err(SignatureError::DictEntryHasOnlyOneField);
    }

    let after_value = match parse_one(bytes, after_key, array_depth, struct_depth) {
        Ok(next) => next,
        Err(error) => return Err(error),
    };

    if after_value >= bytes.len() {
        return Err(SignatureError::DictStartedButNotEnded);
    }

    if bytes[after_value] == b'}' {
        return Ok(after_value + 1);
    }

    // A third field is present: this is definitely too many, regardless of
    // whether it parses as a well-formed type.
    match parse_one(bytes, after_value, array_depth, struct_depth) {
        Ok(_) => Err(SignatureError::DictEntryHasTooManyFields),
        Err(error) => Err(error),
    }
}
