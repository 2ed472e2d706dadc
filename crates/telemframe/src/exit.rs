use std::fmt;
use std::io;

use telemframe_codec::CodecError;
use telemframe_schema::SchemaError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::Io(source) => io_error(context, source),
        CodecError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        CodecError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn schema_error(context: &str, err: SchemaError) -> CliError {
    match err {
        SchemaError::LoadFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        SchemaError::NotFound(_) => CliError::new(USAGE, format!("{context}: {err}")),
        // Codec errors here come from the channel list (e.g. duplicate keys).
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_errors_map_to_exit_codes() {
        assert_eq!(
            codec_error("decode", CodecError::TrailingBytes(3)).code,
            DATA_INVALID
        );
        assert_eq!(codec_error("decode", CodecError::ConnectionClosed).code, FAILURE);
        assert_eq!(
            codec_error("schema", CodecError::Config("dup".into())).code,
            USAGE
        );
        assert_eq!(
            codec_error("read", CodecError::Io(io::Error::from(io::ErrorKind::NotFound))).code,
            USAGE
        );
    }

    #[test]
    fn schema_errors_map_to_exit_codes() {
        assert_eq!(
            schema_error("load", SchemaError::LoadFailed("gone".into())).code,
            FAILURE
        );
        assert_eq!(
            schema_error("load", SchemaError::InvalidDefinition("bad".into())).code,
            DATA_INVALID
        );
        assert_eq!(
            schema_error(
                "load",
                SchemaError::TooManyChannels {
                    count: 10,
                    max: 1
                }
            )
            .code,
            DATA_INVALID
        );
        assert_eq!(
            schema_error(
                "load",
                SchemaError::Codec(CodecError::Config("duplicate channel key 1".into()))
            )
            .code,
            DATA_INVALID
        );
        let err = schema_error("load", SchemaError::NotFound("x".into()));
        assert_eq!(err.code, USAGE);
        assert_eq!(err.to_string(), "load: no schema named \"x\"");
    }
}
