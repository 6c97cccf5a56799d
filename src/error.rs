//! Error types for aarpack

use thiserror::Error;

/// Main error type for aarpack operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Invalid GN list: {0}")]
    GnList(String),

    #[error("Invalid @FileArg reference: {0}")]
    FileArg(String),

    #[error("Malformed R.txt line: {0:?}")]
    RtxtParse(String),

    #[error("Invalid resource id literal {value:?} for {name}")]
    RtxtValue { name: String, value: String },

    #[error("Styleable {styleable} references attribute {attr} missing from the attr table")]
    UnresolvedStyleableAttr { styleable: String, attr: String },

    #[error("Duplicate archive entry with divergent content: {0}")]
    DuplicateEntry(String),

    #[error("Malformed asset pair (expected external:internal): {0}")]
    AssetPair(String),

    #[error("Native libraries given but no ABI configured")]
    MissingAbi,

    #[error("Native library path has no file name: {0}")]
    NativeLibPath(String),
}

/// Result type alias for aarpack operations
pub type Result<T> = std::result::Result<T, Error>;
