use mips64_lib::MipsError;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Can't parse configuration file: {0}")]
    Ini(#[from] ini::Error),
    #[error("Bad value `{value}` for `{key}`")]
    BadValue { key: String, value: String },
    #[error("No program image given")]
    NoImage,
    #[error("Core error: {0}")]
    Mips(#[from] MipsError),
}
