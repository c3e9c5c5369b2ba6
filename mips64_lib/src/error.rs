use thiserror::Error;

pub type MipsResult<T> = ::std::result::Result<T, MipsError>;

/// Host-level failures. Guest visible faults are not errors: they are latched as exceptions in
/// the coprocessor 0 state and serviced by the core.
#[derive(Error, Debug)]
pub enum MipsError {
    #[error("No memory attached to the core")]
    Unattached,
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("No handler bound to opcode `{0}`")]
    UnboundOpcode(&'static str),
    #[error("Call table for `{table}` is missing handlers for {missing:?}")]
    IncompleteCallTable {
        table: &'static str,
        missing: Vec<&'static str>,
    },
    #[error("Invalid state error: {0}")]
    InvalidState(String),
    #[error("Cannot assemble `{0}`")]
    BadAssembly(String),
}
