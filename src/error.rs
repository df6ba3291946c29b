use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("capacity overflow: requested {requested} slots, maximum is {max}")]
    CapacityOverflow { requested: u64, max: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
