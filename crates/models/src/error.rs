use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Market not found: {market_id}")]
    MarketNotFound { market_id: String },
}

#[derive(Error, Debug)]
#[error("unknown sport: {0}")]
pub struct ParseSportError(pub String);

#[derive(Error, Debug)]
#[error("unknown market status: {0}")]
pub struct ParseMarketStatusError(pub String);

pub type Result<T> = std::result::Result<T, RegistryError>;
