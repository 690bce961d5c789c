use serde::Deserialize;

use crate::error::RequestError;

/// Body of a transfer recommendation request. Unknown fields (the mobile
/// client also sends `chips`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransferRequest {
    pub squad: Vec<u32>,
    pub budget: f64,
    #[serde(alias = "freeTransfers")]
    pub free_transfers: usize,
}

impl TransferRequest {
    pub fn validate(self) -> Result<Self, RequestError> {
        if !self.budget.is_finite() {
            return Err(RequestError::InvalidBudget(self.budget));
        }
        Ok(self)
    }
}

pub fn parse_transfer_request(raw: &str) -> Result<TransferRequest, RequestError> {
    let req = serde_json::from_str::<TransferRequest>(raw)?;
    req.validate()
}

/// Parses `"1, 2,3"` into ids. Empty input is an empty squad.
pub fn parse_squad_list(raw: &str) -> Result<Vec<u32>, RequestError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| RequestError::InvalidPlayerId(s.to_string()))
        })
        .collect()
}
