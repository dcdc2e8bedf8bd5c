use serde::Deserialize;
use utoipa::IntoParams;

fn default_amount() -> u64 {
    1
}

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// How many of the most recent readings to return
    #[serde(default = "default_amount")]
    pub(crate) amount: u64,
}
