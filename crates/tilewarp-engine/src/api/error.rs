use thiserror::Error;

/// Fatal stage construction errors. A stage that fails with one of these is
/// never simulated.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("unknown entity kind `{kind}`")]
    UnknownKind { kind: String },

    #[error("invalid rotation {rotation}, expected a quarter turn")]
    InvalidRotation { rotation: i32 },

    #[error("portal record #{index} has no pair id")]
    MissingPairId { index: usize },

    #[error("portal pair `{pair_id}` has {count} portals, expected exactly 2")]
    PortalPairing { pair_id: String, count: usize },

    #[error("stage {index} is not in the catalog")]
    MissingStage { index: u32 },

    #[error("malformed stage data: {0}")]
    Parse(#[from] serde_json::Error),
}
