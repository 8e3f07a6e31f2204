pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot find layer '{layer_id}'")]
    LayerNotFound { layer_id: String },

    #[error("Cannot find outline feature '{feature_id}' in layer '{layer_id}'")]
    OutlineNotFound { layer_id: String, feature_id: String },

    #[error("Layer '{layer_id}' has details but declares no outline feature")]
    MissingOutline { layer_id: String },

    #[error("Feature {feature_id} has details but no `maxzoom`")]
    MissingMaxZoom { feature_id: u64 },

    #[error("Duplicate feature id '{id}' in layer '{layer_id}'")]
    DuplicateFeatureId { layer_id: String, id: String },

    #[error("Duplicate layer id: {layer_id}")]
    DuplicateLayerId { layer_id: String },

    #[error("Details of layer '{layer_id}' refer back to themselves")]
    DetailCycle { layer_id: String },

    #[error("No visible map layers")]
    NoVisibleLayers,

    #[error("Invalid zoom: {message}")]
    InvalidZoom { message: String },

    #[error("Map specification requires an `id` field")]
    MissingMapId,

    #[error("Feature {feature_id} has no usable footprint for details")]
    DegenerateDetailFootprint { feature_id: u64 },

    #[error(transparent)]
    Options(#[from] serde_json::Error),
}
