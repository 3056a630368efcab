use thiserror::Error;

/// Top-level error type for the wallcraft geometry pipeline.
#[derive(Debug, Error)]
pub enum WallcraftError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    PushPull(#[from] PushPullError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Rejected wall graph edits. The graph is never modified when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("dangling reference: {kind} {id} does not exist")]
    DanglingReference { kind: &'static str, id: String },

    #[error("invalid wall thickness {0} (must be finite and > 0)")]
    InvalidThickness(f64),

    #[error("degenerate wall: length {length} is below tolerance")]
    DegenerateWall { length: f64 },

    #[error("invalid opening placement: {0}")]
    InvalidOpeningPlacement(String),

    #[error("coordinate is not finite")]
    NonFiniteCoordinate,

    #[error("a wall between these nodes already exists")]
    DuplicateWall,
}

/// Failures in derived geometry. Always recovered locally by falling back
/// to simpler geometry for the affected wall.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("miter for wall {wall} is degenerate; using square caps")]
    MiterDegenerate { wall: String },

    #[error("boolean evaluation failed: {0}")]
    BooleanEvaluationFailed(String),

    #[error("boolean evaluation produced empty or non-finite geometry")]
    EmptyResultGeometry,

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Failures of one interactive push-pull session. The pre-drag geometry is
/// restored before any of these reaches the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PushPullError {
    #[error("no support object found behind the cutting panel")]
    NoSupportObjectFound,

    #[error("re-extrusion strategy unavailable: {0}")]
    StrategyUnavailable(String),

    #[error("invalid push-pull distance {0}")]
    InvalidDistance(f64),

    #[error("a push-pull session is already active")]
    SessionActive,

    #[error("no push-pull session is active")]
    NoActiveSession,

    #[error("no face is hovered")]
    NotHovering,

    #[error("object does not exist in the scene")]
    UnknownObject,

    #[error("triangle {triangle} does not exist or is degenerate")]
    FaceNotFound { triangle: usize },

    #[error("face refers to a mesh that has since changed")]
    StaleFace,
}

/// Graph snapshot encoding errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("snapshot decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(#[from] GraphError),
}

/// Convenience type alias for results using [`WallcraftError`].
pub type Result<T> = std::result::Result<T, WallcraftError>;
