//! Interactive push-pull of mesh faces.
//!
//! A drag moves through `Idle → Hovering → Dragging → Applying → Idle`.
//! While dragging, every update restores the pre-drag vertex snapshot before
//! moving the face, and every failure restores it before reporting, so a
//! mesh is never left half-edited.

mod local_extrusion;
mod panel_cut;
mod session;
mod strategy;

pub use local_extrusion::LocalExtrusion;
pub use session::DragSession;
pub use strategy::{
    FacePayload, GeometryPayload, ReExtrusionRequest, ReExtrusionResponse, ReExtrusionStrategy,
    StrategyError,
};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{PushPullError, Result, WallcraftError};
use crate::math::Tolerances;
use crate::operations::boolean::{BooleanEvaluator, BspEvaluator};
use crate::scene::{FaceDescriptor, ObjectId, ObjectKind, Scene, SceneObject};
use crate::tessellation::TriangleMesh;

/// Push-pull settings.
#[derive(Debug, Clone, Copy)]
pub struct PushPullConfig {
    pub tolerances: Tolerances,
    /// How far a panel cutter starts outside the support surface.
    pub cut_clearance: f64,
}

impl Default for PushPullConfig {
    fn default() -> Self {
        Self {
            tolerances: Tolerances::default(),
            cut_clearance: 1.0,
        }
    }
}

/// A release waiting on the re-extrusion strategy.
#[derive(Debug, Clone)]
pub struct ReExtrusionTicket {
    /// Pass back to [`PushPullEngine::complete`].
    pub generation: u64,
    pub object: ObjectId,
    pub request: ReExtrusionRequest,
}

/// What a release did to the scene.
#[derive(Debug)]
pub enum ReleaseOutcome {
    /// Zero distance; the object is exactly as before the drag.
    Unchanged,
    /// The object's mesh was replaced by re-extruded geometry.
    Replaced {
        object: ObjectId,
        /// Pre-drag mesh, handed back for release.
        superseded: TriangleMesh,
    },
    /// A cutting panel was pushed into its support and consumed.
    Cut {
        support: ObjectId,
        /// The support's mesh before the cut.
        superseded: TriangleMesh,
        /// The panel, removed from the scene.
        panel: SceneObject,
    },
    /// The strategy has to run; finish with [`PushPullEngine::complete`].
    Pending(ReExtrusionTicket),
    /// A strategy result arrived for a release that was cancelled or
    /// superseded and was dropped.
    Discarded,
}

#[derive(Debug, Clone, Default)]
pub enum PushPullState {
    #[default]
    Idle,
    Hovering(FaceDescriptor),
    Dragging(DragSession),
    Applying {
        session: DragSession,
        generation: u64,
    },
}

/// Drives one push-pull interaction at a time.
pub struct PushPullEngine {
    config: PushPullConfig,
    evaluator: Arc<dyn BooleanEvaluator>,
    state: PushPullState,
    generation: u64,
}

impl Default for PushPullEngine {
    fn default() -> Self {
        Self::new(PushPullConfig::default())
    }
}

impl PushPullEngine {
    #[must_use]
    pub fn new(config: PushPullConfig) -> Self {
        Self::with_evaluator(config, Arc::new(BspEvaluator))
    }

    #[must_use]
    pub fn with_evaluator(config: PushPullConfig, evaluator: Arc<dyn BooleanEvaluator>) -> Self {
        Self {
            config,
            evaluator,
            state: PushPullState::Idle,
            generation: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &PushPullState {
        &self.state
    }

    /// `true` while a drag or an outstanding release owns a mesh.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            PushPullState::Dragging(_) | PushPullState::Applying { .. }
        )
    }

    /// Hovers the face of `object` that contains `triangle`.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::SessionActive`] during a drag, or the error
    /// of [`Scene::describe_face`].
    pub fn hover(&mut self, scene: &Scene, object: ObjectId, triangle: usize) -> Result<&FaceDescriptor> {
        if self.is_active() {
            return Err(PushPullError::SessionActive.into());
        }
        let face = scene.describe_face(object, triangle, self.config.tolerances)?;
        debug!(?object, triangle, triangles = face.triangle_indices.len(), "hovering face");
        self.state = PushPullState::Hovering(face);
        match &self.state {
            PushPullState::Hovering(face) => Ok(face),
            _ => Err(PushPullError::NotHovering.into()),
        }
    }

    /// Drops the hovered face.
    pub fn clear_hover(&mut self) {
        if matches!(self.state, PushPullState::Hovering(_)) {
            self.state = PushPullState::Idle;
        }
    }

    /// Starts dragging the hovered face.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::SessionActive`] if a drag or release is
    /// outstanding, [`PushPullError::NotHovering`] without a hovered face, and
    /// [`PushPullError::StaleFace`] if the object changed since hovering.
    pub fn press(&mut self, scene: &Scene) -> Result<()> {
        let face = match std::mem::take(&mut self.state) {
            PushPullState::Hovering(face) => face,
            PushPullState::Idle => return Err(PushPullError::NotHovering.into()),
            active => {
                self.state = active;
                return Err(PushPullError::SessionActive.into());
            }
        };
        let object = scene.get(face.object)?;
        if object.revision() != face.revision {
            return Err(PushPullError::StaleFace.into());
        }
        let session = DragSession::start(face, &object.mesh, self.config.tolerances.plane);
        debug!(
            object = ?session.face.object,
            affected = session.affected.len(),
            "drag started"
        );
        self.state = PushPullState::Dragging(session);
        Ok(())
    }

    /// Moves the dragged face to `distance` along its normal.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::NoActiveSession`] outside a drag and
    /// [`PushPullError::InvalidDistance`] for non-finite input; the preview is
    /// left at the last valid distance. Returns [`PushPullError::StaleFace`]
    /// and ends the session if the object was replaced or edited elsewhere.
    pub fn update(&mut self, scene: &mut Scene, distance: f64) -> Result<()> {
        let PushPullState::Dragging(session) = &mut self.state else {
            return Err(PushPullError::NoActiveSession.into());
        };
        if !distance.is_finite() {
            return Err(PushPullError::InvalidDistance(distance).into());
        }
        if !session.is_current(scene) {
            let object = session.face.object;
            return Err(self.drop_stale(object));
        }
        let mesh = scene.mesh_mut(session.face.object)?;
        session.apply(mesh, distance);
        session.mark_current(scene);
        Ok(())
    }

    /// Commits the drag, running `strategy` in place when re-extrusion is
    /// needed.
    ///
    /// # Errors
    ///
    /// Any failure restores the pre-drag geometry and ends the session; see
    /// [`begin_release`](Self::begin_release) and
    /// [`complete`](Self::complete).
    pub fn release(&mut self, scene: &mut Scene, strategy: &dyn ReExtrusionStrategy) -> Result<ReleaseOutcome> {
        match self.begin_release(scene)? {
            ReleaseOutcome::Pending(ticket) => {
                let response = strategy.re_extrude(&ticket.request);
                self.complete(scene, ticket.generation, response)
            }
            outcome => Ok(outcome),
        }
    }

    /// Commits the drag without blocking on the strategy.
    ///
    /// Zero distance and panel cuts finish immediately. Otherwise the engine
    /// enters `Applying` and returns a ticket whose request must be sent to a
    /// strategy; the preview stays visible until
    /// [`complete`](Self::complete) or [`cancel`](Self::cancel).
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::NoActiveSession`] outside a drag and
    /// [`PushPullError::StaleFace`] if the object changed during it. Panel cut
    /// failures ([`PushPullError::NoSupportObjectFound`] or a boolean error)
    /// restore the panel and end the session.
    pub fn begin_release(&mut self, scene: &mut Scene) -> Result<ReleaseOutcome> {
        let session = match std::mem::take(&mut self.state) {
            PushPullState::Dragging(session) => session,
            other => {
                self.state = other;
                return Err(PushPullError::NoActiveSession.into());
            }
        };
        let object = session.face.object;
        if !session.is_current(scene) {
            return Err(self.drop_stale(object));
        }
        let distance = session.distance;
        if !distance.is_finite() {
            return Err(self.fail(scene, &session, PushPullError::InvalidDistance(distance).into()));
        }
        if distance == 0.0 {
            revert(scene, &session);
            debug!(?object, "released without movement");
            return Ok(ReleaseOutcome::Unchanged);
        }

        let kind = scene.get(object)?.kind;
        let current = &scene.get(object)?.mesh;
        let original = session.original(current);

        if let (ObjectKind::CuttingPanel { support }, true) = (kind, distance < 0.0) {
            revert(scene, &session);
            return match panel_cut::cut_into_support(
                scene,
                &session.face,
                &original,
                support,
                -distance,
                self.config.cut_clearance,
                &*self.evaluator,
            ) {
                Ok(cut) => {
                    info!(panel = ?object, support = ?cut.support, depth = -distance, "panel cut committed");
                    Ok(ReleaseOutcome::Cut {
                        support: cut.support,
                        superseded: cut.superseded,
                        panel: cut.panel,
                    })
                }
                Err(err) => Err(self.fail(scene, &session, err)),
            };
        }

        let request = ReExtrusionRequest {
            geometry: GeometryPayload::from_mesh(&original),
            face: FacePayload::from_face(&session.face, &original),
            distance,
        };
        self.generation += 1;
        let generation = self.generation;
        debug!(?object, distance, generation, "awaiting re-extrusion");
        self.state = PushPullState::Applying { session, generation };
        Ok(ReleaseOutcome::Pending(ReExtrusionTicket {
            generation,
            object,
            request,
        }))
    }

    /// Applies a strategy result for the release with `generation`.
    ///
    /// Results for a cancelled or superseded release are dropped and reported
    /// as [`ReleaseOutcome::Discarded`].
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::StrategyUnavailable`] if the strategy failed
    /// or returned unusable geometry; the pre-drag mesh is restored. Returns
    /// [`PushPullError::StaleFace`] without touching the object if it was
    /// replaced while the strategy ran.
    pub fn complete(
        &mut self,
        scene: &mut Scene,
        generation: u64,
        response: std::result::Result<ReExtrusionResponse, StrategyError>,
    ) -> Result<ReleaseOutcome> {
        let session = match std::mem::take(&mut self.state) {
            PushPullState::Applying {
                session,
                generation: current,
            } if current == generation => session,
            other => {
                self.state = other;
                debug!(generation, "discarding stale re-extrusion result");
                return Ok(ReleaseOutcome::Discarded);
            }
        };

        if !session.is_current(scene) {
            return Err(self.drop_stale(session.face.object));
        }

        let mesh = response.and_then(|r| r.geometry.to_mesh()).and_then(|mesh| {
            if mesh.is_degenerate() {
                Err(StrategyError::new("strategy returned empty geometry"))
            } else {
                Ok(mesh)
            }
        });
        let mesh = match mesh {
            Ok(mesh) => mesh,
            Err(err) => {
                return Err(self.fail(scene, &session, PushPullError::StrategyUnavailable(err.message).into()));
            }
        };

        let object = session.face.object;
        revert(scene, &session);
        let superseded = scene.replace_mesh(object, mesh)?;
        info!(
            ?object,
            distance = session.distance,
            triangles = scene.get(object)?.mesh.triangle_count(),
            "re-extrusion committed"
        );
        Ok(ReleaseOutcome::Replaced { object, superseded })
    }

    /// Aborts the interaction, restoring the pre-drag mesh. Any strategy
    /// result still in flight will be discarded.
    pub fn cancel(&mut self, scene: &mut Scene) {
        match std::mem::take(&mut self.state) {
            PushPullState::Dragging(session) | PushPullState::Applying { session, .. } => {
                revert(scene, &session);
                self.generation += 1;
                debug!(object = ?session.face.object, "drag cancelled");
            }
            PushPullState::Idle | PushPullState::Hovering(_) => {}
        }
    }

    fn fail(&mut self, scene: &mut Scene, session: &DragSession, err: WallcraftError) -> WallcraftError {
        revert(scene, session);
        self.state = PushPullState::Idle;
        warn!(object = ?session.face.object, error = %err, "push-pull reverted");
        err
    }

    /// Ends a session whose object changed underneath it. The object keeps
    /// its new mesh.
    fn drop_stale(&mut self, object: ObjectId) -> WallcraftError {
        self.state = PushPullState::Idle;
        warn!(?object, "object changed during drag, session dropped");
        PushPullError::StaleFace.into()
    }
}

/// Puts the pre-drag snapshot back, unless the object no longer holds the
/// mesh the session was editing.
fn revert(scene: &mut Scene, session: &DragSession) {
    if !session.is_current(scene) {
        return;
    }
    if let Ok(mesh) = scene.mesh_mut(session.face.object) {
        session.restore(mesh);
    }
}
