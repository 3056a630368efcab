use serde::{Deserialize, Serialize};

use super::wall::WallId;
use crate::error::GraphError;

slotmap::new_key_type! {
    /// Unique identifier for an opening in the wall graph.
    pub struct OpeningId;
}

/// Kind of wall opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpeningKind {
    /// Starts at floor level; `sill_height` is ignored.
    Door,
    Window,
}

/// Which way the placed asset faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpeningOrientation {
    /// Asset front faces the wall's left side.
    #[default]
    Normal,
    /// Asset rotated by π about the vertical axis.
    Flipped,
}

/// Where the placed asset sits across the wall thickness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpeningAlignment {
    #[default]
    Center,
    /// Flush with the wall's left face.
    Interior,
    /// Flush with the wall's right face.
    Exterior,
}

/// Native extents of an externally loaded opening asset (door leaf, window
/// frame) before any scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetBounds {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl AssetBounds {
    /// Uniform scale that fits the asset inside `width × height` without
    /// distortion.
    #[must_use]
    pub fn fit_scale(&self, width: f64, height: f64) -> f64 {
        (width / self.width).min(height / self.height)
    }
}

/// Final size of an opening once its asset (if any) has been fitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedSize {
    pub width: f64,
    pub height: f64,
    /// Uniform scale applied to the asset; 1.0 without an asset.
    pub scale: f64,
}

/// Parameters for creating or updating an opening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningParams {
    pub kind: OpeningKind,
    /// Distance of the opening's center from the wall's start node.
    pub position: f64,
    pub width: f64,
    pub height: f64,
    pub sill_height: f64,
    pub orientation: OpeningOrientation,
    pub alignment: OpeningAlignment,
    pub asset: Option<AssetBounds>,
}

impl OpeningParams {
    /// A door centered at `position` along the wall.
    #[must_use]
    pub fn door(position: f64, width: f64, height: f64) -> Self {
        Self {
            kind: OpeningKind::Door,
            position,
            width,
            height,
            sill_height: 0.0,
            orientation: OpeningOrientation::Normal,
            alignment: OpeningAlignment::Center,
            asset: None,
        }
    }

    /// A window centered at `position` along the wall, starting at `sill_height`.
    #[must_use]
    pub fn window(position: f64, width: f64, height: f64, sill_height: f64) -> Self {
        Self {
            kind: OpeningKind::Window,
            sill_height,
            ..Self::door(position, width, height)
        }
    }

    #[must_use]
    pub fn with_asset(mut self, asset: AssetBounds) -> Self {
        self.asset = Some(asset);
        self
    }

    #[must_use]
    pub fn with_orientation(mut self, orientation: OpeningOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: OpeningAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Checks the parameters in isolation (not against a wall).
    pub(crate) fn validate_shape(&self) -> Result<(), GraphError> {
        let finite = [self.position, self.width, self.height, self.sill_height]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GraphError::NonFiniteCoordinate);
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(GraphError::InvalidOpeningPlacement(format!(
                "opening size {} × {} must be positive",
                self.width, self.height
            )));
        }
        if self.sill_height < 0.0 {
            return Err(GraphError::InvalidOpeningPlacement(format!(
                "sill height {} is negative",
                self.sill_height
            )));
        }
        if let Some(asset) = &self.asset {
            let ok = [asset.width, asset.height, asset.depth]
                .iter()
                .all(|v| v.is_finite() && *v > 0.0);
            if !ok {
                return Err(GraphError::InvalidOpeningPlacement(
                    "asset bounds must be finite and positive".into(),
                ));
            }
        }
        Ok(())
    }
}

/// An opening cut through a wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: OpeningId,
    pub wall: WallId,
    pub kind: OpeningKind,
    /// Distance of the opening's center from the wall's start node.
    pub position: f64,
    pub width: f64,
    pub height: f64,
    pub sill_height: f64,
    pub orientation: OpeningOrientation,
    pub alignment: OpeningAlignment,
    pub asset: Option<AssetBounds>,
}

impl Opening {
    pub(crate) fn from_params(id: OpeningId, wall: WallId, params: &OpeningParams) -> Self {
        Self {
            id,
            wall,
            kind: params.kind,
            position: params.position,
            width: params.width,
            height: params.height,
            sill_height: params.sill_height,
            orientation: params.orientation,
            alignment: params.alignment,
            asset: params.asset,
        }
    }

    /// Returns the parameters this opening was built from.
    #[must_use]
    pub fn params(&self) -> OpeningParams {
        OpeningParams {
            kind: self.kind,
            position: self.position,
            width: self.width,
            height: self.height,
            sill_height: self.sill_height,
            orientation: self.orientation,
            alignment: self.alignment,
            asset: self.asset,
        }
    }

    /// Interval `[start, end]` covered along the wall centerline.
    #[must_use]
    pub fn extent(&self) -> (f64, f64) {
        extent_of(self.position, self.width)
    }

    /// Height of the opening's bottom edge above the floor.
    #[must_use]
    pub fn base_height(&self) -> f64 {
        match self.kind {
            OpeningKind::Door => 0.0,
            OpeningKind::Window => self.sill_height,
        }
    }

    /// Width and height of the placed asset after uniform fitting.
    ///
    /// Cutouts must use this rather than the requested size so the hole
    /// matches the asset's silhouette exactly.
    #[must_use]
    pub fn fitted_size(&self) -> FittedSize {
        match &self.asset {
            Some(asset) => {
                let scale = asset.fit_scale(self.width, self.height);
                FittedSize {
                    width: asset.width * scale,
                    height: asset.height * scale,
                    scale,
                }
            }
            None => FittedSize {
                width: self.width,
                height: self.height,
                scale: 1.0,
            },
        }
    }
}

pub(crate) fn extent_of(position: f64, width: f64) -> (f64, f64) {
    (position - width * 0.5, position + width * 0.5)
}

/// Checks that an opening fits inside a wall of `wall_length` and does not
/// overlap any of `others`.
pub(crate) fn validate_placement<'a>(
    params: &OpeningParams,
    wall_length: f64,
    others: impl IntoIterator<Item = &'a Opening>,
    eps: f64,
) -> Result<(), GraphError> {
    params.validate_shape()?;
    if params.width > wall_length + eps {
        return Err(GraphError::InvalidOpeningPlacement(format!(
            "opening width {} exceeds wall length {wall_length}",
            params.width
        )));
    }
    let (lo, hi) = extent_of(params.position, params.width);
    if lo < -eps || hi > wall_length + eps {
        return Err(GraphError::InvalidOpeningPlacement(format!(
            "opening extent [{lo}, {hi}] lies outside wall of length {wall_length}"
        )));
    }
    for other in others {
        let (olo, ohi) = other.extent();
        if lo < ohi - eps && olo < hi - eps {
            return Err(GraphError::InvalidOpeningPlacement(format!(
                "opening [{lo}, {hi}] overlaps opening [{olo}, {ohi}]"
            )));
        }
    }
    Ok(())
}
