//! Already-parsed slide content: placed shapes, nested groups and their properties.
//!
//! These records are what a document reader hands to the builder. They carry path commands in
//! each shape's own coordinates plus the placement boxes that position shapes inside groups and
//! groups inside the slide.

use flatmap_geom::{PathCommand, Point, Size, Transform, point};
use serde::Deserialize;

use crate::properties::Properties;

/// Where a shape or group sits within its parent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub offset: Point,
    pub extent: Size,
    /// Degrees, clockwise on screen.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub flip_h: bool,
    #[serde(default)]
    pub flip_v: bool,
}

impl Placement {
    pub fn new(offset: Point, extent: Size) -> Self {
        Self {
            offset,
            extent,
            rotation: 0.0,
            flip_h: false,
            flip_v: false,
        }
    }

    /// Maps the box `src_origin..src_origin+src_size` onto this placement.
    pub fn transform_from(&self, src_origin: Point, src_size: Size) -> Transform {
        Transform::box_to_box(
            src_origin,
            src_size,
            self.offset,
            self.extent,
            self.rotation,
            self.flip_h,
            self.flip_v,
        )
    }
}

/// A group's placement plus the local box its children are laid out in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPlacement {
    #[serde(flatten)]
    pub placement: Placement,
    pub child_offset: Point,
    pub child_extent: Size,
}

impl GroupPlacement {
    /// A group whose local box coincides with its placement.
    pub fn identity(offset: Point, extent: Size) -> Self {
        Self {
            placement: Placement::new(offset, extent),
            child_offset: offset,
            child_extent: extent,
        }
    }

    pub fn transform(&self) -> Transform {
        self.placement
            .transform_from(self.child_offset, self.child_extent)
    }
}

/// One path of a shape. `size` is the path's own coordinate box; when absent the shape's extent is
/// used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapePath {
    #[serde(default)]
    pub size: Option<Size>,
    pub commands: Vec<PathCommand>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Shape {
    #[serde(default)]
    pub properties: Properties,
    pub placement: Placement,
    pub paths: Vec<ShapePath>,
}

impl Shape {
    /// Local transform of one of this shape's paths.
    pub fn path_transform(&self, path: &ShapePath) -> Transform {
        let size = path.size.unwrap_or(self.placement.extent);
        self.placement.transform_from(point(0.0, 0.0), size)
    }
}

/// Group-level properties come from its `group`-flagged member shapes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    pub placement: GroupPlacement,
    pub children: Vec<ShapeNode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeNode {
    Shape(Shape),
    Group(Group),
}

/// A single slide of the source document, composed into one layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSource {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    /// `id` of the feature that outlines this layer when it supplies details.
    #[serde(default)]
    pub outline: Option<String>,
    /// Slide size in source units.
    pub canvas: Size,
    pub shapes: Vec<ShapeNode>,
}
