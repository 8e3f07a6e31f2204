use flatmap_core::layer::Layer;
use flatmap_core::session::FeatureIdCounter;
use flatmap_core::{Feature, FeatureComposer, Group, GroupPlacement, Placement, Properties};
use flatmap_core::{Shape, ShapeNode, ShapePath};
use flatmap_geom::{Geometry, PathCommand, Transform, point, size};
use serde_json::{Value, json};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

/// A shape whose path coordinates are used as they are.
fn shape(properties: Value, commands: Vec<PathCommand>) -> ShapeNode {
    ShapeNode::Shape(Shape {
        properties: props(properties),
        placement: Placement::new(point(0.0, 0.0), size(1.0, 1.0)),
        paths: vec![ShapePath {
            size: Some(size(1.0, 1.0)),
            commands,
        }],
    })
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PathCommand> {
    vec![
        PathCommand::MoveTo { pt: point(x0, y0) },
        PathCommand::LineTo { pt: point(x1, y0) },
        PathCommand::LineTo { pt: point(x1, y1) },
        PathCommand::LineTo { pt: point(x0, y1) },
        PathCommand::Close,
    ]
}

fn segment(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<PathCommand> {
    vec![
        PathCommand::MoveTo { pt: point(x0, y0) },
        PathCommand::LineTo { pt: point(x1, y1) },
    ]
}

fn group(children: Vec<ShapeNode>) -> ShapeNode {
    ShapeNode::Group(Group {
        placement: GroupPlacement::identity(point(0.0, 0.0), size(20.0, 20.0)),
        children,
    })
}

fn compose(layer: &mut Layer, shapes: &[ShapeNode]) -> Vec<Feature> {
    let mut ids = FeatureIdCounter::default();
    let mut composer = FeatureComposer::new(layer, &mut ids, 100);
    composer.compose(shapes, &Transform::identity()).unwrap();
    composer.into_group_markers()
}

fn with_id<'a>(layer: &'a Layer, id: &str) -> &'a Feature {
    layer
        .features()
        .iter()
        .find(|f| f.feature_id() == Some(id))
        .unwrap_or_else(|| panic!("no feature with id {id}"))
}

fn divided_square(markers: Vec<ShapeNode>) -> Vec<ShapeNode> {
    let mut children = vec![
        shape(
            json!({ "annotation": ".boundary", "boundary": true, "id": "area" }),
            rect(0.0, 0.0, 20.0, 20.0),
        ),
        shape(json!({}), segment(0.0, 10.0, 10.0, 10.0)),
        shape(json!({}), segment(10.0, 10.0, 20.0, 10.0)),
    ];
    children.extend(markers);
    vec![group(children)]
}

#[test]
fn boundary_is_split_into_marked_regions() {
    let mut layer = Layer::new("body");
    compose(
        &mut layer,
        &divided_square(vec![
            shape(
                json!({ "annotation": ".region", "region": true, "id": "lower", "name": "L" }),
                rect(4.0, 4.0, 6.0, 6.0),
            ),
            shape(
                json!({ "annotation": ".region", "region": true, "id": "upper" }),
                rect(4.0, 14.0, 6.0, 16.0),
            ),
        ]),
    );

    let lower = with_id(&layer, "lower");
    let upper = with_id(&layer, "upper");
    for region in [lower, upper] {
        let geometry = region.geometry.as_ref().unwrap();
        assert_eq!(geometry.geometry_type(), "Polygon");
        assert!((geometry.area() - 200.0).abs() < 1e-9);
        assert_eq!(region.property("layer"), Some(&json!("body")));
        assert!(!region.has_property("region"));
    }
    assert_eq!(lower.property("name"), Some(&json!("L")));
    let centre = lower.geometry.as_ref().unwrap().centroid().unwrap();
    assert!(centre.y < 10.0);

    // The boundary passes through, and its ring is drawn as a separate line.
    let area = with_id(&layer, "area");
    assert_eq!(area.geometry.as_ref().unwrap().geometry_type(), "Polygon");
    assert!(!area.has_property("boundary"));
    assert!(layer.features().iter().any(|f| f.id == 10000
        && f.geometry.as_ref().map(Geometry::geometry_type) == Some("LineString")));
}

#[test]
fn region_areas_add_up_to_the_divided_area() {
    let mut layer = Layer::new("body");
    compose(&mut layer, &divided_square(Vec::new()));
    let total: f64 = layer
        .features()
        .iter()
        .filter(|f| f.id > 10000)
        .filter_map(|f| f.geometry.as_ref())
        .map(Geometry::area)
        .sum();
    assert!((total - 400.0).abs() < 0.4);
    // Two unmarked regions after the boundary ring.
    let ids: Vec<u64> = layer
        .features()
        .iter()
        .map(|f| f.id)
        .filter(|&id| id > 10000)
        .collect();
    assert_eq!(ids, vec![10001, 10002]);
}

#[test]
fn invisible_boundary_ring_is_not_drawn() {
    let mut layer = Layer::new("body");
    compose(
        &mut layer,
        &[group(
            vec![
                shape(
                    json!({ "annotation": ".boundary", "boundary": true, "invisible": true }),
                    rect(0.0, 0.0, 20.0, 20.0),
                ),
                shape(json!({}), segment(10.0, 0.0, 10.0, 20.0)),
            ],
        )],
    );
    let lines = layer
        .features()
        .iter()
        .filter(|f| f.geometry.as_ref().map(Geometry::geometry_type) == Some("LineString"))
        .count();
    assert_eq!(lines, 1);
    let regions = layer.features().iter().filter(|f| f.id >= 10000).count();
    assert_eq!(regions, 2);
}

#[test]
fn children_properties_are_inherited_and_overridden() {
    let mut layer = Layer::new("body");
    compose(
        &mut layer,
        &[group(
            vec![
                shape(
                    json!({ "annotation": ".children", "children": true, "colour": "red", "models": "UBERON:1" }),
                    rect(0.0, 0.0, 1.0, 1.0),
                ),
                shape(json!({ "id": "a" }), rect(2.0, 2.0, 3.0, 3.0)),
                shape(json!({ "id": "b", "colour": "blue" }), rect(4.0, 4.0, 5.0, 5.0)),
            ],
        )],
    );
    assert_eq!(layer.len(), 2);
    let a = with_id(&layer, "a");
    let b = with_id(&layer, "b");
    assert_eq!(a.property("colour"), Some(&json!("red")));
    assert_eq!(a.property("models"), Some(&json!("UBERON:1")));
    assert_eq!(b.property("colour"), Some(&json!("blue")));
    for feature in layer.features() {
        assert!(!feature.has_property("children"));
        assert_eq!(feature.property("layer"), Some(&json!("body")));
    }
}

#[test]
fn group_shapes_become_markers_not_features() {
    let mut layer = Layer::new("body");
    let markers = compose(
        &mut layer,
        &[group(
            vec![
                shape(
                    json!({ "annotation": ".group", "group": true, "id": "heart", "class": "organ" }),
                    rect(0.0, 0.0, 20.0, 20.0),
                ),
                shape(json!({ "id": "atrium" }), rect(1.0, 1.0, 2.0, 2.0)),
            ],
        )],
    );
    assert_eq!(layer.len(), 1);
    assert_eq!(markers.len(), 1);
    let marker = &markers[0];
    assert!(marker.is_group);
    assert!(marker.geometry.is_none());
    assert_eq!(marker.feature_id(), Some("heart"));
    assert_eq!(marker.class(), Some("organ"));
}

#[test]
fn nested_groups_place_shapes_through_every_level() {
    let inner = ShapeNode::Group(Group {
        // Children laid out in 0..10 fill a 20 unit box at the origin.
        placement: GroupPlacement {
            placement: Placement::new(point(0.0, 0.0), size(20.0, 20.0)),
            child_offset: point(0.0, 0.0),
            child_extent: size(10.0, 10.0),
        },
        children: vec![shape(json!({ "id": "cell" }), rect(0.0, 0.0, 10.0, 10.0))],
    });
    let mut layer = Layer::new("body");
    let mut ids = FeatureIdCounter::default();
    let mut composer = FeatureComposer::new(&mut layer, &mut ids, 100);
    composer
        .compose(&[group(vec![inner])], &Transform::scale(0.1, 0.1))
        .unwrap();
    let cell = with_id(&layer, "cell");
    let bounds = cell.geometry.as_ref().unwrap().bounds().unwrap();
    assert!((bounds[2] - bounds[0] - 2.0).abs() < 1e-9);
}

#[test]
fn shapes_with_errors_or_no_geometry_are_dropped() {
    let mut layer = Layer::new("body");
    compose(
        &mut layer,
        &[
            shape(json!({ "error": "unknown term" }), rect(0.0, 0.0, 1.0, 1.0)),
            shape(json!({ "id": "empty" }), vec![PathCommand::Close]),
            shape(json!({ "id": "kept" }), rect(0.0, 0.0, 1.0, 1.0)),
        ],
    );
    assert_eq!(layer.len(), 1);
    assert_eq!(layer.features()[0].feature_id(), Some("kept"));
}

#[test]
fn children_id_is_inherited_without_clashing() {
    let mut layer = Layer::new("body");
    compose(
        &mut layer,
        &[group(vec![
            shape(
                json!({ "annotation": ".children", "children": true, "id": "kids" }),
                rect(0.0, 0.0, 1.0, 1.0),
            ),
            shape(json!({}), rect(2.0, 2.0, 3.0, 3.0)),
            shape(json!({ "label": "x" }), rect(4.0, 4.0, 5.0, 5.0)),
            shape(json!({ "id": "own" }), rect(6.0, 6.0, 7.0, 7.0)),
        ])],
    );
    assert_eq!(layer.len(), 3);
    let inheritors: Vec<u64> = layer
        .features()
        .iter()
        .filter(|f| f.feature_id() == Some("kids"))
        .map(|f| f.id)
        .collect();
    assert_eq!(inheritors.len(), 2);
    assert_eq!(layer.feature_with_id("kids").map(|f| f.id), Some(inheritors[0]));
    assert!(layer.feature_with_id("own").is_some());
}

#[test]
fn children_shape_in_a_divided_group_is_emitted() {
    let mut layer = Layer::new("body");
    compose(
        &mut layer,
        &[group(vec![
            shape(
                json!({ "annotation": ".boundary", "boundary": true, "id": "area" }),
                rect(0.0, 0.0, 20.0, 20.0),
            ),
            shape(
                json!({ "annotation": ".children", "children": true, "id": "kids", "colour": "red" }),
                rect(1.0, 1.0, 2.0, 2.0),
            ),
            shape(json!({}), segment(10.0, 0.0, 10.0, 20.0)),
        ])],
    );

    let kids = layer
        .features()
        .iter()
        .find(|f| {
            f.id < 10000 && f.geometry.as_ref().is_some_and(|g| (g.area() - 1.0).abs() < 1e-9)
        })
        .expect("children shape is kept");
    assert_eq!(kids.feature_id(), Some("kids"));
    assert!(!kids.has_property("children"));

    // Both regions inherit the children properties, id included.
    let regions: Vec<&Feature> = layer.features().iter().filter(|f| f.id > 10000).collect();
    assert_eq!(regions.len(), 2);
    for region in regions {
        assert_eq!(region.property("colour"), Some(&json!("red")));
        assert_eq!(region.feature_id(), Some("kids"));
    }
    assert!(layer.feature_with_id("area").is_some());
}
