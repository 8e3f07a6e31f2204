use flatmap_core::{
    Error, LayerSource, MapOptions, MapSession, MapSpecification, Placement, Properties, Shape,
    ShapeNode, ShapePath,
};
use flatmap_geom::{PathCommand, point, size};
use serde_json::{Value, json};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn rect(properties: Value, x0: f64, y0: f64, x1: f64, y1: f64) -> ShapeNode {
    ShapeNode::Shape(Shape {
        properties: props(properties),
        placement: Placement::new(point(x0, y0), size(x1 - x0, y1 - y0)),
        paths: vec![ShapePath {
            size: Some(size(1.0, 1.0)),
            commands: vec![
                PathCommand::MoveTo { pt: point(0.0, 0.0) },
                PathCommand::LineTo { pt: point(1.0, 0.0) },
                PathCommand::LineTo { pt: point(1.0, 1.0) },
                PathCommand::LineTo { pt: point(0.0, 1.0) },
                PathCommand::Close,
            ],
        }],
    })
}

fn source(id: &str, shapes: Vec<ShapeNode>) -> LayerSource {
    LayerSource {
        id: id.to_string(),
        description: Some(format!("{id} slide")),
        hidden: false,
        outline: None,
        canvas: size(1000.0, 1000.0),
        shapes,
    }
}

fn base() -> LayerSource {
    source(
        "base",
        vec![
            rect(
                json!({ "id": "brain", "class": "organ", "details": "brain-hires", "maxzoom": 6 }),
                100.0,
                100.0,
                300.0,
                300.0,
            ),
            rect(json!({ "id": "heart", "class": "organ" }), 600.0, 600.0, 700.0, 700.0),
        ],
    )
}

fn brain_hires() -> LayerSource {
    LayerSource {
        hidden: true,
        outline: Some("outline".to_string()),
        ..source(
            "brain-hires",
            vec![
                rect(json!({ "id": "outline" }), 0.0, 0.0, 400.0, 400.0),
                rect(json!({ "id": "cortex" }), 100.0, 100.0, 200.0, 200.0),
            ],
        )
    }
}

fn session() -> MapSession {
    MapSession::new(MapSpecification::new("rat"), MapOptions::default()).unwrap()
}

#[test]
fn make_outputs_visible_layers_and_their_details() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    session.add_source(&brain_hires()).unwrap();
    assert_eq!(session.visible_layer_count(), 1);

    let output = session.make().unwrap();
    let ids: Vec<&str> = output.layers.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["base", "base-details"]);

    let details = session.layer("base-details").unwrap();
    assert_eq!(details.len(), 2);
    let cortex = details.feature_with_id("cortex").unwrap();
    assert_eq!(cortex.property("minzoom"), Some(&json!(7)));
    assert_eq!(cortex.property("layer"), Some(&json!("base")));

    // The outline copy covers the placeholder whichever way its corners were paired.
    let placeholder = session.layer("base").unwrap().feature_with_id("brain").unwrap();
    let want = placeholder.geometry.as_ref().unwrap().bounds().unwrap();
    let got = details
        .feature_with_id("outline")
        .and_then(|f| f.geometry.as_ref())
        .and_then(|g| g.bounds())
        .unwrap();
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-6, "{got:?} != {want:?}");
    }
}

#[test]
fn feature_ids_are_unique_across_layers() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    session.add_source(&brain_hires()).unwrap();
    let output = session.make().unwrap();
    let mut ids: Vec<u64> = output
        .layers
        .iter()
        .flat_map(|c| c.features.iter().map(|f| f.id))
        .collect();
    let count = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), count);
    assert_eq!(count, 4);
}

#[test]
fn indexes_cover_authored_ids_and_classes() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    let heart = session
        .layer("base")
        .unwrap()
        .feature_with_id("heart")
        .unwrap()
        .id;
    assert_eq!(session.index().feature_for_id("heart"), Some(heart));
    assert_eq!(session.index().features_for_class("organ").len(), 2);
    assert!(session.index().features_for_class("tissue").is_empty());
}

#[test]
fn first_source_sets_the_extent() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    let extent = *session.extent().unwrap();
    // A 1000 unit canvas at 0.1 m per unit is a 100 m square centred on the origin.
    assert!((extent.area - 10_000.0).abs() < 1e-6);
    let [west, south, east, north] = extent.bounds;
    assert!(west < 0.0 && east > 0.0 && south < 0.0 && north > 0.0);
    assert!((west + east).abs() < 1e-12 && (south + north).abs() < 1e-9);
    assert!(extent.centre[0].abs() < 1e-12 && extent.centre[1].abs() < 1e-9);

    let mut second = source("other", Vec::new());
    second.canvas = size(10.0, 10.0);
    session.add_source(&second).unwrap();
    assert_eq!(session.map_area(), Some(extent.area));
}

#[test]
fn annotations_are_keyed_by_layer_and_feature() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    let heart = session
        .layer("base")
        .unwrap()
        .feature_with_id("heart")
        .unwrap()
        .id;
    let output = session.make().unwrap();
    let annotation = &output.annotations[&format!("base-{heart}")];
    assert_eq!(annotation.get("geometry"), Some(&json!("Polygon")));
    assert_eq!(annotation.get("class"), Some(&json!("organ")));
}

#[test]
fn duplicate_layers_are_rejected() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    assert!(matches!(
        session.add_source(&base()),
        Err(Error::DuplicateLayerId { ref layer_id }) if layer_id == "base"
    ));
}

#[test]
fn duplicate_authored_ids_in_a_layer_are_rejected() {
    let mut session = session();
    let slide = source(
        "base",
        vec![
            rect(json!({ "id": "heart" }), 0.0, 0.0, 10.0, 10.0),
            rect(json!({ "id": "heart" }), 20.0, 20.0, 30.0, 30.0),
        ],
    );
    assert!(matches!(
        session.add_source(&slide),
        Err(Error::DuplicateFeatureId { .. })
    ));
}

#[test]
fn hidden_only_maps_have_nothing_to_make() {
    let mut session = session();
    session.add_source(&brain_hires()).unwrap();
    assert!(matches!(session.make(), Err(Error::NoVisibleLayers)));
}

#[test]
fn placeholder_without_hires_layer_aborts_the_build() {
    let mut session = session();
    session.add_source(&base()).unwrap();
    assert!(matches!(
        session.make(),
        Err(Error::LayerNotFound { ref layer_id }) if layer_id == "brain-hires"
    ));
}

#[test]
fn sessions_need_an_id_and_valid_zooms() {
    assert!(matches!(
        MapSession::new(MapSpecification::default(), MapOptions::default()),
        Err(Error::MissingMapId)
    ));
    let options = MapOptions {
        max_zoom: 16,
        ..MapOptions::default()
    };
    assert!(matches!(
        MapSession::new(MapSpecification::new("rat"), options),
        Err(Error::InvalidZoom { .. })
    ));
}

#[test]
fn output_serializes_as_json() {
    let mut session = session();
    session.add_source(&source(
        "base",
        vec![rect(json!({ "id": "heart" }), 0.0, 0.0, 10.0, 10.0)],
    ))
    .unwrap();
    let value = serde_json::to_value(session.make().unwrap()).unwrap();
    assert_eq!(value["id"], json!("rat"));
    assert_eq!(value["layers"][0]["type"], json!("FeatureCollection"));
    assert_eq!(value["layers"][0]["properties"]["description"], json!("base slide"));
    assert_eq!(value["layers"][0]["features"][0]["geometry"]["type"], json!("Polygon"));
    assert!(value.get("models").is_none());
}
