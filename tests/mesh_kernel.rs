// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! The sample tree built end to end with the mesh kernel

use approx::assert_relative_eq;
use polyframe_csg::geometry::{mesh_executor, Mesh};
use polyframe_csg::tree::{sample_tree, sample_tree_value};
use polyframe_csg::{BuildConfig, ConstructionTree};
use serde_json::json;

fn config() -> BuildConfig {
    BuildConfig {
        validate_results: true,
        segments: 16,
        ..BuildConfig::default()
    }
}

fn build(value: serde_json::Value) -> Mesh {
    let executor = mesh_executor(&config()).unwrap();
    let tree = ConstructionTree::from_value(value).unwrap();
    executor.execute(&tree).unwrap().as_ref().clone()
}

#[test]
fn test_sample_tree_builds_mesh() {
    let executor = mesh_executor(&config()).unwrap();
    let output = executor.execute_with_stats(&sample_tree()).unwrap();

    let mesh = &output.shape;
    println!(
        "sample: {} triangles, {} vertices, volume {:.3}",
        mesh.triangle_count(),
        mesh.vertex_count(),
        mesh.volume()
    );
    assert!(mesh.triangle_count() > 0);

    // Everything stays inside the box
    let bbox = mesh.bounding_box();
    for axis in 0..3 {
        assert!(bbox.min[axis] >= -10.0 - 1e-6);
        assert!(bbox.max[axis] <= 10.0 + 1e-6);
    }

    assert_eq!(output.stats.invocations_of("makeCylinder"), 3);
    assert_eq!(output.stats.invocations_of("fuse"), 2);
    assert_eq!(output.stats.evaluated_nodes, 9);
}

#[test]
fn test_cut_removes_material() {
    let mut blob_only = sample_tree_value();
    blob_only["root"] = json!("blob");

    let blob = build(blob_only);
    let thiny = build(sample_tree_value());

    assert!(thiny.volume() > 0.0);
    assert!(thiny.volume() < blob.volume());
    // Box corners are outside the sphere, so the blob is smaller than the box
    assert!(blob.volume() < 8000.0);
}

#[test]
fn test_fuse_of_overlapping_boxes() {
    let mesh = build(json!({
        "a": { "type": "makeBox", "parameters": [[0, 0, 0], [10, 10, 10]] },
        "b": { "type": "makeBox", "parameters": [[5, 5, 0], [15, 15, 10]] },
        "u": { "type": "fuse",    "parameters": ["a", "b"] },
        "root": "u"
    }));
    assert_relative_eq!(mesh.volume(), 1750.0, epsilon = 1e-6);
}

#[test]
fn test_cone_and_translate() {
    let mesh = build(json!({
        "cone": { "type": "makeCone",  "parameters": [[0, 0, 0], [0, 0, 10], 4, 0] },
        "up":   { "type": "translate", "parameters": ["cone", [0, 0, 5]] },
        "root": "up"
    }));
    let bbox = mesh.bounding_box();
    assert_relative_eq!(bbox.min.z, 5.0, epsilon = 1e-9);
    assert_relative_eq!(bbox.max.z, 15.0, epsilon = 1e-9);
}
