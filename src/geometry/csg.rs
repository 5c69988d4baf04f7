// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CSG (Constructive Solid Geometry) operations using BSP trees
//!
//! Inputs must be closed meshes with outward-facing winding.

use super::{Mesh, Vertex};
use anyhow::Result;
use nalgebra::{Point3, Vector3};

/// Tolerance for classifying points against a plane
const EPSILON: f64 = 1e-5;

const COPLANAR: u8 = 0;
const FRONT: u8 = 1;
const BACK: u8 = 2;
const SPANNING: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

#[derive(Clone)]
struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a)).try_normalize(1e-12)?;
        Some(Self {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    fn distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }

    /// Sort `polygon` into the four buckets, splitting it if it spans the plane
    fn split_polygon(
        &self,
        polygon: &Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        let types: Vec<u8> = polygon
            .vertices
            .iter()
            .map(|v| {
                let t = self.distance(v);
                if t < -EPSILON {
                    BACK
                } else if t > EPSILON {
                    FRONT
                } else {
                    COPLANAR
                }
            })
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let count = polygon.vertices.len();
                let mut f = Vec::with_capacity(count + 1);
                let mut b = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);

                    if ti != BACK {
                        f.push(vi);
                    }
                    if ti != FRONT {
                        b.push(vi);
                    }
                    if ti | tj == SPANNING {
                        let t = (self.w - self.normal.dot(&vi.coords))
                            / self.normal.dot(&(vj - vi));
                        let v = vi + (vj - vi) * t;
                        f.push(v);
                        b.push(v);
                    }
                }

                if f.len() >= 3 {
                    front.push(Polygon::with_plane(f, polygon.plane.clone()));
                }
                if b.len() >= 3 {
                    back.push(Polygon::with_plane(b, polygon.plane.clone()));
                }
            }
        }
    }
}

/// Convex planar polygon
#[derive(Clone)]
struct Polygon {
    vertices: Vec<Point3<f64>>,
    plane: Plane,
}

impl Polygon {
    fn new(vertices: Vec<Point3<f64>>) -> Option<Self> {
        let plane = Plane::from_points(&vertices[0], &vertices[1], &vertices[2])?;
        Some(Self { vertices, plane })
    }

    fn with_plane(vertices: Vec<Point3<f64>>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }
}

/// BSP tree node for CSG operations
#[derive(Clone, Default)]
struct BSPNode {
    plane: Option<Plane>,
    front: Option<Box<BSPNode>>,
    back: Option<Box<BSPNode>>,
    polygons: Vec<Polygon>,
}

impl BSPNode {
    fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Insert polygons, splitting them by the existing planes
    fn build(&mut self, polygons: Vec<Polygon>) {
        if polygons.is_empty() {
            return;
        }
        let plane = self
            .plane
            .get_or_insert_with(|| polygons[0].plane.clone())
            .clone();

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        for polygon in &polygons {
            plane.split_polygon(
                polygon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
        }
        self.polygons.append(&mut coplanar_front);
        self.polygons.append(&mut coplanar_back);

        if !front.is_empty() {
            self.front.get_or_insert_with(Default::default).build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Default::default).build(back);
        }
    }

    /// Convert solid space to empty space and vice versa
    fn invert(&mut self) {
        for polygon in &mut self.polygons {
            polygon.flip();
        }
        if let Some(plane) = &mut self.plane {
            plane.flip();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Remove the parts of `polygons` that lie inside this tree's solid
    fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = &self.plane else {
            return polygons;
        };

        let mut front = Vec::new();
        let mut back = Vec::new();
        for polygon in &polygons {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            plane.split_polygon(
                polygon,
                &mut coplanar_front,
                &mut coplanar_back,
                &mut front,
                &mut back,
            );
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);
        }

        let mut front = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        let back = match &self.back {
            Some(node) => node.clip_polygons(back),
            None => Vec::new(),
        };
        front.extend(back);
        front
    }

    /// Remove every polygon of this tree that lies inside `other`
    fn clip_to(&mut self, other: &BSPNode) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = self.polygons.clone();
        if let Some(front) = &self.front {
            result.extend(front.all_polygons());
        }
        if let Some(back) = &self.back {
            result.extend(back.all_polygons());
        }
        result
    }
}

/// Convert mesh triangles to polygons, dropping degenerate ones
fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    mesh.triangle_positions()
        .filter_map(|corners| Polygon::new(corners.to_vec()))
        .collect()
}

/// Fan-triangulate convex polygons back into a mesh
fn polygons_to_mesh(polygons: &[Polygon]) -> Mesh {
    let mut mesh = Mesh::new();

    for polygon in polygons {
        let normal = polygon.plane.normal;
        let indices: Vec<usize> = polygon
            .vertices
            .iter()
            .map(|p| mesh.add_vertex(Vertex::new(*p, normal)))
            .collect();
        for k in 1..indices.len().saturating_sub(1) {
            mesh.add_face([indices[0], indices[k], indices[k + 1]]);
        }
    }

    mesh
}

/// Perform a boolean operation between two closed meshes
pub fn perform_boolean_operation(mesh_a: &Mesh, mesh_b: &Mesh, op: BooleanOp) -> Result<Mesh> {
    match op {
        BooleanOp::Union => csg_union(mesh_a, mesh_b),
        BooleanOp::Difference => csg_difference(mesh_a, mesh_b),
        BooleanOp::Intersection => csg_intersection(mesh_a, mesh_b),
    }
}

/// A ∪ B
pub fn csg_union(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());

    Ok(polygons_to_mesh(&tree_a.all_polygons()))
}

/// A − B
pub fn csg_difference(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    Ok(polygons_to_mesh(&tree_a.all_polygons()))
}

/// A ∩ B
pub fn csg_intersection(a: &Mesh, b: &Mesh) -> Result<Mesh> {
    let mut tree_a = BSPNode::new(mesh_to_polygons(a));
    let mut tree_b = BSPNode::new(mesh_to_polygons(b));

    tree_a.invert();
    tree_b.clip_to(&tree_a);
    tree_b.invert();
    tree_a.clip_to(&tree_b);
    tree_b.clip_to(&tree_a);
    tree_a.build(tree_b.all_polygons());
    tree_a.invert();

    Ok(polygons_to_mesh(&tree_a.all_polygons()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use approx::assert_relative_eq;

    fn cube(min: [f64; 3], max: [f64; 3]) -> Mesh {
        Primitive::cuboid(Point3::from(min), Point3::from(max))
            .to_mesh()
            .unwrap()
    }

    #[test]
    fn test_union_of_disjoint_cubes() {
        let a = cube([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let b = cube([20.0, 0.0, 0.0], [30.0, 10.0, 10.0]);
        let result = csg_union(&a, &b).unwrap();
        assert_relative_eq!(result.volume(), 2000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_union_of_overlapping_cubes() {
        let a = cube([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let b = cube([5.0, 0.0, 0.0], [15.0, 10.0, 10.0]);
        let result = csg_union(&a, &b).unwrap();
        assert_relative_eq!(result.volume(), 1500.0, epsilon = 1e-6);
        let bbox = result.bounding_box();
        assert_relative_eq!(bbox.max.x, 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_difference_carves_pocket() {
        let outer = cube([0.0, 0.0, 0.0], [20.0, 20.0, 20.0]);
        let inner = cube([5.0, 5.0, 5.0], [15.0, 15.0, 25.0]);
        let result = csg_difference(&outer, &inner).unwrap();
        assert_relative_eq!(result.volume(), 8000.0 - 10.0 * 10.0 * 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_intersection_keeps_overlap() {
        let a = cube([0.0, 0.0, 0.0], [10.0, 10.0, 10.0]);
        let b = cube([5.0, 5.0, 5.0], [15.0, 15.0, 15.0]);
        let result = perform_boolean_operation(&a, &b, BooleanOp::Intersection).unwrap();
        assert_relative_eq!(result.volume(), 125.0, epsilon = 1e-6);
    }

    #[test]
    fn test_intersection_of_disjoint_is_empty() {
        let a = cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = cube([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]);
        let result = csg_intersection(&a, &b).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_box_sphere_intersection() {
        let block = cube([-10.0, -10.0, -10.0], [10.0, 10.0, 10.0]);
        let ball = Primitive::sphere(Point3::origin(), 15.0, 16).to_mesh().unwrap();
        let result = csg_intersection(&block, &ball).unwrap();

        assert!(!result.is_empty());
        // Smaller than both operands, larger than the ball inscribed in the box
        assert!(result.volume() < block.volume());
        assert!(result.volume() < ball.volume());
        assert!(result.volume() > 4.0 / 3.0 * std::f64::consts::PI * 1000.0);
    }
}
