//! Procedural geometry for the decorative scene content.
//!
//! All generators return an indexed [`MeshData`] with counter-clockwise front
//! faces (matching the pipelines' `FrontFace::Ccw`) and unit length normals.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::model::{MeshData, ModelVertex};

fn quad(mesh: &mut MeshData, center: Vector3<f32>, u: Vector3<f32>, v: Vector3<f32>, uv_repeat: f32) {
    let normal: [f32; 3] = u.cross(v).normalize().into();
    let base = mesh.vertices.len() as u32;
    let corners = [
        (center - u - v, [0.0, 1.0]),
        (center + u - v, [1.0, 1.0]),
        (center + u + v, [1.0, 0.0]),
        (center - u + v, [0.0, 0.0]),
    ];
    for (position, [s, t]) in corners {
        mesh.vertices.push(ModelVertex::new(
            position.into(),
            [s * uv_repeat, t * uv_repeat],
            normal,
        ));
    }
    mesh.indices
        .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Axis aligned box centred on the origin.
pub fn cuboid(width: f32, height: f32, depth: f32) -> MeshData {
    let (hx, hy, hz) = (width / 2.0, height / 2.0, depth / 2.0);
    let x = Vector3::unit_x();
    let y = Vector3::unit_y();
    let z = Vector3::unit_z();
    // (face normal, u, v) with u × v pointing along the normal
    let faces = [
        (x * hx, -z * hz, y * hy),
        (-x * hx, z * hz, y * hy),
        (y * hy, x * hx, -z * hz),
        (-y * hy, x * hx, z * hz),
        (z * hz, x * hx, y * hy),
        (-z * hz, -x * hx, y * hy),
    ];
    let mut mesh = MeshData::default();
    for (center, u, v) in faces {
        quad(&mut mesh, center, u, v, 1.0);
    }
    mesh
}

/// Horizontal plane facing +Y. `uv_repeat` tiles textures across the surface.
pub fn plane(width: f32, depth: f32, uv_repeat: f32) -> MeshData {
    let mut mesh = MeshData::default();
    quad(
        &mut mesh,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::unit_x() * (width / 2.0),
        -Vector3::unit_z() * (depth / 2.0),
        uv_repeat,
    );
    mesh
}

/// Vertical plane facing +Z, used for text and billboards.
pub fn upright_plane(width: f32, height: f32) -> MeshData {
    let mut mesh = MeshData::default();
    quad(
        &mut mesh,
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::unit_x() * (width / 2.0),
        Vector3::unit_y() * (height / 2.0),
        1.0,
    );
    mesh
}

/// UV sphere. `segments` around the vertical axis, `rings` from pole to pole.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = MeshData::default();
    for iy in 0..=rings {
        let v = iy as f32 / rings as f32;
        let theta = v * PI;
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let phi = u * TAU;
            let normal = Vector3::new(-phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
            mesh.vertices.push(ModelVertex::new(
                (normal * radius).into(),
                [u, v],
                normal.into(),
            ));
        }
    }
    let row = segments + 1;
    for iy in 0..rings {
        for ix in 0..segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != rings - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
    mesh
}

/**
 * Capped cylinder along the Y axis, centred on the origin.
 *
 * A `radius_top` of zero turns it into a cone; the degenerate top cap is skipped.
 */
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let half = height / 2.0;
    let slope = (radius_bottom - radius_top) / height;
    let mut mesh = MeshData::default();

    for iy in 0..=1u32 {
        let v = iy as f32;
        let radius = v * (radius_bottom - radius_top) + radius_top;
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let theta = u * TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = Vector3::new(sin, slope, cos).normalize();
            mesh.vertices.push(ModelVertex::new(
                [radius * sin, -v * height + half, radius * cos],
                [u, v],
                normal.into(),
            ));
        }
    }
    let row = segments + 1;
    for ix in 0..segments {
        let a = ix;
        let b = row + ix;
        let c = row + ix + 1;
        let d = ix + 1;
        mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    let mut cap = |radius: f32, y: f32, up: bool| {
        let normal = if up { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
        let center = mesh.vertices.len() as u32;
        mesh.vertices
            .push(ModelVertex::new([0.0, y, 0.0], [0.5, 0.5], normal));
        for ix in 0..=segments {
            let theta = ix as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            mesh.vertices.push(ModelVertex::new(
                [radius * sin, y, radius * cos],
                [0.5 + 0.5 * sin, 0.5 + 0.5 * cos],
                normal,
            ));
        }
        for ix in 0..segments {
            let current = center + 1 + ix;
            let next = current + 1;
            if up {
                mesh.indices.extend_from_slice(&[center, current, next]);
            } else {
                mesh.indices.extend_from_slice(&[center, next, current]);
            }
        }
    };
    if radius_top > 0.0 {
        cap(radius_top, half, true);
    }
    if radius_bottom > 0.0 {
        cap(radius_bottom, -half, false);
    }
    mesh
}

pub fn cone(radius: f32, height: f32, segments: u32) -> MeshData {
    cylinder(0.0, radius, height, segments)
}

/**
 * Section of a torus lying in the XY plane, starting on +X and sweeping `arc`
 * radians counter-clockwise. A half arc (`PI`) makes one rainbow band.
 */
pub fn torus_arc(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32, arc: f32) -> MeshData {
    let radial_segments = radial_segments.max(3);
    let tubular_segments = tubular_segments.max(1);
    let mut mesh = MeshData::default();
    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * arc;
            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vector3::new(radius * u.cos(), radius * u.sin(), 0.0);
            mesh.vertices.push(ModelVertex::new(
                position.into(),
                [
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ],
                (position - center).normalize().into(),
            ));
        }
    }
    let row = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

/// Flat shaded convex polyhedron. Face winding is fixed up to point outwards.
fn polyhedron(corners: &[[f32; 3]], faces: &[[usize; 3]], radius: f32) -> MeshData {
    let corners: Vec<Vector3<f32>> = corners
        .iter()
        .map(|&c| Vector3::from(c).normalize() * radius)
        .collect();
    let mut mesh = MeshData::default();
    for face in faces {
        let (mut p0, mut p1, p2) = (corners[face[0]], corners[face[1]], corners[face[2]]);
        let mut normal = (p1 - p0).cross(p2 - p0).normalize();
        if normal.dot(p0 + p1 + p2) < 0.0 {
            std::mem::swap(&mut p0, &mut p1);
            normal = -normal;
        }
        let base = mesh.vertices.len() as u32;
        for (p, uv) in [(p0, [0.0, 1.0]), (p1, [1.0, 1.0]), (p2, [0.5, 0.0])] {
            mesh.vertices.push(ModelVertex::new(p.into(), uv, normal.into()));
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    mesh
}

pub fn tetrahedron(radius: f32) -> MeshData {
    polyhedron(
        &[[1.0, 1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0]],
        &[[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]],
        radius,
    )
}

pub fn octahedron(radius: f32) -> MeshData {
    polyhedron(
        &[
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        &[
            [0, 2, 4],
            [0, 4, 3],
            [0, 3, 5],
            [0, 5, 2],
            [1, 2, 5],
            [1, 5, 3],
            [1, 3, 4],
            [1, 4, 2],
        ],
        radius,
    )
}

pub fn icosahedron(radius: f32) -> MeshData {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    polyhedron(
        &[
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ],
        &[
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ],
        radius,
    )
}
