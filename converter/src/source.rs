//! Injection source model.
//!
//! The light injector is mounted on the detector wall and always points
//! perpendicular to the wall it sits on. This is a fixed convention of the
//! injection system, not derived geometry: a vertex within 90% of the
//! half-length of the axis is a barrel injector firing toward the detector
//! axis; anything further out sits on an endcap and fires along z.

use nalgebra::Vector3;

/// Fraction of the half-length beyond which a vertex counts as endcap-mounted.
pub const ENDCAP_FRACTION: f64 = 0.9;

/// Wall the injector is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMount {
    Barrel,
    TopCap,
    BottomCap,
}

/// Injection source position, direction and local frame.
///
/// `local_x` and `local_y` span the plane perpendicular to `direction`;
/// the frame is right-handed (`local_x × local_y = direction`) so that the
/// azimuth convention matches the photon direction convention on both
/// endcaps.
#[derive(Debug, Clone)]
pub struct Source {
    pub position: Vector3<f64>,
    pub direction: Vector3<f64>,
    pub local_x: Vector3<f64>,
    pub local_y: Vector3<f64>,
    pub mount: SourceMount,
}

impl Source {
    /// Derive the source from an event vertex.
    ///
    /// Barrel: direction is the negative radial unit vector in the x-y
    /// plane, `local_x` the global z-axis and `local_y` the direction
    /// rotated 90° about z. Endcap: direction is ∓ẑ depending on which cap
    /// the vertex is nearer, `local_x` is x̂ and `local_y` is ∓ŷ.
    pub fn from_vertex(vertex: Vector3<f64>, half_length: f64) -> Source {
        let endcap_z = half_length * ENDCAP_FRACTION;

        if vertex.z.abs() < endcap_z {
            let rho = (vertex.x * vertex.x + vertex.y * vertex.y).sqrt();
            Source {
                position: vertex,
                direction: Vector3::new(-vertex.x / rho, -vertex.y / rho, 0.0),
                local_x: Vector3::z(),
                local_y: Vector3::new(-vertex.y / rho, vertex.x / rho, 0.0),
                mount: SourceMount::Barrel,
            }
        } else if vertex.z > endcap_z {
            Source {
                position: vertex,
                direction: -Vector3::z(),
                local_x: Vector3::x(),
                local_y: -Vector3::y(),
                mount: SourceMount::TopCap,
            }
        } else {
            Source {
                position: vertex,
                direction: Vector3::z(),
                local_x: Vector3::x(),
                local_y: Vector3::y(),
                mount: SourceMount::BottomCap,
            }
        }
    }
}
