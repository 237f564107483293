use glam::{Mat4, Vec3};

/// Orbit-style camera described by a position and two angles.
///
/// `theta` rotates around the world Y axis, `phi` pitches up and down. Both
/// are in degrees, as are `angle_of_view` (the vertical field of view).
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub theta: f32,
    pub phi: f32,
    pub angle_of_view: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub width: f32,
    pub height: f32,
}

/// Primary-ray basis handed to the ray tracer.
///
/// `right` and `up` are scaled by `tan(fov / 2)` so that normalized screen
/// coordinates in [-1, 1] span the same field of view as the projection matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayBasis {
    pub position: Vec3,
    pub direction: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            theta: 0.0,
            phi: 0.0,
            angle_of_view: 90.0,
            z_near: 0.001,
            z_far: 100.0,
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl Camera {
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// Unit view direction. `theta = phi = 0` looks down -Z.
    pub fn direction(&self) -> Vec3 {
        let theta = self.theta.to_radians();
        let phi = self.phi.to_radians();
        Vec3::new(
            theta.sin() * phi.cos(),
            phi.sin(),
            -theta.cos() * phi.cos(),
        )
    }

    /// Unit right vector, always horizontal.
    pub fn right(&self) -> Vec3 {
        let theta = self.theta.to_radians();
        Vec3::new(theta.cos(), 0.0, theta.sin())
    }

    /// Unit up vector, orthogonal to `right` and `direction`.
    pub fn up(&self) -> Vec3 {
        self.right().cross(self.direction())
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.direction(), self.up())
    }

    /// Get the projection matrix (camera → clip space), OpenGL depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.angle_of_view.to_radians(),
            self.aspect_ratio(),
            self.z_near,
            self.z_far,
        )
    }

    /// Get the combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn ray_basis(&self) -> RayBasis {
        let scale = (self.angle_of_view.to_radians() * 0.5).tan();
        RayBasis {
            position: self.position,
            direction: self.direction(),
            right: self.right() * scale,
            up: self.up() * scale,
        }
    }
}
