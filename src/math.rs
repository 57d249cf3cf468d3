use glam::Vec2;

/// Walk `local.x` units along `angle_deg` from `origin`, turn left 90
/// degrees, then walk `local.y` units. Angle 0 points along +x; positive
/// angles rotate toward -y, matching the chart coordinate convention.
///
/// This is the single composition primitive shared by the judge-line
/// resolver and note positioning.
#[inline(always)]
pub fn move_and_rotate(origin: Vec2, angle_deg: f32, local: Vec2) -> Vec2 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Vec2::new(
        origin.x + local.x * cos + local.y * sin,
        origin.y - local.x * sin + local.y * cos,
    )
}
