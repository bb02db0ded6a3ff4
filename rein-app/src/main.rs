use std::sync::Arc;

use glam::{Quat, Vec3};
use rein_solver::{
    ContactData, MotorSettings, NarrowPhase, PhysicsConfig, PhysicsWorld, RigidBody,
    SingleEntityAngularMotor, SolverItem,
};

/// Spheres against the horizontal plane through the first body of each pair.
struct SphereOnPlane {
    radius: f32,
}

impl NarrowPhase for SphereOnPlane {
    fn collide(&self, plane: &RigidBody, sphere: &RigidBody, out: &mut Vec<ContactData>) {
        let depth = self.radius - (sphere.position.y - plane.position.y);
        if depth > -0.1 {
            let point = Vec3::new(sphere.position.x, plane.position.y, sphere.position.z);
            out.push(ContactData::new(point, Vec3::Y, depth).with_id(0));
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut physics = PhysicsWorld::new(PhysicsConfig::default())?;
    let ground = physics.add_body(RigidBody::new_static());

    let mut ball = RigidBody::new_dynamic(1.0).with_position(Vec3::new(0.0, 3.0, 0.0));
    ball.restitution = 0.5;
    let ball = physics.add_body(ball);
    physics.add_contact_pair(&ground, &ball)?;

    // Servo that turns the ball a quarter turn about Y while it drops.
    let mut servo = SingleEntityAngularMotor::new(ball.clone(), MotorSettings::servo());
    servo.goal_orientation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    physics.add_constraint(Arc::new(SolverItem::new(servo)))?;

    let narrow_phase = SphereOnPlane { radius: 0.5 };
    for frame in 0..240 {
        physics.step(1.0 / 60.0, &narrow_phase)?;
        if frame % 30 == 0 {
            let rb = ball.lock();
            log::info!(
                "t = {:.2}s  y = {:.3}  vy = {:.3}  yaw = {:.3}",
                (frame + 1) as f32 / 60.0,
                rb.position.y,
                rb.linear_velocity.y,
                rb.orientation.to_euler(glam::EulerRot::YXZ).0
            );
        }
    }

    let rb = ball.lock();
    log::info!("ball settled at y = {:.3}", rb.position.y);
    Ok(())
}
