//! Scene setup shared by the solver benchmarks.

use std::sync::Arc;

use glam::{Quat, Vec3};
use rein_solver::{
    Contact, ContactData, ContactSupplementData, DeactivationManager, DistanceJoint, NarrowPhase,
    ParallelLooper, PhysicsConfig, PhysicsWorld, RigidBody, RigidTransform, SimulationIsland,
    Solver, SolverConfig, SolverItem,
};

/// `n` candidates spread on a ring in the XZ plane with varying depth.
pub fn contact_ring(n: usize) -> Vec<ContactData> {
    (0..n)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / n as f32;
            let radius = 0.5 + 0.1 * (i % 3) as f32;
            ContactData::new(
                Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius),
                Vec3::Y,
                0.01 + 0.002 * (i % 5) as f32,
            )
        })
        .collect()
}

/// Four persistent contacts on a unit square.
pub fn square_contacts() -> [Contact; 4] {
    let corner = |x: f32, z: f32, depth: f32| {
        Contact::from(&ContactData::new(Vec3::new(x, 0.0, z), Vec3::Y, depth))
    };
    [
        corner(-0.5, -0.5, 0.03),
        corner(0.5, -0.5, 0.01),
        corner(0.5, 0.5, 0.01),
        corner(-0.5, 0.5, 0.01),
    ]
}

/// `n` contacts with supplement data and a slightly moved pair of transforms.
pub fn refresh_fixture(
    n: usize,
) -> (Vec<Contact>, Vec<ContactSupplementData>, RigidTransform, RigidTransform) {
    let candidates = contact_ring(n);
    let contacts = candidates.iter().map(Contact::from).collect();
    let supplement = candidates
        .iter()
        .map(|c| {
            ContactSupplementData::new(
                c.position,
                c.penetration_depth,
                &RigidTransform::IDENTITY,
                &RigidTransform::IDENTITY,
            )
        })
        .collect();
    let moved = RigidTransform::new(Vec3::new(0.0, 0.005, 0.0), Quat::from_rotation_y(0.01));
    (contacts, supplement, RigidTransform::IDENTITY, moved)
}

/// A chain of `n` bodies linked by distance joints, all in one island.
pub fn joint_chain(n: usize, looper: Arc<dyn ParallelLooper>) -> anyhow::Result<Solver> {
    let island = Arc::new(SimulationIsland::new());
    let mut solver = Solver::new(
        &SolverConfig::default(),
        looper,
        Arc::new(DeactivationManager::new()),
    );

    let bodies: Vec<_> = (0..=n)
        .map(|i| {
            let mut body = RigidBody::new_dynamic(1.0)
                .with_position(Vec3::new(i as f32 * 1.1, 0.0, 0.0))
                .with_island(island.clone());
            body.linear_velocity = Vec3::new(0.0, (i % 2) as f32, 0.0);
            body.into_shared()
        })
        .collect();

    for pair in bodies.windows(2) {
        let joint = DistanceJoint::new(pair[0].clone(), pair[1].clone(), Vec3::ZERO, Vec3::ZERO)
            .with_rest_length(1.0);
        solver.add(SolverItem::new(joint).into_shared())?;
    }
    Ok(solver)
}

/// Spheres of radius 0.5 against the plane y = 0.
pub struct SpheresOnPlane;

impl NarrowPhase for SpheresOnPlane {
    fn collide(&self, plane: &RigidBody, sphere: &RigidBody, out: &mut Vec<ContactData>) {
        let depth = 0.5 - (sphere.position.y - plane.position.y);
        if depth > -0.1 {
            let point = Vec3::new(sphere.position.x, plane.position.y, sphere.position.z);
            out.push(ContactData::new(point, Vec3::Y, depth).with_id(0));
        }
    }
}

/// `n` spheres resting just above a ground plane, one contact pair each.
pub fn sphere_scene(n: usize, thread_count: usize) -> anyhow::Result<PhysicsWorld> {
    let config = PhysicsConfig {
        solver: SolverConfig::default().thread_count(thread_count),
        ..PhysicsConfig::default()
    };
    let mut physics = PhysicsWorld::new(config)?;
    let ground = physics.add_body(RigidBody::new_static());

    let side = (n as f32).sqrt().ceil() as usize;
    for i in 0..n {
        let x = (i % side) as f32 * 1.5;
        let z = (i / side) as f32 * 1.5;
        let sphere =
            physics.add_body(RigidBody::new_dynamic(1.0).with_position(Vec3::new(x, 0.52, z)));
        physics.add_contact_pair(&ground, &sphere)?;
    }
    Ok(physics)
}
