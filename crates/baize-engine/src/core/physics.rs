use glam::Vec2;
use rapier2d::prelude::*;
use std::sync::{Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam to nalgebra and back
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Identity stored in a body's `user_data`, so contacts can be mapped back
/// to balls and cushions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyTag {
    Ball(u8),
    Rail(usize),
}

const TAG_BALL: u128 = 1 << 64;
const TAG_RAIL: u128 = 2 << 64;
const TAG_MASK: u128 = 0xff << 64;

impl BodyTag {
    fn to_user_data(self) -> u128 {
        match self {
            BodyTag::Ball(n) => TAG_BALL | n as u128,
            BodyTag::Rail(i) => TAG_RAIL | i as u128,
        }
    }

    fn from_user_data(data: u128) -> Option<Self> {
        let low = (data & u64::MAX as u128) as u64;
        match data & TAG_MASK {
            TAG_BALL => u8::try_from(low).ok().map(BodyTag::Ball),
            TAG_RAIL => usize::try_from(low).ok().map(BodyTag::Rail),
            _ => None,
        }
    }
}

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Shape description for a collider.
#[derive(Debug, Clone)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    /// Open chain of segments, in body-local coordinates.
    Polyline { points: Vec<Vec2> },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(*radius),
            ColliderDesc::Polyline { points } => {
                let vertices = points
                    .iter()
                    .map(|p| nalgebra::Point2::new(p.x, p.y))
                    .collect();
                ColliderBuilder::polyline(vertices, None)
            }
        }
    }
}

/// Physical material properties for a collider.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    /// How this collider's restitution combines with the other collider's.
    pub restitution_combine: CoefficientCombineRule,
    pub friction_combine: CoefficientCombineRule,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
            restitution_combine: CoefficientCombineRule::Average,
            friction_combine: CoefficientCombineRule::Average,
        }
    }
}

impl ColliderMaterial {
    /// Material whose own coefficients win against any `Average` partner.
    /// Restitution takes the minimum and friction the maximum of the pair.
    pub fn dominant(restitution: f32, friction: f32) -> Self {
        Self {
            restitution,
            friction,
            density: 1.0,
            restitution_combine: CoefficientCombineRule::Min,
            friction_combine: CoefficientCombineRule::Max,
        }
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub ccd: bool,
    pub collider: ColliderDesc,
}

impl BodyDesc {
    /// Create a dynamic body description with the given collider shape.
    pub fn dynamic(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            ccd: false,
            collider,
        }
    }

    /// Create a fixed (static) body description with the given collider shape.
    pub fn fixed(collider: ColliderDesc) -> Self {
        Self {
            body_type: BodyType::Fixed,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            ccd: false,
            collider,
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_angular_velocity(mut self, angvel: f32) -> Self {
        self.angular_velocity = angvel;
        self
    }

    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }
}

/// Handle pair referencing Rapier internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
    pub collider_handle: ColliderHandle,
}

/// A contact that started during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyTag,
    pub b: BodyTag,
    /// Closing speed along the line of contact, measured before the solver
    /// resolves the impact.
    pub speed: f32,
}

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    contacts: Mutex<Vec<Contact>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            contacts: Mutex::new(Vec::new()),
        }
    }

    fn drain_contacts(&self) -> Vec<Contact> {
        let mut guard = self.contacts.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

fn collider_tag(bodies: &RigidBodySet, colliders: &ColliderSet, handle: ColliderHandle) -> Option<(BodyTag, Vec2, Vec2)> {
    let collider = colliders.get(handle)?;
    let body = bodies.get(collider.parent()?)?;
    let tag = BodyTag::from_user_data(body.user_data)?;
    Some((tag, na_to_vec2(body.translation()), na_to_vec2(body.linvel())))
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let CollisionEvent::Started(h1, h2, _) = event else {
            return;
        };
        let (Some((a, pa, va)), Some((b, pb, vb))) = (
            collider_tag(bodies, colliders, h1),
            collider_tag(bodies, colliders, h2),
        ) else {
            return;
        };
        let speed = match (a, b) {
            (BodyTag::Ball(_), BodyTag::Ball(_)) => {
                let normal = (pb - pa).normalize_or_zero();
                (va - vb).dot(normal).max(0.0)
            }
            // Rails are fixed, so the ball's own speed is the impact speed.
            _ => (va - vb).length(),
        };
        self.contacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Contact { a, b, speed });
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct. The table is seen
/// from above, so the world has no gravity; cloth friction is applied by
/// the integrator.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: nalgebra::Vector2::zeros(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
        }
    }

    /// Set the integration timestep.
    pub fn set_dt(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Create a rigid body + collider and return handles.
    /// The tag is stored in the body's `user_data` for contact lookups.
    pub fn create_body(&mut self, tag: BodyTag, desc: &BodyDesc, material: ColliderMaterial) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .linvel(vec2_to_na(desc.velocity))
            .angvel(desc.angular_velocity)
            .ccd_enabled(desc.ccd)
            .user_data(tag.to_user_data())
            .build();

        let body_handle = self.bodies.insert(rb);

        let collider = desc
            .collider
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .restitution_combine_rule(material.restitution_combine)
            .friction_combine_rule(material.friction_combine)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();

        let collider_handle = self
            .colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);

        PhysicsBody {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and all its colliders from the simulation.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Step the simulation and collect started contacts into the provided Vec.
    pub fn step_into(&mut self, contacts: &mut Vec<Contact>) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );
        contacts.extend(self.event_collector.drain_contacts());
    }

    /// Set the linear velocity of a body directly.
    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    /// Get the current linear velocity of a body.
    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_angular_velocity(&mut self, body: &PhysicsBody, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_angvel(angvel, true);
        }
    }

    pub fn angular_velocity(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    /// Teleport a body, waking it.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_translation(vec2_to_na(pos), true);
        }
    }

    /// Get the current position of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Zero a body's velocities and put it to sleep.
    pub fn sleep(&mut self, body: &PhysicsBody) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(nalgebra::Vector2::zeros(), false);
            rb.set_angvel(0.0, false);
            rb.sleep();
        }
    }

    pub fn is_sleeping(&self, body: &PhysicsBody) -> bool {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.is_sleeping())
            .unwrap_or(true)
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
