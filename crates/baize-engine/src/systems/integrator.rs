//! Physics integrator: cloth friction on top of the rigid-body solver,
//! pocket capture, sinking animation and contact events.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::PI;

use crate::components::ball::{Ball, BallLifecycle, ForceSync};
use crate::components::table::{Cushion, Table};
use crate::config::{EngineConfig, PhysicsTuning};
use crate::core::math::segment_point_distance;
use crate::core::physics::{
    BodyDesc, BodyTag, ColliderDesc, ColliderMaterial, Contact, PhysicsBody, PhysicsWorld,
};
use crate::core::time::FixedTimestep;
use crate::extensions::easing::ease_vec2;
use crate::systems::cloth::{self, ClothPhase};

/// Something that happened during a physics update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhysicsEvent {
    Ball { a: u8, b: u8, speed: f32 },
    Rail { ball: u8, cushion: Cushion, speed: f32 },
    Pocket { ball: u8, pocket: usize, speed: f32 },
}

pub struct Integrator {
    world: PhysicsWorld,
    tuning: PhysicsTuning,
    timestep: FixedTimestep,
    table: Table,
    rails: Vec<PhysicsBody>,
    /// Ball number → rigid body, for balls currently on the table.
    bodies: HashMap<u8, PhysicsBody>,
    /// Ball centres at the end of the previous sub-step, for swept capture.
    prev_pos: HashMap<u8, Vec2>,
    pending: Vec<ForceSync>,
    events: Vec<PhysicsEvent>,
    contacts: Vec<Contact>,
}

impl Integrator {
    pub fn new(table: &Table, config: &EngineConfig) -> Self {
        let timestep = FixedTimestep::new(config.fixed_dt, config.max_substeps).with_speed(config.speed);
        let mut world = PhysicsWorld::new();
        world.set_dt(timestep.dt());
        let mut integrator = Self {
            world,
            tuning: config.tuning.clone(),
            timestep,
            table: table.clone(),
            rails: Vec::new(),
            bodies: HashMap::new(),
            prev_pos: HashMap::new(),
            pending: Vec::new(),
            events: Vec::new(),
            contacts: Vec::new(),
        };
        integrator.build_rails();
        integrator
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn tuning(&self) -> &PhysicsTuning {
        &self.tuning
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.timestep.set_speed(speed);
    }

    /// Number of live ball bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn rail_count(&self) -> usize {
        self.rails.len()
    }

    /// Switch table geometry. Rails are torn down and rebuilt only when the
    /// style actually changes. Returns whether a rebuild happened.
    pub fn set_table(&mut self, table: &Table) -> bool {
        if table.style == self.table.style {
            return false;
        }
        log::info!("Rebuilding rails: {:?} -> {:?}", self.table.style, table.style);
        self.reset();
        self.table = table.clone();
        self.build_rails();
        true
    }

    fn build_rails(&mut self) {
        for rail in self.rails.drain(..) {
            self.world.remove_body(&rail);
        }
        let material = ColliderMaterial::dominant(self.tuning.rail_restitution, self.tuning.rail_friction);
        for (i, rail) in self.table.rails.iter().enumerate() {
            let desc = BodyDesc::fixed(ColliderDesc::Polyline {
                points: rail.points.clone(),
            });
            let body = self.world.create_body(BodyTag::Rail(i), &desc, material);
            self.rails.push(body);
        }
    }

    /// Destroy every ball body and drop all bookkeeping.
    pub fn reset(&mut self) {
        for (_, body) in self.bodies.drain() {
            self.world.remove_body(&body);
        }
        self.prev_pos.clear();
        self.pending.clear();
        self.events.clear();
        self.contacts.clear();
        self.timestep.reset();
    }

    /// Queue authoritative state for a ball, applied at the next sub-step.
    pub fn queue_sync(&mut self, sync: ForceSync) {
        self.pending.push(sync);
    }

    pub fn queue_syncs(&mut self, syncs: impl IntoIterator<Item = ForceSync>) {
        self.pending.extend(syncs);
    }

    /// Advance the simulation by one render frame. Runs 0..=max sub-steps
    /// and returns every event produced; the buffer is cleared on each call.
    pub fn update(&mut self, balls: &mut [Ball], frame_dt: f32) -> Vec<PhysicsEvent> {
        self.events.clear();
        let steps = self.timestep.accumulate(frame_dt);
        let dt = self.timestep.dt();
        for _ in 0..steps {
            self.substep(balls, dt);
        }
        std::mem::take(&mut self.events)
    }

    /// Any ball moving above the rest thresholds, or any ball still sinking.
    pub fn are_balls_moving(&self, balls: &[Ball]) -> bool {
        balls.iter().any(|b| match b.lifecycle {
            BallLifecycle::OnTable => cloth::is_moving(b, &self.tuning),
            BallLifecycle::Sinking(_) => true,
            BallLifecycle::Pocketed => false,
        })
    }

    fn ball_material(&self, radius: f32) -> ColliderMaterial {
        ColliderMaterial {
            restitution: self.tuning.ball_restitution,
            friction: self.tuning.ball_friction,
            density: self.tuning.ball_mass / (PI * radius * radius),
            ..ColliderMaterial::default()
        }
    }

    fn ensure_bodies(&mut self, balls: &[Ball]) {
        for ball in balls {
            let has_body = self.bodies.contains_key(&ball.number);
            if ball.on_table() && !has_body {
                let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: ball.radius })
                    .with_position(ball.pos)
                    .with_velocity(ball.vel)
                    .with_angular_velocity(ball.spin_z)
                    .with_ccd(true);
                let material = self.ball_material(ball.radius);
                let body = self.world.create_body(BodyTag::Ball(ball.number), &desc, material);
                self.bodies.insert(ball.number, body);
                self.prev_pos.insert(ball.number, ball.pos);
            } else if !ball.on_table() && has_body {
                self.remove_ball_body(ball.number);
            }
        }
    }

    fn remove_ball_body(&mut self, number: u8) {
        if let Some(body) = self.bodies.remove(&number) {
            self.world.remove_body(&body);
        }
        self.prev_pos.remove(&number);
    }

    fn apply_syncs(&mut self, balls: &mut [Ball]) {
        for sync in std::mem::take(&mut self.pending) {
            let Some(ball) = balls.iter_mut().find(|b| b.number == sync.ball) else {
                continue;
            };
            sync.apply_to(ball);
            if let Some(body) = self.bodies.get(&sync.ball) {
                self.world.set_position(body, sync.position);
                self.world.set_velocity(body, sync.velocity);
                self.world.set_angular_velocity(body, sync.spin_z);
                self.prev_pos.insert(sync.ball, sync.position);
            }
        }
    }

    fn substep(&mut self, balls: &mut [Ball], dt: f32) {
        self.ensure_bodies(balls);
        self.apply_syncs(balls);

        // 1. Cloth friction
        for ball in balls.iter_mut().filter(|b| b.on_table()) {
            let Some(body) = self.bodies.get(&ball.number) else {
                continue;
            };
            if self.world.is_sleeping(body) && !cloth::is_moving(ball, &self.tuning) {
                continue;
            }
            match cloth::apply_cloth(ball, &self.tuning, dt) {
                ClothPhase::Stopped => self.world.sleep(body),
                ClothPhase::Sliding | ClothPhase::Rolling => {
                    self.world.set_velocity(body, ball.vel);
                    self.world.set_angular_velocity(body, ball.spin_z);
                }
            }
        }

        // 2. Rigid-body step
        self.contacts.clear();
        self.world.step_into(&mut self.contacts);
        for contact in self.contacts.drain(..) {
            let event = match (contact.a, contact.b) {
                (BodyTag::Ball(a), BodyTag::Ball(b)) => Some(PhysicsEvent::Ball { a, b, speed: contact.speed }),
                (BodyTag::Ball(ball), BodyTag::Rail(i)) | (BodyTag::Rail(i), BodyTag::Ball(ball)) => self
                    .table
                    .rails
                    .get(i)
                    .map(|rail| PhysicsEvent::Rail { ball, cushion: rail.cushion, speed: contact.speed }),
                (BodyTag::Rail(_), BodyTag::Rail(_)) => None,
            };
            self.events.extend(event);
        }

        // 3. Pocket capture, 4. re-sync, 5. stop condition
        for ball in balls.iter_mut().filter(|b| b.on_table()) {
            let Some(body) = self.bodies.get(&ball.number).copied() else {
                continue;
            };
            let pos = self.world.body_position(&body);
            let vel = self.world.velocity(&body);
            let prev = self.prev_pos.get(&ball.number).copied().unwrap_or(pos);

            if let Some(pocket) = self.captured_by(prev, pos, ball.radius) {
                ball.pos = pos;
                self.capture(ball, pocket, vel.length());
                continue;
            }
            if self.table.has_escaped(pos) {
                let pocket = self.table.nearest_pocket(pos);
                log::warn!("Ball {} escaped at {:?}, pocketing to pocket {}", ball.number, pos, pocket);
                ball.pos = pos;
                self.capture(ball, pocket, vel.length());
                continue;
            }

            ball.pos = pos;
            ball.vel = vel;
            ball.spin_z = self.world.angular_velocity(&body);
            self.prev_pos.insert(ball.number, pos);

            if cloth::settle(ball, &self.tuning) && !self.world.is_sleeping(&body) {
                self.world.sleep(&body);
            }
        }

        self.advance_sinking(balls, dt);
    }

    /// Pocket whose capture circle the swept segment `prev`-`pos` enters.
    fn captured_by(&self, prev: Vec2, pos: Vec2, radius: f32) -> Option<usize> {
        self.table.pockets.iter().position(|pocket| {
            let capture = pocket.capture_radius(radius, self.tuning.pocket_capture_fraction);
            segment_point_distance(prev, pos, pocket.pos) < capture
        })
    }

    fn capture(&mut self, ball: &mut Ball, pocket: usize, speed: f32) {
        log::debug!("Ball {} captured by pocket {} at {:.2} m/s", ball.number, pocket, speed);
        self.remove_ball_body(ball.number);
        ball.start_sinking(pocket, speed);
        self.events.push(PhysicsEvent::Pocket {
            ball: ball.number,
            pocket,
            speed,
        });
    }

    fn advance_sinking(&mut self, balls: &mut [Ball], dt: f32) {
        let duration = self.tuning.sink_duration.max(f32::EPSILON);
        for ball in balls.iter_mut() {
            let BallLifecycle::Sinking(mut sinking) = ball.lifecycle else {
                continue;
            };
            sinking.progress = (sinking.progress + dt / duration).min(1.0);
            let target = self
                .table
                .pockets
                .get(sinking.pocket)
                .map(|p| p.pos)
                .unwrap_or(sinking.from);
            ball.pos = ease_vec2(sinking.from, target, sinking.progress, self.tuning.sink_easing);
            if sinking.progress >= 1.0 {
                ball.pocket();
            } else {
                ball.lifecycle = BallLifecycle::Sinking(sinking);
            }
        }
    }
}
