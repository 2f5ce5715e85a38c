//! Built-in circle physics
//!
//! A small fixed-step integrator for balls in an open-topped box: gravity,
//! drag, wall contacts, pairwise separation with a restitution impulse, and
//! collision-start tracking. Bodies live in a generational arena.

use std::collections::HashSet;

use glam::Vec2;

use super::physics::{BallTag, BodyHandle, BodyProperties, CollisionPair, PhysicsWorld};
use super::state::Container;

/// Separation passes per step
const SOLVER_ITERATIONS: usize = 4;
/// Gap under which two surfaces still count as touching
const CONTACT_SLOP: f32 = 0.5;

/// Static walls of the container. The top is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Bottom,
}

const WALLS: [Wall; 3] = [Wall::Left, Wall::Right, Wall::Bottom];

#[derive(Debug, Clone)]
enum Shape {
    Circle { radius: f32, tag: BallTag },
    Wall,
}

#[derive(Debug, Clone)]
struct Body {
    pos: Vec2,
    vel: Vec2,
    shape: Shape,
    props: BodyProperties,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Circle-only physics world bounded by the container walls
#[derive(Debug, Clone)]
pub struct SimpleWorld {
    container: Container,
    gravity: Vec2,
    slots: Vec<Slot>,
    free: Vec<u32>,
    walls: [BodyHandle; 3],
    /// Contacts seen during the previous step (ordered pairs)
    contacts: HashSet<(BodyHandle, BodyHandle)>,
    pending: Vec<CollisionPair>,
}

impl SimpleWorld {
    /// World for `container` with downward gravity in pixels/s²
    pub fn new(container: Container, gravity: f32) -> Self {
        let mut world = Self {
            container,
            gravity: Vec2::new(0.0, gravity),
            slots: Vec::new(),
            free: Vec::new(),
            walls: [BodyHandle::new(0, 0); 3],
            contacts: HashSet::new(),
            pending: Vec::new(),
        };
        let walls = WALLS.map(|_| {
            world.alloc(Body {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                shape: Shape::Wall,
                props: BodyProperties::default(),
            })
        });
        world.walls = walls;
        world
    }

    /// Handle of a static wall, as it appears in notifications
    pub fn wall_handle(&self, wall: Wall) -> BodyHandle {
        match wall {
            Wall::Left => self.walls[0],
            Wall::Right => self.walls[1],
            Wall::Bottom => self.walls[2],
        }
    }

    /// Number of live dynamic bodies
    pub fn body_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s.body, Some(Body { shape: Shape::Circle { .. }, .. })))
            .count()
    }

    fn alloc(&mut self, body: Body) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            BodyHandle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                body: Some(body),
            });
            BodyHandle::new(index, 0)
        }
    }

    fn get(&self, handle: BodyHandle) -> Option<&Body> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.body.as_ref()
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.body.as_mut()
    }

    /// Live circles as (handle, radius), in slot order
    fn circles(&self) -> Vec<(BodyHandle, f32)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match &slot.body {
                Some(Body {
                    shape: Shape::Circle { radius, .. },
                    ..
                }) => Some((BodyHandle::new(i as u32, slot.generation), *radius)),
                _ => None,
            })
            .collect()
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for slot in &mut self.slots {
            if let Some(body) = &mut slot.body {
                if matches!(body.shape, Shape::Wall) {
                    continue;
                }
                body.vel += gravity * dt;
                body.vel *= 1.0 - body.props.air_friction;
                body.pos += body.vel * dt;
            }
        }
    }

    /// Push a circle out of the walls. Returns the walls it touches.
    fn resolve_walls(&mut self, handle: BodyHandle, radius: f32) -> Vec<Wall> {
        let container = self.container;
        let mut touching = Vec::new();
        let Some(body) = self.get_mut(handle) else {
            return touching;
        };
        let restitution = body.props.restitution;
        let tangential = 1.0 - body.props.friction;

        if body.pos.x - radius < container.left() + CONTACT_SLOP {
            touching.push(Wall::Left);
            if body.pos.x - radius < container.left() {
                body.pos.x = container.left() + radius;
                if body.vel.x < 0.0 {
                    body.vel.x = -body.vel.x * restitution;
                    body.vel.y *= tangential;
                }
            }
        }
        if body.pos.x + radius > container.right() - CONTACT_SLOP {
            touching.push(Wall::Right);
            if body.pos.x + radius > container.right() {
                body.pos.x = container.right() - radius;
                if body.vel.x > 0.0 {
                    body.vel.x = -body.vel.x * restitution;
                    body.vel.y *= tangential;
                }
            }
        }
        if body.pos.y + radius > container.bottom() - CONTACT_SLOP {
            touching.push(Wall::Bottom);
            if body.pos.y + radius > container.bottom() {
                body.pos.y = container.bottom() - radius;
                if body.vel.y > 0.0 {
                    body.vel.y = -body.vel.y * restitution;
                    body.vel.x *= tangential;
                }
            }
        }
        touching
    }

    /// Separate two overlapping circles. Returns true if they touch.
    fn resolve_pair(&mut self, a: (BodyHandle, f32), b: (BodyHandle, f32)) -> bool {
        let (Some(body_a), Some(body_b)) = (self.get(a.0), self.get(b.0)) else {
            return false;
        };
        let delta = body_b.pos - body_a.pos;
        let dist = delta.length();
        let reach = a.1 + b.1;
        if dist >= reach + CONTACT_SLOP {
            return false;
        }
        if dist >= reach {
            return true;
        }

        // Coincident centres: separate vertically
        let normal = if dist > 1e-4 { delta / dist } else { Vec2::Y };
        let overlap = reach - dist;
        // Mass proportional to area
        let mass_a = a.1 * a.1;
        let mass_b = b.1 * b.1;
        let inv_total = 1.0 / (mass_a + mass_b);
        let restitution = body_a.props.restitution.min(body_b.props.restitution);
        let rel_vel = (body_b.vel - body_a.vel).dot(normal);

        let mut impulse = 0.0;
        if rel_vel < 0.0 {
            impulse = -(1.0 + restitution) * rel_vel * mass_a * mass_b * inv_total;
        }

        if let Some(body) = self.get_mut(a.0) {
            body.pos -= normal * overlap * mass_b * inv_total;
            body.vel -= normal * impulse / mass_a;
        }
        if let Some(body) = self.get_mut(b.0) {
            body.pos += normal * overlap * mass_a * inv_total;
            body.vel += normal * impulse / mass_b;
        }
        true
    }

    fn ordered(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
        if a <= b { (a, b) } else { (b, a) }
    }
}

impl PhysicsWorld for SimpleWorld {
    fn insert_body(
        &mut self,
        position: Vec2,
        radius: f32,
        properties: &BodyProperties,
        tag: BallTag,
    ) -> BodyHandle {
        self.alloc(Body {
            pos: position,
            vel: Vec2::ZERO,
            shape: Shape::Circle { radius, tag },
            props: *properties,
        })
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if self.walls.contains(&handle) || self.get(handle).is_none() {
            return;
        }
        let slot = &mut self.slots[handle.index() as usize];
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.contacts.retain(|&(a, b)| a != handle && b != handle);
    }

    fn step(&mut self, dt: f32) {
        self.integrate(dt);

        let circles = self.circles();
        let mut touching: Vec<(BodyHandle, BodyHandle)> = Vec::new();
        for _ in 0..SOLVER_ITERATIONS {
            for i in 0..circles.len() {
                for j in (i + 1)..circles.len() {
                    if self.resolve_pair(circles[i], circles[j]) {
                        let pair = Self::ordered(circles[i].0, circles[j].0);
                        if !touching.contains(&pair) {
                            touching.push(pair);
                        }
                    }
                }
            }
            for &(handle, radius) in &circles {
                for wall in self.resolve_walls(handle, radius) {
                    let pair = Self::ordered(handle, self.wall_handle(wall));
                    if !touching.contains(&pair) {
                        touching.push(pair);
                    }
                }
            }
        }

        for &(a, b) in &touching {
            if !self.contacts.contains(&(a, b)) {
                self.pending.push(CollisionPair::new(a, b));
            }
        }
        self.contacts = touching.into_iter().collect();
    }

    fn collisions_since_last_tick(&mut self) -> Vec<CollisionPair> {
        std::mem::take(&mut self.pending)
    }

    fn body_tag(&self, handle: BodyHandle) -> Option<BallTag> {
        match self.get(handle)?.shape {
            Shape::Circle { tag, .. } => Some(tag),
            Shape::Wall => None,
        }
    }

    fn body_position(&self, handle: BodyHandle) -> Option<Vec2> {
        let body = self.get(handle)?;
        match body.shape {
            Shape::Circle { .. } => Some(body.pos),
            Shape::Wall => None,
        }
    }

    fn live_body_positions(&self) -> Vec<(BodyHandle, Vec2)> {
        self.circles()
            .into_iter()
            .filter_map(|(h, _)| self.body_position(h).map(|p| (h, p)))
            .collect()
    }
}
