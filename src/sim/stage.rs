//! Headless sprite and physics runtime
//!
//! Nodes carry a transform, an appearance, an optional rigid body and a list
//! of declarative actions. `Stage::step` runs actions, integrates dynamic
//! bodies and reports contact-begin events. Nothing here knows about game
//! rules.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{shapes_overlap, wants_contact};
use super::state::Texture;
use crate::consts::GRAVITY;

/// Stable node identifier (never reused within a stage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

/// Collision shape, centred on the node position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Rect { size: Vec2 },
}

/// A rigid body attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub shape: Shape,
    /// Static bodies ignore gravity, velocity and impulses
    pub dynamic: bool,
    pub affected_by_gravity: bool,
    pub velocity: Vec2,
    pub mass: f32,
    pub category: u32,
    pub contact_test: u32,
    pub collision: u32,
}

impl Body {
    /// Dynamic circular body with unit mass
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: Shape::Circle { radius },
            dynamic: true,
            affected_by_gravity: true,
            velocity: Vec2::ZERO,
            mass: 1.0,
            category: 0,
            contact_test: 0,
            collision: 0,
        }
    }

    /// Static rectangular body
    pub fn rect(size: Vec2) -> Self {
        Self {
            shape: Shape::Rect { size },
            dynamic: false,
            affected_by_gravity: false,
            velocity: Vec2::ZERO,
            mass: 1.0,
            category: 0,
            contact_test: 0,
            collision: 0,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_masks(mut self, category: u32, contact_test: u32, collision: u32) -> Self {
        self.category = category;
        self.contact_test = contact_test;
        self.collision = collision;
        self
    }
}

/// Declarative, time-bounded node behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Linear translation by `delta` over `duration` seconds
    MoveBy {
        delta: Vec2,
        duration: f32,
        elapsed: f32,
        remove_on_finish: bool,
    },
    /// Endless leftward scroll that jumps back by `span` every cycle
    ScrollLoop { speed: f32, span: f32, travelled: f32 },
    /// Cycle through textures forever
    Animate {
        frames: Vec<Texture>,
        time_per_frame: f32,
        elapsed: f32,
    },
}

impl Action {
    pub fn move_by(delta: Vec2, duration: f32) -> Self {
        Action::MoveBy {
            delta,
            duration,
            elapsed: 0.0,
            remove_on_finish: false,
        }
    }

    /// Move, then remove the node from the stage
    pub fn move_by_then_remove(delta: Vec2, duration: f32) -> Self {
        Action::MoveBy {
            delta,
            duration,
            elapsed: 0.0,
            remove_on_finish: true,
        }
    }

    pub fn scroll_loop(speed: f32, span: f32) -> Self {
        Action::ScrollLoop {
            speed,
            span,
            travelled: 0.0,
        }
    }

    pub fn animate(frames: Vec<Texture>, time_per_frame: f32) -> Self {
        Action::Animate {
            frames,
            time_per_frame,
            elapsed: 0.0,
        }
    }
}

/// Result of running one action for one step
enum ActionStatus {
    Running,
    Finished,
    RemoveNode,
}

/// A sprite, label or invisible sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub z: i32,
    pub texture: Texture,
    /// Label text, if this node is a label
    pub text: Option<String>,
    pub body: Option<Body>,
    pub actions: Vec<Action>,
}

impl Node {
    pub fn new(name: &str, position: Vec2, size: Vec2) -> Self {
        Self {
            name: name.to_string(),
            position,
            size,
            rotation: 0.0,
            z: 0,
            texture: Texture::None,
            text: None,
            body: None,
            actions: Vec::new(),
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Advance every action by `dt`; returns true if the node should be removed
    fn run_actions(&mut self, dt: f32) -> bool {
        let Node {
            position,
            texture,
            actions,
            ..
        } = self;

        let mut remove = false;
        let mut index = 0;
        while index < actions.len() {
            let target = Transform {
                position: &mut *position,
                texture: &mut *texture,
            };
            match step_action(&mut actions[index], target, dt) {
                ActionStatus::Running => index += 1,
                ActionStatus::Finished => {
                    actions.remove(index);
                }
                ActionStatus::RemoveNode => {
                    actions.remove(index);
                    remove = true;
                }
            }
        }
        remove
    }
}

/// Node fields an action may touch
struct Transform<'a> {
    position: &'a mut Vec2,
    texture: &'a mut Texture,
}

fn step_action(action: &mut Action, target: Transform<'_>, dt: f32) -> ActionStatus {
    match action {
        Action::MoveBy {
            delta,
            duration,
            elapsed,
            remove_on_finish,
        } => {
            let fraction = if *duration <= 0.0 {
                *elapsed = 0.0;
                1.0
            } else {
                let before = *elapsed;
                *elapsed = (*elapsed + dt).min(*duration);
                (*elapsed - before) / *duration
            };
            *target.position += *delta * fraction;

            if *duration <= 0.0 || *elapsed >= *duration {
                if *remove_on_finish {
                    ActionStatus::RemoveNode
                } else {
                    ActionStatus::Finished
                }
            } else {
                ActionStatus::Running
            }
        }
        Action::ScrollLoop {
            speed,
            span,
            travelled,
        } => {
            if *span <= 0.0 {
                return ActionStatus::Finished;
            }
            let distance = *speed * dt;
            target.position.x -= distance;
            *travelled += distance;
            while *travelled >= *span {
                *travelled -= *span;
                target.position.x += *span;
            }
            ActionStatus::Running
        }
        Action::Animate {
            frames,
            time_per_frame,
            elapsed,
        } => {
            if frames.is_empty() || *time_per_frame <= 0.0 {
                return ActionStatus::Finished;
            }
            let cycle = *time_per_frame * frames.len() as f32;
            *elapsed = (*elapsed + dt) % cycle;
            let index = ((*elapsed / *time_per_frame) as usize).min(frames.len() - 1);
            *target.texture = frames[index];
            ActionStatus::Running
        }
    }
}

/// Contact-begin report between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: NodeId,
    pub b: NodeId,
    pub category_a: u32,
    pub category_b: u32,
}

/// The scene graph plus physics world
#[derive(Debug, Clone)]
pub struct Stage {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
    gravity: Vec2,
    /// Body pairs overlapping at the end of the previous step
    touching: BTreeSet<(NodeId, NodeId)>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::with_gravity(GRAVITY)
    }

    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
            gravity,
            touching: BTreeSet::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Add a node and return its id
    pub fn spawn(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.touching.retain(|(a, b)| *a != id && *b != id);
        self.nodes.remove(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// First node with the given name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| *id)
    }

    pub fn body(&self, id: NodeId) -> Option<&Body> {
        self.nodes.get(&id).and_then(|n| n.body.as_ref())
    }

    fn body_mut(&mut self, id: NodeId) -> Option<&mut Body> {
        self.nodes.get_mut(&id).and_then(|n| n.body.as_mut())
    }

    /// Give a node a body (replacing any existing one)
    pub fn attach_body(&mut self, id: NodeId, body: Body) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.body = Some(body);
                true
            }
            None => false,
        }
    }

    pub fn velocity(&self, id: NodeId) -> Option<Vec2> {
        self.body(id).map(|b| b.velocity)
    }

    pub fn set_velocity(&mut self, id: NodeId, velocity: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.velocity = velocity;
                true
            }
            None => false,
        }
    }

    /// Change velocity by `impulse / mass`; static bodies are unaffected
    pub fn apply_impulse(&mut self, id: NodeId, impulse: Vec2) -> bool {
        match self.body_mut(id) {
            Some(body) if body.dynamic && body.mass > 0.0 => {
                body.velocity += impulse / body.mass;
                true
            }
            _ => false,
        }
    }

    pub fn set_dynamic(&mut self, id: NodeId, dynamic: bool) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.dynamic = dynamic;
                true
            }
            None => false,
        }
    }

    pub fn set_masks(
        &mut self,
        id: NodeId,
        category: u32,
        contact_test: u32,
        collision: u32,
    ) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.category = category;
                body.contact_test = contact_test;
                body.collision = collision;
                true
            }
            None => false,
        }
    }

    pub fn run_action(&mut self, id: NodeId, action: Action) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.actions.push(action);
                true
            }
            None => false,
        }
    }

    /// Stop every running action on every node, leaving nodes where they are
    pub fn remove_all_actions(&mut self) {
        for node in self.nodes.values_mut() {
            node.actions.clear();
        }
    }

    /// Number of nodes with at least one running action
    pub fn animated_nodes(&self) -> usize {
        self.nodes.values().filter(|n| !n.actions.is_empty()).count()
    }

    /// Run actions, integrate bodies, and report new contacts
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        let finished: Vec<NodeId> = self
            .nodes
            .iter_mut()
            .filter_map(|(id, node)| node.run_actions(dt).then_some(*id))
            .collect();
        for id in finished {
            self.remove(id);
        }

        let gravity = self.gravity;
        for node in self.nodes.values_mut() {
            if let Some(body) = node.body.as_mut() {
                if body.dynamic {
                    if body.affected_by_gravity {
                        body.velocity += gravity * dt;
                    }
                    node.position += body.velocity * dt;
                }
            }
        }

        self.detect_contacts()
    }

    fn detect_contacts(&mut self) -> Vec<Contact> {
        let bodies: Vec<(NodeId, Vec2, &Body)> = self
            .nodes
            .iter()
            .filter_map(|(id, node)| node.body.as_ref().map(|b| (*id, node.position, b)))
            .collect();

        let mut current = BTreeSet::new();
        let mut began = Vec::new();

        for (i, (id_a, pos_a, a)) in bodies.iter().enumerate() {
            for (id_b, pos_b, b) in &bodies[i + 1..] {
                if !(a.dynamic || b.dynamic) {
                    continue;
                }
                if !wants_contact(a.category, a.contact_test, b.category, b.contact_test) {
                    continue;
                }
                if !shapes_overlap(*pos_a, &a.shape, *pos_b, &b.shape) {
                    continue;
                }

                let pair = (*id_a, *id_b);
                if !self.touching.contains(&pair) {
                    began.push(Contact {
                        a: *id_a,
                        b: *id_b,
                        category_a: a.category,
                        category_b: b.category,
                    });
                }
                current.insert(pair);
            }
        }

        self.touching = current;
        began
    }
}
