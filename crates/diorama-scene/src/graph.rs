//! Node storage, hierarchy, and per-frame traversal.

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::geometry::Geometry;
use crate::light::Lights;
use crate::material::Material;
use crate::model::ModelTemplate;
use crate::transform::Transform;

/// Handle to a node. Ids are never reused within a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Geometry plus the material it is drawn with.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    /// Hidden nodes hide their whole subtree.
    pub visible: bool,
    pub mesh: Option<MeshInstance>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// A node with no mesh, used to group children.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            visible: true,
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            mesh: Some(MeshInstance { geometry, material }),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A visible mesh node resolved to world space.
#[derive(Debug, Clone, Copy)]
pub struct Drawable<'a> {
    pub node: NodeId,
    pub world: Mat4,
    pub instance: &'a MeshInstance,
}

/// The retained scene: a forest of nodes plus the lights that shade them.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: FxHashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u64,
    pub lights: Lights,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Insert a top-level node.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = self.insert(node, None);
        self.roots.push(id);
        id
    }

    /// Insert `node` under `parent`. Returns `None` if the parent is gone.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = self.insert(node, Some(parent));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.parent = parent;
        node.children.clear();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its whole subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get(&id) else {
            return 0;
        };
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    /// First node with the given name, in insertion order of the roots.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.nodes.get(&id)?;
            if node.name == name {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Clone a model template under a new group node placed at `transform`.
    pub fn instantiate(
        &mut self,
        template: &ModelTemplate,
        name: impl Into<String>,
        transform: Transform,
    ) -> NodeId {
        let root = self.add(Node::group(name).with_transform(transform));
        for part in &template.parts {
            let child = Node::mesh(
                part.name.clone(),
                Arc::clone(&part.geometry),
                part.material.clone(),
            );
            self.add_child(root, child);
        }
        root
    }

    /// Local-to-world matrix of a node, or `None` if it does not exist.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.nodes.get(&cur)?;
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        Some(matrix)
    }

    /// Mesh instances of every node, hidden ones included.
    pub fn mesh_instances(&self) -> impl Iterator<Item = &MeshInstance> {
        self.nodes.values().filter_map(|node| node.mesh.as_ref())
    }

    /// Every visible mesh node with its world matrix, depth-first in
    /// insertion order.
    pub fn drawables(&self) -> Vec<Drawable<'_>> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            if let Some(instance) = &node.mesh {
                out.push(Drawable {
                    node: id,
                    world,
                    instance,
                });
            }
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::model::ModelPart;
    use glam::Vec3;

    fn quad(name: &str) -> Node {
        Node::mesh(
            name,
            Arc::new(Geometry::plane(1.0, 1.0)),
            Material::basic(Color::WHITE),
        )
    }

    #[test]
    fn test_add_and_get() {
        let mut scene = Scene::new();
        let id = scene.add(quad("ground"));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.get(id).map(|n| n.name.as_str()), Some("ground"));
        assert_eq!(scene.roots(), &[id]);
    }

    #[test]
    fn test_remove_takes_subtree() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("trees"));
        let a = scene.add_child(group, quad("tree")).unwrap();
        scene.add_child(a, quad("leaf")).unwrap();
        let other = scene.add(quad("river"));

        assert_eq!(scene.remove(group), 3);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.roots(), &[other]);
        assert!(!scene.contains(a));
        assert_eq!(scene.remove(group), 0);
    }

    #[test]
    fn test_remove_child_unlinks_from_parent() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("g"));
        let child = scene.add_child(group, quad("c")).unwrap();
        scene.remove(child);
        assert!(scene.get(group).unwrap().children().is_empty());
    }

    #[test]
    fn test_add_child_to_missing_parent() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("g"));
        scene.remove(group);
        assert!(scene.add_child(group, quad("orphan")).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_hidden_parent_hides_subtree() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("g"));
        scene.add_child(group, quad("a")).unwrap();
        scene.add(quad("b"));
        assert_eq!(scene.drawables().len(), 2);

        scene.get_mut(group).unwrap().visible = false;
        let drawables = scene.drawables();
        assert_eq!(drawables.len(), 1);
        assert_eq!(scene.get(drawables[0].node).unwrap().name, "b");
    }

    #[test]
    fn test_mesh_instances_include_hidden() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group("g"));
        scene.add_child(group, quad("a")).unwrap();
        let b = scene.add(quad("b"));
        scene.get_mut(group).unwrap().visible = false;
        scene.get_mut(b).unwrap().visible = false;
        assert!(scene.drawables().is_empty());
        assert_eq!(scene.mesh_instances().count(), 2);
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut scene = Scene::new();
        let group = scene.add(
            Node::group("g").with_transform(Transform::from_position(Vec3::new(0.0, -20.0, 0.0))),
        );
        let child = scene
            .add_child(
                group,
                quad("c").with_transform(Transform::from_position(Vec3::new(5.0, 0.0, 0.0))),
            )
            .unwrap();
        let world = scene.world_matrix(child).unwrap();
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(5.0, -20.0, 0.0));

        let drawable = scene.drawables().into_iter().find(|d| d.node == child).unwrap();
        assert_eq!(drawable.world, world);
    }

    #[test]
    fn test_instantiate_shares_geometry() {
        let geometry = Arc::new(Geometry::cuboid(1.0, 1.0, 1.0));
        let template = ModelTemplate {
            name: "cliff".into(),
            parts: vec![ModelPart {
                name: "rock".into(),
                geometry: Arc::clone(&geometry),
                material: Material::lit(Color::WHITE),
            }],
        };
        let mut scene = Scene::new();
        let a = scene.instantiate(&template, "cliff-0", Transform::IDENTITY);
        let b = scene.instantiate(&template, "cliff-1", Transform::IDENTITY);
        assert_ne!(a, b);
        assert_eq!(scene.len(), 4);
        assert_eq!(Arc::strong_count(&geometry), 3);
        assert_eq!(scene.find_by_name("cliff-1"), Some(b));
    }
}
