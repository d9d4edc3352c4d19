//! Arena-backed quad-tree used by the level-synchronous schedule.
//!
//! Every accepted sample is a node. A node owns a reach box (the square of half-size `2·r`
//! around it, clipped to the tile) split into four quadrants at the node's position, and may
//! spawn at most one child per quadrant. A node is *real* while it can still spawn children;
//! once retired it never becomes real again. Nodes live in a flat `Vec` and refer to each other
//! by [`NodeId`], so the whole tree is released when the arena is dropped.
use glam::Vec2;

use crate::bounds::Bounds;

/// Index of a node inside its [`QuadTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One of the four child slots of a node. "Top" is the half with the smaller y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BotLeft,
    BotRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BotLeft,
        Quadrant::BotRight,
    ];

    #[inline]
    fn slot(self) -> usize {
        match self {
            Quadrant::TopLeft => 0,
            Quadrant::TopRight => 1,
            Quadrant::BotLeft => 2,
            Quadrant::BotRight => 3,
        }
    }

    /// Quadrant of `p` as seen from `origin`.
    pub fn of(origin: Vec2, p: Vec2) -> Self {
        match (p.x < origin.x, p.y < origin.y) {
            (true, true) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BotLeft,
            (false, false) => Quadrant::BotRight,
        }
    }

    /// This quadrant of the rectangle `[top_left, bot_right]` split at `pivot`.
    pub fn sub_rect(self, top_left: Vec2, bot_right: Vec2, pivot: Vec2) -> (Vec2, Vec2) {
        match self {
            Quadrant::TopLeft => (top_left, pivot),
            Quadrant::TopRight => (
                Vec2::new(pivot.x, top_left.y),
                Vec2::new(bot_right.x, pivot.y),
            ),
            Quadrant::BotLeft => (
                Vec2::new(top_left.x, pivot.y),
                Vec2::new(pivot.x, bot_right.y),
            ),
            Quadrant::BotRight => (pivot, bot_right),
        }
    }
}

#[derive(Clone, Debug)]
pub struct QuadNode {
    pub position: Vec2,
    /// Exclusion radius enforced around `position`.
    pub radius: f32,
    pub top_left: Vec2,
    pub bot_right: Vec2,
    pub level: u32,
    real: bool,
    children: [Option<NodeId>; 4],
}

impl QuadNode {
    pub fn is_real(&self) -> bool {
        self.real
    }

    pub fn child(&self, quadrant: Quadrant) -> Option<NodeId> {
        self.children[quadrant.slot()]
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Quadrants that are still free and cover a non-empty part of the tile.
    pub fn open_quadrants(&self) -> Vec<Quadrant> {
        if !self.real {
            return Vec::new();
        }
        Quadrant::ALL
            .into_iter()
            .filter(|q| self.children[q.slot()].is_none())
            .filter(|q| {
                let (tl, br) = q.sub_rect(self.top_left, self.bot_right, self.position);
                br.x > tl.x && br.y > tl.y
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct QuadTree {
    domain_min: Vec2,
    domain_max: Vec2,
    nodes: Vec<QuadNode>,
}

impl QuadTree {
    /// Creates a tree over `domain` whose root sits at `position`.
    pub fn new(domain: &Bounds, position: Vec2, radius: f32) -> Self {
        let mut tree = Self {
            domain_min: domain.min(),
            domain_max: domain.max(),
            nodes: Vec::new(),
        };
        tree.push(position, radius, 0);
        tree
    }

    fn push(&mut self, position: Vec2, radius: f32, level: u32) -> NodeId {
        let reach = Vec2::splat(2.0 * radius);
        let top_left = (position - reach).clamp(self.domain_min, self.domain_max);
        let bot_right = (position + reach).clamp(self.domain_min, self.domain_max);
        let id = NodeId(self.nodes.len());
        let mut node = QuadNode {
            position,
            radius,
            top_left,
            bot_right,
            level,
            real: true,
            children: [None; 4],
        };
        if node.open_quadrants().is_empty() {
            node.real = false;
        }
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &QuadNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels, counting the root as level zero.
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.level + 1).max().unwrap_or(0)
    }

    /// Attaches a child in `quadrant` of `parent`. Returns `None` if the parent is retired or
    /// the slot is taken. A parent left without open quadrants is retired.
    pub fn attach(
        &mut self,
        parent: NodeId,
        quadrant: Quadrant,
        position: Vec2,
        radius: f32,
    ) -> Option<NodeId> {
        let p = &self.nodes[parent.0];
        if !p.real || p.children[quadrant.slot()].is_some() {
            return None;
        }
        let level = p.level + 1;
        let id = self.push(position, radius, level);
        let p = &mut self.nodes[parent.0];
        p.children[quadrant.slot()] = Some(id);
        if p.open_quadrants().is_empty() {
            p.real = false;
        }
        Some(id)
    }

    /// Marks `id` as permanently unable to spawn children.
    pub fn retire(&mut self, id: NodeId) {
        self.nodes[id.0].real = false;
    }

    pub fn real_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.real)
            .map(|(i, _)| NodeId(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> Bounds {
        Bounds::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn root_reach_box_is_clipped_to_domain() {
        let tree = QuadTree::new(&domain(), Vec2::new(10.0, 50.0), 10.0);
        let root = tree.node(tree.root());
        assert_eq!(root.top_left, Vec2::new(0.0, 30.0));
        assert_eq!(root.bot_right, Vec2::new(30.0, 70.0));
        assert!(root.is_real());
        assert_eq!(root.open_quadrants().len(), 4);
    }

    #[test]
    fn corner_node_has_single_open_quadrant() {
        let tree = QuadTree::new(&domain(), Vec2::new(0.0, 0.0), 5.0);
        let root = tree.node(tree.root());
        assert_eq!(root.open_quadrants(), vec![Quadrant::BotRight]);
    }

    #[test]
    fn attach_fills_slots_and_retires_full_parent() {
        let mut tree = QuadTree::new(&domain(), Vec2::new(50.0, 50.0), 5.0);
        let root = tree.root();
        let offsets = [(-6.0, -6.0), (6.0, -6.0), (-6.0, 6.0), (6.0, 6.0)];
        for (q, (dx, dy)) in Quadrant::ALL.into_iter().zip(offsets) {
            let child = tree.attach(root, q, Vec2::new(50.0 + dx, 50.0 + dy), 5.0);
            assert!(child.is_some());
            assert_eq!(tree.node(root).child(q), child);
        }
        assert!(!tree.node(root).is_real());
        assert_eq!(tree.node(root).children().count(), 4);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.depth(), 2);
        assert!(tree
            .attach(root, Quadrant::TopLeft, Vec2::new(40.0, 40.0), 5.0)
            .is_none());
    }

    #[test]
    fn retired_nodes_refuse_children() {
        let mut tree = QuadTree::new(&domain(), Vec2::new(50.0, 50.0), 5.0);
        let root = tree.root();
        tree.retire(root);
        assert!(tree
            .attach(root, Quadrant::BotRight, Vec2::new(57.0, 57.0), 5.0)
            .is_none());
        assert_eq!(tree.real_nodes().count(), 0);
    }

    #[test]
    fn sub_rects_tile_the_parent() {
        let tl = Vec2::new(0.0, 0.0);
        let br = Vec2::new(10.0, 10.0);
        let pivot = Vec2::new(4.0, 6.0);
        let area: f32 = Quadrant::ALL
            .into_iter()
            .map(|q| {
                let (a, b) = q.sub_rect(tl, br, pivot);
                (b.x - a.x) * (b.y - a.y)
            })
            .sum();
        assert_eq!(area, 100.0);
    }
}
