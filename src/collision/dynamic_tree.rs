use crate::math::{Aabb, RayCastInput, Real, Vec2};

/// Identifier of a leaf of a [`DynamicTree`]
pub type ProxyId = usize;

const NULL_NODE: usize = usize::MAX;

/// Extra margin, in multiples of the fattening extension, before a stored
/// AABB counts as oversized in [`DynamicTree::move_proxy`]
const HUGE_MULTIPLIER: Real = 4.0;

#[derive(Debug, Clone)]
struct TreeNode<T> {
    /// Fattened AABB for leaves, union of the children for branches
    aabb: Aabb,

    /// Only leaves carry data
    data: Option<T>,

    /// Parent while allocated, next free node while free
    parent: usize,

    child1: usize,

    child2: usize,

    /// Leaf = 0, free node = -1
    height: i32,
}

impl<T> TreeNode<T> {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

const STACK_CAPACITY: usize = 256;

/// Traversal stack kept on the call stack. Only trees deeper than
/// `STACK_CAPACITY` spill onto the heap.
struct GrowableStack {
    inline: [usize; STACK_CAPACITY],
    len: usize,
    spill: Vec<usize>,
}

impl GrowableStack {
    fn new() -> Self {
        Self {
            inline: [NULL_NODE; STACK_CAPACITY],
            len: 0,
            spill: Vec::new(),
        }
    }

    fn push(&mut self, index: usize) {
        if self.len < STACK_CAPACITY {
            self.inline[self.len] = index;
            self.len += 1;
        } else {
            self.spill.push(index);
        }
    }

    fn pop(&mut self) -> Option<usize> {
        if let Some(index) = self.spill.pop() {
            return Some(index);
        }
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.inline[self.len])
    }
}

/// A dynamic AABB tree broad-phase.
///
/// The tree arranges proxies in a binary tree to accelerate queries such as
/// volume queries and ray casts. Leaves are proxies with an AABB, and the
/// tree is rebalanced through rotations on every insertion and removal.
/// Nodes are pooled and relocatable, so node indices rather than
/// references are used to link them.
///
/// Leaf AABBs are never fattened by the tree itself except in
/// [`move_proxy`](Self::move_proxy); callers fatten before
/// [`create_proxy`](Self::create_proxy).
#[derive(Debug, Clone)]
pub struct DynamicTree<T> {
    nodes: Vec<TreeNode<T>>,
    root: usize,
    free_list: usize,
    leaf_count: usize,
}

impl<T> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DynamicTree<T> {
    /// Creates an empty tree
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: NULL_NODE,
            free_list: NULL_NODE,
            leaf_count: 0,
        }
    }

    /// Creates a leaf for `aabb` carrying `data`. The AABB is stored as given.
    pub fn create_proxy(&mut self, aabb: Aabb, data: T) -> ProxyId {
        let id = self.allocate_node();
        {
            let node = &mut self.nodes[id];
            node.aabb = aabb;
            node.data = Some(data);
            node.height = 0;
        }
        self.insert_leaf(id);
        self.leaf_count += 1;
        id
    }

    /// Destroys a leaf, returning its data
    pub fn destroy_proxy(&mut self, id: ProxyId) -> Option<T> {
        debug_assert!(id < self.nodes.len());
        debug_assert!(self.nodes[id].height == 0 && self.nodes[id].is_leaf());

        self.remove_leaf(id);
        let data = self.nodes[id].data.take();
        self.free_node(id);
        self.leaf_count -= 1;
        data
    }

    /// Moves a proxy to `aabb`, swept by `displacement`.
    ///
    /// Returns `false` (leaving the tree untouched) while the stored AABB
    /// still contains `aabb` and is not oversized. Otherwise the leaf is
    /// reinserted with `aabb` fattened by `extension` and displaced, and
    /// `true` is returned.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Aabb, displacement: Vec2, extension: Real) -> bool {
        debug_assert!(id < self.nodes.len());
        debug_assert!(self.nodes[id].is_leaf());

        let fat_aabb = aabb.get_fattened(extension).get_displaced(displacement);
        let tree_aabb = self.nodes[id].aabb;
        if tree_aabb.contains(&aabb) {
            // The tree AABB still contains the object, but it might be too large.
            let huge_aabb = fat_aabb.get_fattened(HUGE_MULTIPLIER * extension);
            if huge_aabb.contains(&tree_aabb) {
                return false;
            }
        }

        self.remove_leaf(id);
        self.nodes[id].aabb = fat_aabb;
        self.insert_leaf(id);
        true
    }

    /// Stored AABB of a proxy
    pub fn get_aabb(&self, id: ProxyId) -> Aabb {
        debug_assert!(id < self.nodes.len());
        self.nodes[id].aabb
    }

    /// User data of a proxy
    pub fn get_user_data(&self, id: ProxyId) -> Option<&T> {
        debug_assert!(id < self.nodes.len());
        self.nodes.get(id).and_then(|n| n.data.as_ref())
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of allocated nodes, branches included
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.height >= 0).count()
    }

    /// Calls `callback` for each proxy whose AABB overlaps `aabb`.
    /// The traversal stops when the callback returns `false`.
    pub fn query<F>(&self, aabb: &Aabb, mut callback: F)
    where
        F: FnMut(ProxyId) -> bool,
    {
        let mut stack = GrowableStack::new();
        stack.push(self.root);

        while let Some(index) = stack.pop() {
            if index == NULL_NODE {
                continue;
            }

            let node = &self.nodes[index];
            if node.aabb.overlaps(aabb) {
                if node.is_leaf() {
                    if !callback(index) {
                        return;
                    }
                } else {
                    stack.push(node.child1);
                    stack.push(node.child2);
                }
            }
        }
    }

    /// Casts a ray against the proxies in the tree.
    ///
    /// The callback receives the (possibly shortened) input and the proxy
    /// and returns the new max fraction: 0 terminates the cast, a negative
    /// value ignores the proxy, and a positive value clips the ray.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut callback: F)
    where
        F: FnMut(&RayCastInput, ProxyId) -> Real,
    {
        let p1 = input.p1;
        let p2 = input.p2;
        let Some((r, _)) = (p2 - p1).get_unit_vector() else {
            return;
        };

        // v is perpendicular to the segment.
        let v = r.rev_perpendicular();
        let abs_v = v.abs();

        // Separating axis for segment (Gino, p80).
        // |dot(v, p1 - c)| > dot(|v|, h)

        let mut max_fraction = input.max_fraction;

        // Build a bounding box for the segment.
        let mut segment_aabb = Aabb::from_points(p1, input.point_at(max_fraction));

        let mut stack = GrowableStack::new();
        stack.push(self.root);

        while let Some(index) = stack.pop() {
            if index == NULL_NODE {
                continue;
            }

            let node = &self.nodes[index];
            if !node.aabb.overlaps(&segment_aabb) {
                continue;
            }

            let c = node.aabb.center();
            let h = node.aabb.extents() * 0.5;
            let separation = v.dot(&(p1 - c)).abs() - abs_v.dot(&h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput::new(p1, p2, max_fraction);
                let value = callback(&sub_input, index);

                if value == 0.0 {
                    // The client has terminated the ray cast.
                    return;
                }

                if value > 0.0 {
                    // Update segment bounding box.
                    max_fraction = value;
                    segment_aabb = Aabb::from_points(p1, input.point_at(max_fraction));
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Height of the tree; 0 when empty or a single leaf
    pub fn get_height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root].height
        }
    }

    /// Maximum height difference between the two children of any node
    pub fn get_max_balance(&self) -> i32 {
        self.nodes
            .iter()
            .filter(|n| n.height > 1)
            .map(|n| (self.nodes[n.child2].height - self.nodes[n.child1].height).abs())
            .max()
            .unwrap_or(0)
    }

    /// Ratio of the sum of all node perimeters to the root perimeter
    pub fn get_area_ratio(&self) -> Real {
        if self.root == NULL_NODE {
            return 0.0;
        }
        let root_area = self.nodes[self.root].aabb.perimeter();
        if root_area <= 0.0 {
            return 0.0;
        }
        let total_area: Real = self
            .nodes
            .iter()
            .filter(|n| n.height >= 0)
            .map(|n| n.aabb.perimeter())
            .sum();
        total_area / root_area
    }

    /// Shifts every stored AABB so that `new_origin` becomes the origin
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        for node in self.nodes.iter_mut().filter(|n| n.height >= 0) {
            node.aabb = node.aabb.moved(-new_origin);
        }
    }

    /// Checks the tree's structure and metrics: parent links, heights,
    /// branch AABBs and the free list
    pub fn validate(&self) -> bool {
        if !self.validate_node(self.root) {
            return false;
        }
        if self.root != NULL_NODE && self.nodes[self.root].parent != NULL_NODE {
            return false;
        }

        let mut free_count = 0;
        let mut index = self.free_list;
        while index != NULL_NODE {
            if index >= self.nodes.len() || self.nodes[index].height != -1 {
                return false;
            }
            index = self.nodes[index].parent;
            free_count += 1;
        }

        let leaves = self.nodes.iter().filter(|n| n.height == 0).count();
        leaves == self.leaf_count && self.node_count() + free_count == self.nodes.len()
    }

    fn validate_node(&self, index: usize) -> bool {
        if index == NULL_NODE {
            return true;
        }
        let node = &self.nodes[index];
        if node.is_leaf() {
            return node.child2 == NULL_NODE && node.height == 0 && node.data.is_some();
        }

        let (c1, c2) = (node.child1, node.child2);
        if c1 >= self.nodes.len() || c2 >= self.nodes.len() {
            return false;
        }
        let child1 = &self.nodes[c1];
        let child2 = &self.nodes[c2];
        if child1.parent != index || child2.parent != index {
            return false;
        }
        if node.height != 1 + child1.height.max(child2.height) {
            return false;
        }
        let aabb = child1.aabb.union(&child2.aabb);
        if aabb.min != node.aabb.min || aabb.max != node.aabb.max {
            return false;
        }
        self.validate_node(c1) && self.validate_node(c2)
    }

    fn allocate_node(&mut self) -> usize {
        let node = TreeNode {
            aabb: Aabb::empty(),
            data: None,
            parent: NULL_NODE,
            child1: NULL_NODE,
            child2: NULL_NODE,
            height: 0,
        };
        if self.free_list == NULL_NODE {
            self.nodes.push(node);
            return self.nodes.len() - 1;
        }
        let id = self.free_list;
        self.free_list = self.nodes[id].parent;
        self.nodes[id] = node;
        id
    }

    fn free_node(&mut self, id: usize) {
        let node = &mut self.nodes[id];
        node.parent = self.free_list;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = -1;
        node.data = None;
        self.free_list = id;
    }

    fn insert_leaf(&mut self, leaf: usize) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf].parent = NULL_NODE;
            return;
        }

        // Find the best sibling for this node.
        let leaf_aabb = self.nodes[leaf].aabb;
        let mut index = self.root;
        while !self.nodes[index].is_leaf() {
            let node = &self.nodes[index];
            let child1 = node.child1;
            let child2 = node.child2;

            let area = node.aabb.perimeter();
            let combined_area = node.aabb.union(&leaf_aabb).perimeter();

            // Cost of creating a new parent for this node and the new leaf.
            let cost = 2.0 * combined_area;

            // Minimum cost of pushing the leaf further down the tree.
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = self.descend_cost(child1, &leaf_aabb) + inheritance_cost;
            let cost2 = self.descend_cost(child2, &leaf_aabb) + inheritance_cost;

            // Descend according to the minimum cost.
            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        // Create a new parent.
        let old_parent = self.nodes[sibling].parent;
        let new_parent = self.allocate_node();
        {
            let sibling_aabb = self.nodes[sibling].aabb;
            let sibling_height = self.nodes[sibling].height;
            let node = &mut self.nodes[new_parent];
            node.parent = old_parent;
            node.aabb = leaf_aabb.union(&sibling_aabb);
            node.height = sibling_height + 1;
            node.child1 = sibling;
            node.child2 = leaf;
        }
        self.nodes[sibling].parent = new_parent;
        self.nodes[leaf].parent = new_parent;

        if old_parent == NULL_NODE {
            // The sibling was the root.
            self.root = new_parent;
        } else if self.nodes[old_parent].child1 == sibling {
            self.nodes[old_parent].child1 = new_parent;
        } else {
            self.nodes[old_parent].child2 = new_parent;
        }

        // Walk back up the tree fixing heights and AABBs.
        self.refit_from(self.nodes[leaf].parent);
    }

    fn descend_cost(&self, child: usize, leaf_aabb: &Aabb) -> Real {
        let node = &self.nodes[child];
        let combined = leaf_aabb.union(&node.aabb).perimeter();
        if node.is_leaf() {
            combined
        } else {
            combined - node.aabb.perimeter()
        }
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf].parent;
        let grand_parent = self.nodes[parent].parent;
        let sibling = if self.nodes[parent].child1 == leaf {
            self.nodes[parent].child2
        } else {
            self.nodes[parent].child1
        };

        if grand_parent == NULL_NODE {
            self.root = sibling;
            self.nodes[sibling].parent = NULL_NODE;
            self.free_node(parent);
            return;
        }

        // Destroy parent and connect sibling to grand parent.
        if self.nodes[grand_parent].child1 == parent {
            self.nodes[grand_parent].child1 = sibling;
        } else {
            self.nodes[grand_parent].child2 = sibling;
        }
        self.nodes[sibling].parent = grand_parent;
        self.free_node(parent);

        // Adjust ancestor bounds.
        self.refit_from(grand_parent);
    }

    fn refit_from(&mut self, start: usize) {
        let mut index = start;
        while index != NULL_NODE {
            index = self.balance(index);

            let child1 = self.nodes[index].child1;
            let child2 = self.nodes[index].child2;
            let height = 1 + self.nodes[child1].height.max(self.nodes[child2].height);
            let aabb = self.nodes[child1].aabb.union(&self.nodes[child2].aabb);

            let node = &mut self.nodes[index];
            node.height = height;
            node.aabb = aabb;
            index = node.parent;
        }
    }

    // Performs a left or right rotation if node A is imbalanced.
    // Returns the new root index.
    fn balance(&mut self, i_a: usize) -> usize {
        if self.nodes[i_a].is_leaf() || self.nodes[i_a].height < 2 {
            return i_a;
        }

        let i_b = self.nodes[i_a].child1;
        let i_c = self.nodes[i_a].child2;
        let balance = self.nodes[i_c].height - self.nodes[i_b].height;

        // Rotate C up
        if balance > 1 {
            let i_f = self.nodes[i_c].child1;
            let i_g = self.nodes[i_c].child2;

            // Swap A and C
            self.nodes[i_c].child1 = i_a;
            self.nodes[i_c].parent = self.nodes[i_a].parent;
            self.nodes[i_a].parent = i_c;
            self.replace_child(self.nodes[i_c].parent, i_a, i_c);

            // Rotate
            let (keep, moved) = if self.nodes[i_f].height > self.nodes[i_g].height {
                (i_f, i_g)
            } else {
                (i_g, i_f)
            };
            self.nodes[i_c].child2 = keep;
            self.nodes[i_a].child2 = moved;
            self.nodes[moved].parent = i_a;

            self.nodes[i_a].aabb = self.nodes[i_b].aabb.union(&self.nodes[moved].aabb);
            self.nodes[i_c].aabb = self.nodes[i_a].aabb.union(&self.nodes[keep].aabb);
            self.nodes[i_a].height = 1 + self.nodes[i_b].height.max(self.nodes[moved].height);
            self.nodes[i_c].height = 1 + self.nodes[i_a].height.max(self.nodes[keep].height);
            return i_c;
        }

        // Rotate B up
        if balance < -1 {
            let i_d = self.nodes[i_b].child1;
            let i_e = self.nodes[i_b].child2;

            // Swap A and B
            self.nodes[i_b].child1 = i_a;
            self.nodes[i_b].parent = self.nodes[i_a].parent;
            self.nodes[i_a].parent = i_b;
            self.replace_child(self.nodes[i_b].parent, i_a, i_b);

            // Rotate
            let (keep, moved) = if self.nodes[i_d].height > self.nodes[i_e].height {
                (i_d, i_e)
            } else {
                (i_e, i_d)
            };
            self.nodes[i_b].child2 = keep;
            self.nodes[i_a].child1 = moved;
            self.nodes[moved].parent = i_a;

            self.nodes[i_a].aabb = self.nodes[i_c].aabb.union(&self.nodes[moved].aabb);
            self.nodes[i_b].aabb = self.nodes[i_a].aabb.union(&self.nodes[keep].aabb);
            self.nodes[i_a].height = 1 + self.nodes[i_c].height.max(self.nodes[moved].height);
            self.nodes[i_b].height = 1 + self.nodes[i_a].height.max(self.nodes[keep].height);
            return i_b;
        }

        i_a
    }

    fn replace_child(&mut self, parent: usize, old_child: usize, new_child: usize) {
        if parent == NULL_NODE {
            self.root = new_child;
        } else if self.nodes[parent].child1 == old_child {
            self.nodes[parent].child1 = new_child;
        } else {
            debug_assert!(self.nodes[parent].child2 == old_child);
            self.nodes[parent].child2 = new_child;
        }
    }
}
