use std::collections::HashMap;

use crate::ir::RoomGraph;

/// Union-find over room indices; exits are merged as undirected edges, so
/// components discovered out of order end up under one root.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn unite(&mut self, a: usize, b: usize) {
        let mut a = self.find(a);
        let mut b = self.find(b);
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

/// Partitions the graph into maximal connected components, ignoring exit
/// direction. Every room lands in exactly one component; components come out
/// in vnum order of their lowest member.
pub fn split_components(graph: &RoomGraph) -> Vec<Vec<u32>> {
    let vnums: Vec<u32> = graph.rooms.keys().copied().collect();
    let index: HashMap<u32, usize> = vnums.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut uf = UnionFind::new(vnums.len());
    for room in graph.rooms.values() {
        let from = index[&room.vnum];
        for exit in &room.exits {
            if let Some(&to) = index.get(&exit.to) {
                uf.unite(from, to);
            }
        }
    }

    let mut components: Vec<Vec<u32>> = Vec::new();
    let mut root_slot: HashMap<usize, usize> = HashMap::new();
    for (i, &vnum) in vnums.iter().enumerate() {
        let root = uf.find(i);
        let slot = *root_slot.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(vnum);
    }
    components
}
