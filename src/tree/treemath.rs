//! Positional arithmetic over the left-balanced binary tree layout.
//!
//! Nodes live in a flat array; leaves occupy even indices and parents odd
//! indices. The tree is left balanced: the right subtree spans the largest
//! power of two strictly smaller than the leaf count. All functions here
//! are total: a leaf is its own left and right child and the root is its
//! own parent.

use super::index::{LeafCount, LeafIndex, NodeIndex};

pub(crate) fn log2(x: usize) -> usize {
    if x == 0 {
        return 0;
    }
    let mut k = 0;
    while (x >> k) > 0 {
        k += 1;
    }
    k - 1
}

/// The level of a node in the tree: the number of trailing one bits of its
/// index. Leaves are at level 0.
pub(crate) fn level(index: NodeIndex) -> usize {
    let x = index.as_usize();
    if (x & 0x01) == 0 {
        return 0;
    }
    let mut k = 0;
    while ((x >> k) & 0x01) == 1 {
        k += 1;
    }
    k
}

/// The number of array slots a tree with `n` leaves occupies.
pub(crate) fn node_width(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        2 * (n - 1) + 1
    }
}

/// The number of leaves an array of `w` slots holds.
pub(crate) fn leaf_width(w: usize) -> usize {
    (w + 1) / 2
}

pub(crate) fn root(size: LeafCount) -> NodeIndex {
    let w = node_width(size.as_usize());
    NodeIndex::from((1usize << log2(w)) - 1)
}

pub(crate) fn left(index: NodeIndex) -> NodeIndex {
    let x = index.as_usize();
    let k = level(index);
    if k == 0 {
        return index;
    }
    NodeIndex::from(x ^ (0x01 << (k - 1)))
}

pub(crate) fn right(index: NodeIndex, size: LeafCount) -> NodeIndex {
    let x = index.as_usize();
    let n = size.as_usize();
    let k = level(index);
    if k == 0 {
        return index;
    }
    // Start from the right child in the complete tree and walk down its
    // left edge until the index falls inside the actual width.
    let mut r = x ^ (0x03 << (k - 1));
    while r >= node_width(n) {
        r = left(NodeIndex::from(r)).as_usize();
    }
    NodeIndex::from(r)
}

// The immediate parent in the complete tree; it may be beyond the right
// edge of an incomplete one.
fn parent_step(x: usize) -> usize {
    let k = level(NodeIndex::from(x));
    let b = (x >> (k + 1)) & 0x01;
    (x | (1 << k)) ^ (b << (k + 1))
}

pub(crate) fn parent(index: NodeIndex, size: LeafCount) -> NodeIndex {
    let x = index.as_usize();
    let n = size.as_usize();
    if index == root(size) {
        return index;
    }
    let mut p = parent_step(x);
    while p >= node_width(n) {
        p = parent_step(p);
    }
    NodeIndex::from(p)
}

pub(crate) fn sibling(index: NodeIndex, size: LeafCount) -> NodeIndex {
    let p = parent(index, size);
    match index.cmp(&p) {
        std::cmp::Ordering::Less => right(p, size),
        std::cmp::Ordering::Greater => left(p),
        // The root is its own sibling.
        std::cmp::Ordering::Equal => p,
    }
}

/// The ancestors of a node, from its parent up to and including the root.
/// Empty when the node is the root.
pub(crate) fn direct_path(index: NodeIndex, size: LeafCount) -> Vec<NodeIndex> {
    let r = root(size);
    if index == r {
        return vec![];
    }

    let mut path = vec![];
    let mut x = index;
    while x != r {
        x = parent(x, size);
        path.push(x);
    }
    path
}

/// The sibling of each node on the way from `index` to the root, excluding
/// the root itself. Same length as the direct path.
pub(crate) fn copath(index: NodeIndex, size: LeafCount) -> Vec<NodeIndex> {
    let mut d = direct_path(index, size);
    if d.is_empty() {
        return vec![];
    }
    // Siblings of the node itself and of all ancestors below the root.
    d.pop();
    let mut nodes = vec![index];
    nodes.append(&mut d);
    nodes
        .into_iter()
        .map(|node_index| sibling(node_index, size))
        .collect()
}

/// The lowest common ancestor of two leaves.
pub(crate) fn ancestor(l: LeafIndex, r: LeafIndex) -> NodeIndex {
    if l == r {
        return NodeIndex::from(l);
    }

    let (mut ln, mut rn) = (
        NodeIndex::from(l).as_usize(),
        NodeIndex::from(r).as_usize(),
    );
    let mut k = 0;
    while ln != rn {
        ln >>= 1;
        rn >>= 1;
        k += 1;
    }
    NodeIndex::from((ln << k) + (1 << (k - 1)) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Precomputed answers for the tree on eleven leaves:
    //
    //                                               X
    //                       X
    //           X                       X                       X
    //     X           X           X           X           X
    //  X     X     X     X     X     X     X     X     X     X     X
    //  0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f 10 11 12 13 14

    const N: u32 = 0x0b;

    const A_ROOT: [u32; 11] = [
        0x00, 0x01, 0x03, 0x03, 0x07, 0x07, 0x07, 0x07, 0x0f, 0x0f, 0x0f,
    ];
    const A_LOG2: [usize; 21] = [
        0x00, 0x00, 0x01, 0x01, 0x02, 0x02, 0x02, 0x02, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03, 0x03,
        0x03, 0x04, 0x04, 0x04, 0x04, 0x04,
    ];
    const A_LEVEL: [usize; 21] = [
        0x00, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00, 0x03, 0x00, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00,
        0x04, 0x00, 0x01, 0x00, 0x02, 0x00,
    ];
    const A_LEFT: [u32; 21] = [
        0x00, 0x00, 0x02, 0x01, 0x04, 0x04, 0x06, 0x03, 0x08, 0x08, 0x0a, 0x09, 0x0c, 0x0c, 0x0e,
        0x07, 0x10, 0x10, 0x12, 0x11, 0x14,
    ];
    const A_RIGHT: [u32; 21] = [
        0x00, 0x02, 0x02, 0x05, 0x04, 0x06, 0x06, 0x0b, 0x08, 0x0a, 0x0a, 0x0d, 0x0c, 0x0e, 0x0e,
        0x13, 0x10, 0x12, 0x12, 0x14, 0x14,
    ];
    const A_PARENT: [u32; 21] = [
        0x01, 0x03, 0x01, 0x07, 0x05, 0x03, 0x05, 0x0f, 0x09, 0x0b, 0x09, 0x07, 0x0d, 0x0b, 0x0d,
        0x0f, 0x11, 0x13, 0x11, 0x0f, 0x13,
    ];
    const A_SIBLING: [u32; 21] = [
        0x02, 0x05, 0x00, 0x0b, 0x06, 0x01, 0x04, 0x13, 0x0a, 0x0d, 0x08, 0x03, 0x0e, 0x09, 0x0c,
        0x0f, 0x12, 0x14, 0x10, 0x07, 0x11,
    ];

    #[test]
    fn root_values() {
        for n in 1..=N {
            assert_eq!(
                root(LeafCount::from(n)),
                NodeIndex::from(A_ROOT[(n - 1) as usize])
            );
        }
    }

    #[test]
    fn node_relations() {
        let size = LeafCount::from(N);
        for x in 0..node_width(N as usize) {
            let index = NodeIndex::from(x);
            assert_eq!(log2(x), A_LOG2[x], "log2 @ {x:#04x}");
            assert_eq!(level(index), A_LEVEL[x], "level @ {x:#04x}");
            assert_eq!(left(index), NodeIndex::from(A_LEFT[x]), "left @ {x:#04x}");
            assert_eq!(
                right(index, size),
                NodeIndex::from(A_RIGHT[x]),
                "right @ {x:#04x}"
            );
            assert_eq!(
                parent(index, size),
                NodeIndex::from(A_PARENT[x]),
                "parent @ {x:#04x}"
            );
            assert_eq!(
                sibling(index, size),
                NodeIndex::from(A_SIBLING[x]),
                "sibling @ {x:#04x}"
            );
        }
    }

    #[test]
    fn paths_on_eleven_leaves() {
        let size = LeafCount::from(N);
        let a_dirpath: [&[u32]; 21] = [
            &[0x01, 0x03, 0x07, 0x0f],
            &[0x03, 0x07, 0x0f],
            &[0x01, 0x03, 0x07, 0x0f],
            &[0x07, 0x0f],
            &[0x05, 0x03, 0x07, 0x0f],
            &[0x03, 0x07, 0x0f],
            &[0x05, 0x03, 0x07, 0x0f],
            &[0x0f],
            &[0x09, 0x0b, 0x07, 0x0f],
            &[0x0b, 0x07, 0x0f],
            &[0x09, 0x0b, 0x07, 0x0f],
            &[0x07, 0x0f],
            &[0x0d, 0x0b, 0x07, 0x0f],
            &[0x0b, 0x07, 0x0f],
            &[0x0d, 0x0b, 0x07, 0x0f],
            &[],
            &[0x11, 0x13, 0x0f],
            &[0x13, 0x0f],
            &[0x11, 0x13, 0x0f],
            &[0x0f],
            &[0x13, 0x0f],
        ];
        let a_copath: [&[u32]; 21] = [
            &[0x02, 0x05, 0x0b, 0x13],
            &[0x05, 0x0b, 0x13],
            &[0x00, 0x05, 0x0b, 0x13],
            &[0x0b, 0x13],
            &[0x06, 0x01, 0x0b, 0x13],
            &[0x01, 0x0b, 0x13],
            &[0x04, 0x01, 0x0b, 0x13],
            &[0x13],
            &[0x0a, 0x0d, 0x03, 0x13],
            &[0x0d, 0x03, 0x13],
            &[0x08, 0x0d, 0x03, 0x13],
            &[0x03, 0x13],
            &[0x0e, 0x09, 0x03, 0x13],
            &[0x09, 0x03, 0x13],
            &[0x0c, 0x09, 0x03, 0x13],
            &[],
            &[0x12, 0x14, 0x07],
            &[0x14, 0x07],
            &[0x10, 0x14, 0x07],
            &[0x07],
            &[0x11, 0x07],
        ];

        for x in 0..node_width(N as usize) {
            let index = NodeIndex::from(x);
            let expected_dirpath: Vec<NodeIndex> =
                a_dirpath[x].iter().map(|&v| NodeIndex::from(v)).collect();
            let expected_copath: Vec<NodeIndex> =
                a_copath[x].iter().map(|&v| NodeIndex::from(v)).collect();
            assert_eq!(direct_path(index, size), expected_dirpath, "dirpath @ {x:#04x}");
            assert_eq!(copath(index, size), expected_copath, "copath @ {x:#04x}");
        }
    }

    #[test]
    fn ancestors_on_eleven_leaves() {
        let a_ancestor: [&[u32]; 10] = [
            &[0x01, 0x03, 0x03, 0x07, 0x07, 0x07, 0x07, 0x0f, 0x0f, 0x0f],
            &[0x03, 0x03, 0x07, 0x07, 0x07, 0x07, 0x0f, 0x0f, 0x0f],
            &[0x05, 0x07, 0x07, 0x07, 0x07, 0x0f, 0x0f, 0x0f],
            &[0x07, 0x07, 0x07, 0x07, 0x0f, 0x0f, 0x0f],
            &[0x09, 0x0b, 0x0b, 0x0f, 0x0f, 0x0f],
            &[0x0b, 0x0b, 0x0f, 0x0f, 0x0f],
            &[0x0d, 0x0f, 0x0f, 0x0f],
            &[0x0f, 0x0f, 0x0f],
            &[0x11, 0x13],
            &[0x13],
        ];

        for l in 0..(N - 1) {
            for r in (l + 1)..N {
                let answer = NodeIndex::from(a_ancestor[l as usize][(r - l - 1) as usize]);
                let lr = ancestor(LeafIndex::from(l), LeafIndex::from(r));
                let rl = ancestor(LeafIndex::from(r), LeafIndex::from(l));
                assert_eq!(lr, answer, "ancestor({l}, {r})");
                assert_eq!(rl, lr, "ancestor asymmetry at ({l}, {r})");
            }
        }
    }

    #[test]
    fn children_and_parents_are_inverse() {
        for n in 1usize..=32 {
            let size = LeafCount::from(n);
            for x in 0..node_width(n) {
                let index = NodeIndex::from(x);
                let k = level(index);
                if k == 0 {
                    assert_eq!(left(index), index);
                    assert_eq!(right(index, size), index);
                    continue;
                }
                let l = left(index);
                let r = right(index, size);
                assert_eq!(level(l), k - 1);
                assert!(level(r) < k);
                assert!(l.as_usize() < node_width(n));
                assert!(r.as_usize() < node_width(n));
                assert_eq!(parent(l, size), index);
                assert_eq!(parent(r, size), index);
            }
        }
    }

    #[test]
    fn sibling_is_an_involution() {
        for n in 1usize..=32 {
            let size = LeafCount::from(n);
            let r = root(size);
            for x in 0..node_width(n) {
                let index = NodeIndex::from(x);
                if index == r {
                    continue;
                }
                assert_eq!(sibling(sibling(index, size), size), index);
            }
        }
    }

    #[test]
    fn path_properties() {
        for n in 1usize..=32 {
            let size = LeafCount::from(n);
            let r = root(size);
            for x in 0..node_width(n) {
                let index = NodeIndex::from(x);
                let dp = direct_path(index, size);
                let cp = copath(index, size);

                // Right-edge nodes sit closer to the root than their level
                // suggests, so the path can only be shorter than the depth.
                assert!(dp.len() <= log2(node_width(n)) - level(index));
                assert_eq!(cp.len(), dp.len());
                if index != r {
                    assert_eq!(*dp.last().unwrap(), r);
                }

                // The direct path climbs strictly in level, and each copath
                // entry is the sibling of the corresponding step.
                let mut below = index;
                for (i, &p) in dp.iter().enumerate() {
                    assert!(level(p) > level(below));
                    assert_eq!(cp[i], sibling(below, size));
                    below = p;
                }
            }
        }
    }

    #[test]
    fn ancestor_is_the_lowest_shared_node() {
        for n in 2usize..=32 {
            let size = LeafCount::from(n);
            for l in 0..n {
                for r in 0..n {
                    if l == r {
                        continue;
                    }
                    let a = ancestor(LeafIndex::from(l), LeafIndex::from(r));
                    let dp_l = direct_path(NodeIndex::from(LeafIndex::from(l)), size);
                    let dp_r = direct_path(NodeIndex::from(LeafIndex::from(r)), size);
                    assert!(dp_l.contains(&a));
                    assert!(dp_r.contains(&a));
                    // The first shared node on the way up is the ancestor.
                    let first_shared = dp_l.iter().find(|x| dp_r.contains(*x)).unwrap();
                    assert_eq!(*first_shared, a);
                }
            }
        }
    }
}
