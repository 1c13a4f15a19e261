//! Triangle strip encoding
//!
//! In a strip, triangle `k` is `(s[k], s[k+1], s[k+2])` for even `k` and
//! `(s[k+1], s[k], s[k+2])` for odd `k`, which keeps every triangle's winding.
//! Triangles with a repeated index are degenerate and rasterize to nothing;
//! they are used to bridge separate runs inside one strip.

use std::collections::HashMap;

/// Re-encode a triangle list as a single triangle strip
///
/// Runs are grown greedily across shared edges with matching orientation and
/// joined by degenerate bridges. Returns `None` for input that is not a
/// whole number of triangles, is empty, or contains degenerate triangles
/// (a strip cannot carry those without dropping them).
pub fn triangles_to_strip(indices: &[u32]) -> Option<Vec<u32>> {
    if indices.is_empty() || indices.len() % 3 != 0 {
        return None;
    }

    let triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect();
    if triangles.iter().any(is_degenerate) {
        return None;
    }

    // Directed edge -> triangles containing it in that direction
    let mut edges: HashMap<(u32, u32), Vec<usize>> = HashMap::with_capacity(indices.len());
    for (t, triangle) in triangles.iter().enumerate() {
        for k in 0..3 {
            edges
                .entry((triangle[k], triangle[(k + 1) % 3]))
                .or_default()
                .push(t);
        }
    }

    let mut used = vec![false; triangles.len()];
    let next_unused = |used: &[bool], edge: (u32, u32)| -> Option<usize> {
        edges.get(&edge)?.iter().copied().find(|&t| !used[t])
    };

    let mut strip: Vec<u32> = Vec::with_capacity(indices.len());
    for seed in 0..triangles.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;

        // Start on the rotation whose exit edge has a neighbour, if any
        let [a, b, c] = triangles[seed];
        let rotations = [[a, b, c], [b, c, a], [c, a, b]];
        let start = rotations
            .iter()
            .copied()
            .find(|[_, q, r]| next_unused(&used, (*r, *q)).is_some())
            .unwrap_or(rotations[0]);

        let mut run = start.to_vec();
        loop {
            let k = run.len() - 2;
            let p = run[run.len() - 2];
            let q = run[run.len() - 1];
            let edge = if k % 2 == 0 { (p, q) } else { (q, p) };
            let Some(t) = next_unused(&used, edge) else {
                break;
            };
            used[t] = true;
            run.push(opposite_vertex(&triangles[t], edge));
        }

        append_run(&mut strip, &run);
    }

    Some(strip)
}

/// Decode a triangle strip, dropping degenerate triangles
pub fn strip_to_triangles(strip: &[u32]) -> Vec<[u32; 3]> {
    strip
        .windows(3)
        .enumerate()
        .map(|(k, w)| if k % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
        .filter(|triangle| !is_degenerate(triangle))
        .collect()
}

/// Split a triangle list into triangles
pub fn list_to_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    indices
        .chunks_exact(3)
        .map(|chunk| [chunk[0], chunk[1], chunk[2]])
        .collect()
}

/// Rotate a triangle so its smallest index comes first, keeping winding
///
/// Two triangles cover the same face with the same orientation exactly when
/// their canonical forms are equal.
pub fn canonical_triangle(triangle: [u32; 3]) -> [u32; 3] {
    let [a, b, c] = triangle;
    if a <= b && a <= c {
        [a, b, c]
    } else if b <= a && b <= c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}

fn is_degenerate(triangle: &[u32; 3]) -> bool {
    triangle[0] == triangle[1] || triangle[1] == triangle[2] || triangle[0] == triangle[2]
}

fn opposite_vertex(triangle: &[u32; 3], edge: (u32, u32)) -> u32 {
    (0..3)
        .find(|&k| triangle[k] == edge.0 && triangle[(k + 1) % 3] == edge.1)
        .map_or(triangle[0], |k| triangle[(k + 2) % 3])
}

fn append_run(strip: &mut Vec<u32>, run: &[u32]) {
    let Some(&last) = strip.last() else {
        strip.extend_from_slice(run);
        return;
    };

    // The run's first triangle must land on an even position to keep its winding
    if strip.len() % 2 == 1 {
        strip.push(last);
    }
    strip.push(last);
    strip.push(run[0]);
    strip.extend_from_slice(run);
}
