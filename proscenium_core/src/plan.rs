// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the back-to-front draw list for one frame.

use kurbo::Rect;

use crate::node::{NodeId, NodeKind, SceneGraph, SurfaceId};

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order, matching the graph's
/// [`draw_order`](SceneGraph::draw_order).
#[derive(Clone, Debug, PartialEq)]
pub struct RenderItem {
    /// The node this item originates from.
    pub node: NodeId,
    /// What the node represents.
    pub kind: NodeKind,
    /// The surface to draw into, inherited from the nearest bound ancestor.
    pub surface: Option<SurfaceId>,
    /// Content rectangle in surface space.
    pub bounds: Rect,
    /// Effective opacity (0.0–1.0, accumulated from ancestors).
    pub opacity: f32,
}

/// An ordered list of draw commands spanning every surface.
///
/// Effectively invisible or fully transparent nodes are left out. A renderer
/// walks [`for_surface`](Self::for_surface) for each surface it owns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPlan {
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan from the graph's current draw order, re-sorting first
    /// if needed.
    pub fn build<B>(graph: &mut SceneGraph<B>) -> Self {
        let mut plan = Self::new();
        plan.rebuild(graph);
        plan
    }

    /// Rebuilds the plan in place, reusing its allocation.
    pub fn rebuild<B>(&mut self, graph: &mut SceneGraph<B>) {
        graph.draw_order();
        self.fill(graph, graph.cached_draw_order());
    }

    /// Builds the plan from an order previously obtained from
    /// [`SceneGraph::draw_order`]. Nodes removed since then are skipped.
    pub fn from_order<B>(graph: &SceneGraph<B>, order: &[NodeId]) -> Self {
        let mut plan = Self::new();
        plan.fill(graph, order);
        plan
    }

    fn fill<B>(&mut self, graph: &SceneGraph<B>, order: &[NodeId]) {
        self.items.clear();
        for &node in order {
            if !matches!(graph.effective_visibility(node), Ok(true)) {
                continue;
            }
            let opacity = graph.effective_opacity(node).unwrap_or(0.0);
            if opacity <= 0.0 {
                continue;
            }
            let idx = node.idx;
            self.items.push(RenderItem {
                node,
                kind: graph.kind[idx as usize],
                surface: graph.surface_at(idx),
                bounds: graph.world_bounds_at(idx),
                opacity,
            });
        }
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items destined for `surface`, back to front.
    pub fn for_surface(&self, surface: SurfaceId) -> impl Iterator<Item = &RenderItem> + '_ {
        self.items
            .iter()
            .filter(move |item| item.surface == Some(surface))
    }

    /// Distinct destination surfaces, in order of first appearance.
    #[must_use]
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        let mut out: Vec<SurfaceId> = Vec::new();
        for surface in self.items.iter().filter_map(|item| item.surface) {
            if !out.contains(&surface) {
                out.push(surface);
            }
        }
        out
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the plan draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size};

    use super::*;

    #[test]
    fn plan_follows_draw_order_and_drops_hidden() {
        let mut g: SceneGraph<()> = SceneGraph::new();
        let w = g.create_node(None, NodeKind::Window, None).unwrap();
        g.set_surface(w, Some(SurfaceId(0))).unwrap();
        let a = g.create_node(Some(w), NodeKind::Cast, None).unwrap();
        let b = g.create_node(Some(w), NodeKind::Text, None).unwrap();
        let c = g.create_node(Some(w), NodeKind::Picture, None).unwrap();
        g.set_visible(b, false).unwrap();
        g.set_opacity(c, 0.0).unwrap();

        let plan = RenderPlan::build(&mut g);
        let nodes: Vec<_> = plan.items.iter().map(|i| i.node).collect();
        assert_eq!(nodes, vec![w, a]);
        assert_eq!(plan.surfaces(), vec![SurfaceId(0)]);
    }

    #[test]
    fn items_carry_inherited_state() {
        let mut g: SceneGraph<()> = SceneGraph::new();
        let w = g.create_node(None, NodeKind::Window, None).unwrap();
        g.set_surface(w, Some(SurfaceId(1))).unwrap();
        g.set_position(w, Point::new(10.0, 10.0)).unwrap();
        g.set_opacity(w, 0.5).unwrap();
        let a = g.create_node(Some(w), NodeKind::Cast, None).unwrap();
        g.set_position(a, Point::new(2.0, 3.0)).unwrap();
        g.set_size(a, Size::new(4.0, 4.0)).unwrap();

        let plan = RenderPlan::build(&mut g);
        let item = plan
            .for_surface(SurfaceId(1))
            .find(|i| i.node == a)
            .unwrap();
        assert_eq!(item.bounds, Rect::new(12.0, 13.0, 16.0, 17.0));
        assert_eq!(item.opacity, 0.5);
        assert_eq!(item.kind, NodeKind::Cast);
        assert_eq!(plan.for_surface(SurfaceId(9)).count(), 0);
    }

    #[test]
    fn plan_groups_by_surface() {
        let mut g: SceneGraph<()> = SceneGraph::new();
        let w1 = g.create_node(None, NodeKind::Window, None).unwrap();
        let w2 = g.create_node(None, NodeKind::Window, None).unwrap();
        g.set_surface(w1, Some(SurfaceId(1))).unwrap();
        g.set_surface(w2, Some(SurfaceId(2))).unwrap();
        let a = g.create_node(Some(w2), NodeKind::Cast, None).unwrap();
        let b = g.create_node(Some(w1), NodeKind::Cast, None).unwrap();

        let plan = RenderPlan::build(&mut g);
        assert_eq!(RenderPlan::from_order(&g, g.cached_draw_order()), plan);
        let s1: Vec<_> = plan.for_surface(SurfaceId(1)).map(|i| i.node).collect();
        let s2: Vec<_> = plan.for_surface(SurfaceId(2)).map(|i| i.node).collect();
        assert_eq!(s1, vec![w1, b]);
        assert_eq!(s2, vec![w2, a]);
        assert_eq!(plan.surfaces(), vec![SurfaceId(1), SurfaceId(2)]);
    }
}
