#![warn(unreachable_pub, missing_debug_implementations)]

//! Graphviz rendering of topology snapshots. The renderer consumes the
//! read-only [`Snapshot`] the controller produces; it never touches live
//! engine state.

use flowctl_core::Snapshot;

const FLOW_COLORS: [&str; 6] = [
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02",
];

/// Renders the available subgraph and the flow overlays as Graphviz DOT
/// text. Pen width scales with link utilization; critical flows draw
/// dashed, backups dotted.
///
/// An empty snapshot renders an empty graph. A flow path whose links are
/// not all present in the snapshot is skipped entirely rather than drawn
/// half-missing; paths can transiently reference links removed since the
/// flow was installed.
pub fn render_dot(snapshot: &Snapshot) -> String {
    let mut out = String::from("graph topology {\n");
    for node in &snapshot.nodes {
        out.push_str(&format!("    \"{node}\";\n"));
    }
    for link in &snapshot.links {
        let penwidth = 1.0 + f64::from(link.utilization) / 25.0;
        out.push_str(&format!(
            "    \"{}\" -- \"{}\" [label=\"w={} u={}\", penwidth={:.1}];\n",
            link.a, link.b, link.weight, link.utilization, penwidth
        ));
    }
    for flow in &snapshot.flows {
        let color = FLOW_COLORS[flow.id.inner() as usize % FLOW_COLORS.len()];
        let primary_style = if flow.critical { "dashed" } else { "solid" };
        let overlays = [(&flow.primary, primary_style), (&flow.backup, "dotted")];
        for (path, style) in overlays {
            let Some(path) = path else { continue };
            if !path.edges().all(|(u, v)| snapshot.has_link(u, v)) {
                continue;
            }
            for (u, v) in path.edges() {
                out.push_str(&format!(
                    "    \"{u}\" -- \"{v}\" [color=\"{color}\", style={style}, penwidth=3.0, label=\"f{}\"];\n",
                    flow.id
                ));
            }
        }
    }
    out.push_str("}\n");
    out
}
