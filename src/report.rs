//! Plain-text summary of a generated grid

use minijinja::{context, Environment};

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::geometry::Axis;
use crate::grid::Grid;

const REPORT_TEMPLATE: &str = r#"Grid report
Generated: {{ timestamp }}
Total cells: {{ total_cells }}

axis    cells          min            max         span                 max ratio
{% for a in axes -%}
{{ a.name }}  {{ a.cells }}  {{ a.min_step }}  {{ a.max_step }}  {{ a.span }}  {{ a.ratio }}
{% endfor %}
{%- if warnings %}
Warnings ({{ warnings|length }}):
{% for w in warnings -%}
  [{{ w.axis }}] {{ w.message }}
{% endfor %}
{%- else %}
No warnings.
{% endif -%}
"#;

/// Render a per-axis summary: cell count, step extrema, extent, largest
/// neighbour ratio, followed by the collected warnings.
pub fn render_grid_report(grid: &Grid, diagnostics: &Diagnostics) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("report", REPORT_TEMPLATE)?;
    let template = env.get_template("report")?;

    let axes: Vec<_> = Axis::ALL
        .iter()
        .map(|&axis| {
            let coords = grid.axis(axis);
            serde_json::json!({
                "name": format!("{:<5}", axis.name()),
                "cells": format!("{:>6}", coords.num_cells()),
                "min_step": format!("{:>12.4e}", coords.min_step()),
                "max_step": format!("{:>12.4e}", coords.max_step()),
                "span": format!("[{:.4}, {:.4}]", coords.first(), coords.last()),
                "ratio": format!("{:.3}", coords.max_step_ratio()),
            })
        })
        .collect();

    let warnings: Vec<_> = diagnostics
        .warnings()
        .iter()
        .map(|w| {
            serde_json::json!({
                "axis": w.axis.map_or("-", Axis::name),
                "message": w.message,
            })
        })
        .collect();

    let total_cells: usize = grid.num_cells().iter().product();

    let output = template.render(context! {
        timestamp => chrono::Utc::now().to_rfc3339(),
        total_cells => total_cells,
        axes => axes,
        warnings => warnings,
    })?;

    Ok(output)
}
