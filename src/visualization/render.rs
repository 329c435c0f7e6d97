use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::figure::ScatterFigure;
use crate::error::Result;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Turns a [`ScatterFigure`] into a visual artifact.
pub trait ScatterRenderer {
    /// Renders `figure`.
    fn render(&self, figure: &ScatterFigure) -> Result<()>;
}

/// Writes a standalone HTML page that draws the figure with plotly.js.
#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    path: PathBuf,
}

impl HtmlRenderer {
    /// Renderer writing to `path`. Parent directories are created on render.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The HTML page for `figure`.
    pub fn to_html(figure: &ScatterFigure) -> Result<String> {
        // "</" inside the inline script would end it early.
        let data = serde_json::to_string(figure)?.replace("</", "<\\/");
        let title = escape_html(&figure.title);

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="figure" style="width:100%;height:90vh;"></div>
<script>
const figure = {data};
const traces = figure.traces.map((t) => ({{
  type: "scatter",
  mode: "markers",
  name: t.name,
  x: t.x,
  y: t.y,
  text: t.hover,
  marker: t.color ? {{ color: t.color }} : {{}},
}}));
Plotly.newPlot("figure", traces, {{
  title: {{ text: figure.title }},
  xaxis: {{ title: {{ text: figure.x_label }} }},
  yaxis: {{ title: {{ text: figure.y_label }} }},
  legend: {{ title: {{ text: "label" }} }},
}});
</script>
</body>
</html>
"#
        ))
    }
}

impl ScatterRenderer for HtmlRenderer {
    fn render(&self, figure: &ScatterFigure) -> Result<()> {
        write_file(&self.path, Self::to_html(figure)?.as_bytes())?;
        info!(path = %self.path.display(), "wrote HTML figure");
        Ok(())
    }
}

/// Writes the figure as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonRenderer {
    path: PathBuf,
}

impl JsonRenderer {
    /// Renderer writing to `path`. Parent directories are created on render.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ScatterRenderer for JsonRenderer {
    fn render(&self, figure: &ScatterFigure) -> Result<()> {
        write_file(&self.path, &serde_json::to_vec_pretty(figure)?)?;
        info!(path = %self.path.display(), "wrote figure JSON");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::PointLabels;
    use ndarray::array;

    fn figure(title: &str) -> ScatterFigure {
        let projection = array![[0.0, 1.0], [2.0, 3.0]];
        ScatterFigure::new(title, &projection, &PointLabels::Clusters(vec![0, 1])).unwrap()
    }

    #[test]
    fn html_embeds_figure_and_escapes_title() {
        let html = HtmlRenderer::to_html(&figure("a < b </script>")).unwrap();

        assert!(html.contains("<title>a &lt; b &lt;/script&gt;</title>"));
        assert!(html.contains(PLOTLY_CDN));
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains(r#""x":[0.0]"#));
    }

    #[test]
    fn renderers_create_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let html_path = dir.path().join("nested/out/figure.html");
        let json_path = dir.path().join("nested/out/figure.json");

        HtmlRenderer::new(&html_path).render(&figure("PCA")).unwrap();
        JsonRenderer::new(&json_path).render(&figure("PCA")).unwrap();

        assert!(html_path.exists());
        let back: ScatterFigure =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, figure("PCA"));
    }
}
