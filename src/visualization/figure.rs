use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::categories::CategoryTable;
use crate::error::{PipelineError, Result};

/// Per-point labels used to color a scatter plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointLabels {
    /// Cluster ids from k-means.
    Clusters(Vec<usize>),
    /// Free-text categories, e.g. from [`CategoryTable::categorize_all`].
    Categories(Vec<String>),
}

impl PointLabels {
    /// Number of labeled points.
    pub fn len(&self) -> usize {
        match self {
            PointLabels::Clusters(labels) => labels.len(),
            PointLabels::Categories(labels) => labels.len(),
        }
    }

    /// True when there are no labels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label of point `i` as shown in the legend.
    pub fn name_of(&self, i: usize) -> String {
        match self {
            PointLabels::Clusters(labels) => labels[i].to_string(),
            PointLabels::Categories(labels) => labels[i].clone(),
        }
    }

    /// Distinct legend names. Clusters come in ascending id order,
    /// categories in order of first appearance.
    fn groups(&self) -> Vec<String> {
        match self {
            PointLabels::Clusters(labels) => {
                let mut ids = labels.clone();
                ids.sort_unstable();
                ids.dedup();
                ids.into_iter().map(|id| id.to_string()).collect()
            }
            PointLabels::Categories(labels) => {
                let mut seen: Vec<String> = Vec::new();
                for label in labels {
                    if !seen.contains(label) {
                        seen.push(label.clone());
                    }
                }
                seen
            }
        }
    }
}

impl From<Vec<usize>> for PointLabels {
    fn from(labels: Vec<usize>) -> Self {
        PointLabels::Clusters(labels)
    }
}

impl From<Vec<String>> for PointLabels {
    fn from(labels: Vec<String>) -> Self {
        PointLabels::Categories(labels)
    }
}

/// Points sharing one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterTrace {
    /// Legend entry.
    pub name: String,
    /// Marker color; the renderer picks one when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Row index of each point in the projection.
    pub indices: Vec<usize>,
    /// First coordinate of each point.
    pub x: Vec<f64>,
    /// Second coordinate of each point.
    pub y: Vec<f64>,
    /// Hover text of each point, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hover: Vec<String>,
}

/// Renderer-independent description of a labeled 2D scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterFigure {
    /// Plot title.
    pub title: String,
    /// Horizontal axis title.
    pub x_label: String,
    /// Vertical axis title.
    pub y_label: String,
    /// One trace per distinct label.
    pub traces: Vec<ScatterTrace>,
}

impl ScatterFigure {
    /// Groups the rows of an `N x 2` projection into one trace per label.
    pub fn new(title: impl Into<String>, projection: &Array2<f64>, labels: &PointLabels) -> Result<Self> {
        if projection.ncols() != 2 {
            return Err(PipelineError::InvalidArgument(format!(
                "scatter plots need 2 columns, got {}",
                projection.ncols()
            )));
        }
        if labels.len() != projection.nrows() {
            return Err(PipelineError::InvalidArgument(format!(
                "{} labels for {} points",
                labels.len(),
                projection.nrows()
            )));
        }

        let mut traces: Vec<ScatterTrace> = labels
            .groups()
            .into_iter()
            .map(|name| ScatterTrace {
                name,
                color: None,
                indices: Vec::new(),
                x: Vec::new(),
                y: Vec::new(),
                hover: Vec::new(),
            })
            .collect();

        for i in 0..projection.nrows() {
            let name = labels.name_of(i);
            if let Some(trace) = traces.iter_mut().find(|t| t.name == name) {
                trace.indices.push(i);
                trace.x.push(projection[[i, 0]]);
                trace.y.push(projection[[i, 1]]);
            }
        }

        Ok(Self {
            title: title.into(),
            x_label: "Component 1".to_string(),
            y_label: "Component 2".to_string(),
            traces,
        })
    }

    /// Colors each trace whose name is a category of `table`.
    pub fn with_palette(mut self, table: &CategoryTable) -> Self {
        for trace in &mut self.traces {
            if let Some(color) = table.color_of(&trace.name) {
                trace.color = Some(color.to_string());
            }
        }
        self
    }

    /// Attaches hover text, one entry per projected point (e.g. the titles).
    pub fn with_hover_text<S: AsRef<str>>(mut self, texts: &[S]) -> Result<Self> {
        if texts.len() != self.point_count() {
            return Err(PipelineError::InvalidArgument(format!(
                "{} hover texts for {} points",
                texts.len(),
                self.point_count()
            )));
        }
        for trace in &mut self.traces {
            trace.hover = trace
                .indices
                .iter()
                .map(|&i| texts[i].as_ref().to_string())
                .collect();
        }
        Ok(self)
    }

    /// Total number of points across traces.
    pub fn point_count(&self) -> usize {
        self.traces.iter().map(|t| t.indices.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn one_trace_per_cluster_in_id_order() {
        let projection = array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0], [6.0, 7.0]];
        let figure =
            ScatterFigure::new("t", &projection, &PointLabels::Clusters(vec![2, 0, 2, 1])).unwrap();

        let names: Vec<&str> = figure.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["0", "1", "2"]);
        assert_eq!(figure.traces[2].indices, vec![0, 2]);
        assert_eq!(figure.traces[2].x, vec![0.0, 4.0]);
        assert_eq!(figure.traces[2].y, vec![1.0, 5.0]);
        assert_eq!(figure.point_count(), 4);
    }

    #[test]
    fn categories_keep_first_appearance_order_and_palette() {
        let table = CategoryTable::program_cycles();
        let titles = ["Maîtrise en génie", "Baccalauréat en génie", "Cours libre"];
        let labels = PointLabels::Categories(table.categorize_all(&titles));
        let projection = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];

        let figure = ScatterFigure::new("t", &projection, &labels)
            .unwrap()
            .with_palette(&table)
            .with_hover_text(&titles)
            .unwrap();

        let names: Vec<&str> = figure.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Maîtrise", "Baccalauréat", "Other"]);
        assert_eq!(figure.traces[0].color.as_deref(), Some("#2ca02c"));
        assert_eq!(figure.traces[2].hover, vec!["Cours libre"]);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let projection = array![[0.0, 0.0], [1.0, 1.0]];
        assert!(ScatterFigure::new("t", &projection, &PointLabels::Clusters(vec![0])).is_err());

        let figure = ScatterFigure::new("t", &projection, &PointLabels::Clusters(vec![0, 1])).unwrap();
        assert!(figure.with_hover_text(&["only one"]).is_err());
    }
}
