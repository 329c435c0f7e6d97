//! Labeled scatter plots of 2D projections.
//!
//! A [`ScatterFigure`] groups projected points into one trace per label and
//! is handed to a [`ScatterRenderer`]. Labels are either cluster ids or
//! categories derived from free-text titles with a [`CategoryTable`].
//!
//! ```rust,no_run
//! use embedding_explorer::projection::{Projector, ReductionMethod};
//! use embedding_explorer::visualization::{CategoryTable, HtmlRenderer, PointLabels, ScatterFigure, ScatterRenderer};
//! # use ndarray::Array2;
//!
//! # fn main() -> embedding_explorer::error::Result<()> {
//! # let embeddings = Array2::<f32>::zeros((3, 16));
//! let titles = ["Baccalauréat en génie logiciel", "Maîtrise en génie électrique", "Doctorat en génie"];
//! let table = CategoryTable::program_cycles();
//! let labels = PointLabels::Categories(table.categorize_all(&titles));
//!
//! let projection = Projector::with_method(ReductionMethod::Pca).project(&embeddings)?;
//! let figure = ScatterFigure::new("Programs by cycle", &projection, &labels)?
//!     .with_palette(&table)
//!     .with_hover_text(&titles)?;
//! HtmlRenderer::new("programs.html").render(&figure)?;
//! # Ok(())
//! # }
//! ```

mod categories;
mod figure;
mod render;

pub use categories::{CategoryRule, CategoryTable, OTHER};
pub use figure::{PointLabels, ScatterFigure, ScatterTrace};
pub use render::{HtmlRenderer, JsonRenderer, ScatterRenderer};
