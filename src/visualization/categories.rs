use serde::{Deserialize, Serialize};

/// Category assigned when no keyword matches.
pub const OTHER: &str = "Other";

const OTHER_COLOR: &str = "#7f7f7f";

/// One keyword → category mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Lowercase substring searched for in the title.
    pub keyword: String,
    /// Category assigned on a match.
    pub category: String,
    /// CSS color used for the category in figures.
    pub color: String,
}

/// Ordered keyword → category table. The first rule whose keyword occurs in
/// the lowercased title wins, so rule order sets precedence.
///
/// ```rust
/// use embedding_explorer::visualization::CategoryTable;
///
/// let table = CategoryTable::program_cycles();
/// assert_eq!(table.categorize("Baccalauréat en génie logiciel"), "Baccalauréat");
/// assert_eq!(table.categorize("Cours d'été"), "Other");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    /// Table with no rules; everything is [`OTHER`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule. It only applies to titles no earlier rule matched.
    pub fn with_rule(
        mut self,
        keyword: impl AsRef<str>,
        category: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        self.rules.push(CategoryRule {
            keyword: keyword.as_ref().to_lowercase(),
            category: category.into(),
            color: color.into(),
        });
        self
    }

    /// Degree level of a program title.
    ///
    /// Short programs and microprograms are listed before the degrees their
    /// titles often mention.
    pub fn program_cycles() -> Self {
        Self::new()
            .with_rule("programme court", "Programme court", "#e377c2")
            .with_rule("microprogramme", "Microprogramme", "#bcbd22")
            .with_rule("certificat", "Certificat", "#17becf")
            .with_rule("dess", "DESS", "#8c564b")
            .with_rule("diplôme d'études supérieures spécialisées", "DESS", "#8c564b")
            .with_rule("doctorat", "Doctorat", "#d62728")
            .with_rule("maîtrise", "Maîtrise", "#2ca02c")
            .with_rule("baccalauréat", "Baccalauréat", "#1f77b4")
            .with_rule("cheminement", "Cheminement", "#ff7f0e")
    }

    /// Engineering field of a program title.
    pub fn engineering_fields() -> Self {
        Self::new()
            .with_rule("logiciel", "Génie logiciel", "#1f77b4")
            .with_rule("technologies de l'information", "Génie des TI", "#ff7f0e")
            .with_rule("électrique", "Génie électrique", "#2ca02c")
            .with_rule("mécanique", "Génie mécanique", "#d62728")
            .with_rule("construction", "Génie de la construction", "#9467bd")
            .with_rule("production automatisée", "Génie de la production automatisée", "#8c564b")
            .with_rule("aérospatial", "Génie aérospatial", "#e377c2")
            .with_rule("environnement", "Génie de l'environnement", "#bcbd22")
            .with_rule("logistique", "Génie des opérations et de la logistique", "#17becf")
            .with_rule("santé", "Génie de la santé", "#aec7e8")
    }

    /// Category of `title`, or [`OTHER`].
    pub fn categorize(&self, title: &str) -> &str {
        let title = title.to_lowercase();
        self.rules
            .iter()
            .find(|rule| title.contains(&rule.keyword))
            .map_or(OTHER, |rule| rule.category.as_str())
    }

    /// Categories of `titles`, in order.
    pub fn categorize_all<S: AsRef<str>>(&self, titles: &[S]) -> Vec<String> {
        titles
            .iter()
            .map(|t| self.categorize(t.as_ref()).to_string())
            .collect()
    }

    /// Color of `category`, from its first rule. [`OTHER`] is gray.
    pub fn color_of(&self, category: &str) -> Option<&str> {
        if category == OTHER {
            return Some(OTHER_COLOR);
        }
        self.rules
            .iter()
            .find(|rule| rule.category == category)
            .map(|rule| rule.color.as_str())
    }

    /// Rules in precedence order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }
}
