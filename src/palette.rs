// Legend colors for series and pie slices

/// Tableau 10
pub const TABLEAU10: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f",
    "#edc948", "#b07aa1", "#ff9da7", "#9c755f", "#bab0ac",
];

#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    pub fn new(colors: &[&str]) -> Self {
        Self {
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn tableau10() -> Self {
        Self::new(TABLEAU10)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for the n-th series; the palette repeats once exhausted.
    pub fn color_for(&self, index: usize) -> &str {
        if self.colors.is_empty() {
            return "#000000";
        }
        &self.colors[index % self.colors.len()]
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::tableau10()
    }
}
