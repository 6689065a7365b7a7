use geo::MultiPolygon;

use crate::{error::{CrosswalkError, Result}, geom::Crs};

/// An attribute table with one polygon per row, exactly as read from a source.
/// Values are kept as trimmed text; `None` marks an empty or null cell.
#[derive(Debug, Clone)]
pub struct RawLayer {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    shapes: Vec<MultiPolygon<f64>>,
    crs: Option<Crs>,
}

impl RawLayer {
    pub fn new(name: impl Into<String>, columns: Vec<String>, crs: Option<Crs>) -> Self {
        Self { name: name.into(), columns, rows: Vec::new(), shapes: Vec::new(), crs }
    }

    /// Append one feature. The number of values must match the number of columns.
    pub fn push(&mut self, values: Vec<Option<String>>, shape: MultiPolygon<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(CrosswalkError::Config(format!(
                "[{}] feature has {} values for {} columns", self.name, values.len(), self.columns.len()
            )));
        }
        self.rows.push(values.into_iter().map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())).collect());
        self.shapes.push(shape);
        Ok(())
    }

    /// Convenience for building layers from string literals.
    pub fn push_str(&mut self, values: &[&str], shape: MultiPolygon<f64>) -> Result<()> {
        self.push(values.iter().map(|v| Some(v.to_string())).collect(), shape)
    }

    /// Replace the coordinate reference system.
    pub fn with_crs(mut self, crs: Option<Crs>) -> Self {
        self.crs = crs;
        self
    }

    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn columns(&self) -> &[String] { &self.columns }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the value at (`row`, `col`), if any.
    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Find the column matching the earliest alias in `aliases`, case-insensitively.
    pub fn find_column(&self, aliases: &[String]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            self.columns.iter().position(|column| column.eq_ignore_ascii_case(alias.trim()))
        })
    }

    /// Split into shapes and the remaining parts.
    pub(crate) fn into_parts(self) -> (String, Vec<Vec<Option<String>>>, Vec<MultiPolygon<f64>>, Option<Crs>) {
        (self.name, self.rows, self.shapes, self.crs)
    }
}

#[cfg(test)]
mod tests {
    use geo::MultiPolygon;

    use super::*;

    fn layer() -> RawLayer {
        RawLayer::new("fine", vec!["maz_id".into(), "TAZ1454".into(), "TAZ".into()], None)
    }

    #[test]
    fn earliest_alias_wins() {
        let aliases = vec!["TAZ".to_string(), "TAZ1454".to_string()];
        assert_eq!(layer().find_column(&aliases), Some(2));
    }

    #[test]
    fn alias_match_ignores_case() {
        assert_eq!(layer().find_column(&["MAZ_ID".to_string()]), Some(0));
        assert_eq!(layer().find_column(&["PUMA".to_string()]), None);
    }

    #[test]
    fn values_are_trimmed_and_blank_is_none() {
        let mut raw = layer();
        raw.push(vec![Some(" 12 ".into()), Some("".into()), None], MultiPolygon(vec![])).unwrap();
        assert_eq!(raw.value(0, 0), Some("12"));
        assert_eq!(raw.value(0, 1), None);
        assert_eq!(raw.value(0, 2), None);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(layer().push_str(&["1"], MultiPolygon(vec![])).is_err());
    }
}
