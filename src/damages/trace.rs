//! Derivation trace attached to every computed amount

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Enough detail to reconstruct one amount by hand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    /// Formula identifier, e.g. `income * loss_ratio * leibniz(years, rate)`
    pub formula: String,
    /// Named input values in evaluation order
    pub inputs: Vec<(String, String)>,
    /// Version of the table file consulted, if any
    pub table_version: Option<String>,
    pub notes: Vec<String>,
}

impl Trace {
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            ..Default::default()
        }
    }

    pub fn input(mut self, name: &str, value: impl Display) -> Self {
        self.inputs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn table(mut self, version: &str) -> Self {
        self.table_version = Some(version.to_string());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Single-line form used in CSV output
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula)?;
        if !self.inputs.is_empty() {
            let inputs: Vec<String> = self.inputs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            write!(f, " [{}]", inputs.join(", "))?;
        }
        if let Some(version) = &self.table_version {
            write!(f, " table={}", version)?;
        }
        for note in &self.notes {
            write!(f, "; {}", note)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let trace = Trace::new("a * b")
            .input("a", 2)
            .input("b", "3.5")
            .table("x.csv@abc")
            .note("clamped");
        assert_eq!(trace.render(), "a * b [a=2, b=3.5] table=x.csv@abc; clamped");
        assert_eq!(Trace::new("zero").render(), "zero");
    }
}
