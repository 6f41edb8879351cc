//! Minimal Gherkin reader.
//!
//! Supports `Feature:`, `Background:`, `Scenario:`, the step keywords
//! (`Given`/`When`/`Then`/`And`/`But`/`*`), `|`-delimited data tables,
//! `@tags` and `#` comments. Anything else is a syntax error.

use std::path::Path;

use crate::Result;
use crate::ScenarioError;
use crate::SeedRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Given,
    When,
    Then,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    line: usize,
}

impl Table {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Values of `column` for every body row
    pub fn column(
        &self,
        column: &str,
    ) -> std::result::Result<Vec<&str>, ScenarioError> {
        let index = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| ScenarioError::MissingColumn {
                line: self.line,
                column: column.to_string(),
            })?;
        Ok(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Read a `| node | seeds |` table
    pub fn seed_rows(&self) -> std::result::Result<Vec<SeedRow>, ScenarioError> {
        let nodes = self.column("node")?;
        let seeds = self.column("seeds")?;
        Ok(nodes
            .into_iter()
            .zip(seeds)
            .map(|(node, seeds)| SeedRow::new(node, seeds))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepLine {
    pub keyword: Keyword,
    pub text: String,
    pub table: Option<Table>,
    /// 1-based line in the feature source
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub line: usize,
    pub steps: Vec<StepLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub background: Vec<StepLine>,
    pub scenarios: Vec<Scenario>,
}

enum Section {
    Preamble,
    Background,
    Scenario,
}

impl Feature {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source)?)
    }

    pub fn parse(source: &str) -> std::result::Result<Self, ScenarioError> {
        let mut feature = Feature::default();
        let mut seen_feature = false;
        let mut section = Section::Preamble;
        let mut last_keyword: Option<Keyword> = None;

        for (index, raw) in source.lines().enumerate() {
            let line = index + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') || text.starts_with('@') {
                continue;
            }

            if let Some(name) = text.strip_prefix("Feature:") {
                if seen_feature {
                    return Err(syntax(line, "only one Feature per file"));
                }
                seen_feature = true;
                feature.name = name.trim().to_string();
                continue;
            }
            if !seen_feature {
                return Err(syntax(line, "expected \"Feature:\""));
            }

            if text.strip_prefix("Background:").is_some() {
                if !feature.scenarios.is_empty() || !feature.background.is_empty() {
                    return Err(syntax(line, "Background must precede every Scenario"));
                }
                section = Section::Background;
                last_keyword = None;
                continue;
            }
            if let Some(name) = text.strip_prefix("Scenario:") {
                feature.scenarios.push(Scenario {
                    name: name.trim().to_string(),
                    line,
                    steps: Vec::new(),
                });
                section = Section::Scenario;
                last_keyword = None;
                continue;
            }

            let steps = match section {
                Section::Preamble => {
                    // free-form feature description
                    continue;
                }
                Section::Background => &mut feature.background,
                Section::Scenario => match feature.scenarios.last_mut() {
                    Some(scenario) => &mut scenario.steps,
                    None => return Err(syntax(line, "step outside of a Scenario")),
                },
            };

            if text.starts_with('|') {
                let step = steps
                    .last_mut()
                    .ok_or_else(|| syntax(line, "data table without a step"))?;
                push_table_row(step, text, line)?;
                continue;
            }

            let (keyword, step_text) = split_keyword(text, last_keyword)
                .ok_or_else(|| syntax(line, &format!("unrecognised line \"{text}\"")))?;
            last_keyword = Some(keyword);
            steps.push(StepLine {
                keyword,
                text: step_text.to_string(),
                table: None,
                line,
            });
        }

        if !seen_feature {
            return Err(syntax(1, "expected \"Feature:\""));
        }
        Ok(feature)
    }

    /// Background steps followed by the scenario's own steps
    pub fn steps_of<'a>(
        &'a self,
        scenario: &'a Scenario,
    ) -> impl Iterator<Item = &'a StepLine> {
        self.background.iter().chain(scenario.steps.iter())
    }
}

fn syntax(
    line: usize,
    message: &str,
) -> ScenarioError {
    ScenarioError::Syntax {
        line,
        message: message.to_string(),
    }
}

fn split_keyword(
    text: &str,
    previous: Option<Keyword>,
) -> Option<(Keyword, &str)> {
    let (word, rest) = text.split_once(char::is_whitespace)?;
    let keyword = match word {
        "Given" => Keyword::Given,
        "When" => Keyword::When,
        "Then" => Keyword::Then,
        "And" | "But" | "*" => previous.unwrap_or(Keyword::Given),
        _ => return None,
    };
    Some((keyword, rest.trim()))
}

fn push_table_row(
    step: &mut StepLine,
    text: &str,
    line: usize,
) -> std::result::Result<(), ScenarioError> {
    let inner = text
        .strip_prefix('|')
        .and_then(|t| t.strip_suffix('|'))
        .ok_or_else(|| syntax(line, "table row must end with '|'"))?;
    let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();

    match &mut step.table {
        None => {
            step.table = Some(Table {
                headers: cells,
                rows: Vec::new(),
                line,
            });
        }
        Some(table) => {
            if cells.len() != table.headers.len() {
                return Err(syntax(
                    line,
                    &format!(
                        "table row has {} cells, header has {}",
                        cells.len(),
                        table.headers.len()
                    ),
                ));
            }
            table.rows.push(cells);
        }
    }
    Ok(())
}
